//! End-to-end solve loop: basis search, model construction and value
//! iteration up to a horizon or until convergence.

use log::{debug, info};
use ndarray::Array1;

use crate::config::{ConvergenceMetric, Representation, SolverConfig};
use crate::error::{Result, RpsrError};
use crate::metrics::Metric;
use crate::model::{BeliefModel, Model, PsrModel, RpsrModel};
use crate::pomdp::Pomdp;
use crate::search::{search_intents, search_tests, Basis};
use crate::value_function::ValueFunction;
use crate::value_iteration::init;

/// Result of a solve
#[derive(Clone, Debug)]
pub struct Solution {
    /// Basis the model was built on; `None` for the belief representation
    pub basis: Option<Basis>,
    pub value_function: ValueFunction,
    /// Model state at the start of an episode
    pub start: Array1<f64>,
    /// Convergence distance after every iteration, if a metric was configured
    pub distances: Vec<f64>,
}

impl Solution {
    pub fn value_at_start(&self) -> Result<f64> {
        self.value_function.value(self.start.view())
    }
}

pub struct Solver {
    config: SolverConfig,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Result<Self> {
        config.validate()?;
        Ok(Solver { config })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Search the basis the configured representation needs
    pub fn search(&self, pomdp: &Pomdp) -> Option<Basis> {
        let tolerance = self.config.rank_tolerance;
        match self.config.representation {
            Representation::Psr => Some(Basis::Tests(search_tests(pomdp, self.config.search, tolerance))),
            Representation::Rpsr => Some(Basis::Intents(search_intents(pomdp, self.config.search, tolerance))),
            Representation::Belief => None,
        }
    }

    /// Build the configured model over `basis`
    pub fn build_model(&self, pomdp: &Pomdp, basis: Option<&Basis>) -> Result<Box<dyn Model>> {
        let tolerance = self.config.rank_tolerance;
        match (self.config.representation, basis) {
            (Representation::Belief, _) => Ok(Box::new(BeliefModel::new(pomdp))),
            (Representation::Psr, Some(Basis::Tests(tests))) => {
                Ok(Box::new(PsrModel::new(pomdp, tests.as_slice(), tolerance)?))
            }
            (Representation::Rpsr, Some(Basis::Intents(intents))) => {
                Ok(Box::new(RpsrModel::new(pomdp, intents.as_slice(), tolerance)?))
            }
            (representation, basis) => Err(RpsrError::invalid_parameter(
                "basis".to_string(),
                format!(
                    "{:?} representation cannot use basis {:?}",
                    representation,
                    basis.map(|b| match b {
                        Basis::Tests(_) => "of tests",
                        Basis::Intents(_) => "of intents",
                    })
                ),
            )),
        }
    }

    /// Search a basis, build the model and run value iteration
    pub fn solve(&self, pomdp: &Pomdp) -> Result<Solution> {
        let basis = self.search(pomdp);
        self.solve_with_basis(pomdp, basis)
    }

    /// Like [`Solver::solve`] with a previously found basis
    pub fn solve_with_basis(&self, pomdp: &Pomdp, basis: Option<Basis>) -> Result<Solution> {
        let model = self.build_model(pomdp, basis.as_ref())?;
        let (value_function, distances) = self.run(model.as_ref())?;
        Ok(Solution {
            basis,
            value_function,
            start: model.start().to_owned(),
            distances,
        })
    }

    /// Value iteration from horizon 0 on `model`
    pub fn run<M: Model + ?Sized>(&self, model: &M) -> Result<(ValueFunction, Vec<f64>)> {
        let strategy = self.config.value_iteration;
        let convergence = self.config.convergence.map(|convergence| {
            let metric = match convergence.metric {
                ConvergenceMetric::Alpha => Metric::Alpha,
                ConvergenceMetric::BellmanAtStart => Metric::BellmanAtStart(model.start().to_owned()),
            };
            (metric, convergence.threshold)
        });

        let mut value_function = init(model);
        let mut distances = Vec::new();
        for _ in 0..self.config.horizon {
            let next = if self.config.parallel {
                strategy.par_iterate(model, &value_function, self.config.prune_epsilon)?
            } else {
                strategy.iterate(model, &value_function, self.config.prune_epsilon)?
            };
            info!(
                "VI iter horizon {} -> {} num_alphas {} -> {}",
                value_function.horizon(),
                next.horizon(),
                value_function.len(),
                next.len()
            );

            let converged = match &convergence {
                Some((metric, threshold)) => {
                    let distance = metric.distance(&value_function, &next)?;
                    info!("{:?} distance {}", metric, distance);
                    distances.push(distance);
                    distance <= *threshold
                }
                None => false,
            };

            value_function = next;
            if converged {
                info!("converged at horizon {}", value_function.horizon());
                break;
            }
        }

        debug!("final actions {:?}", value_function.actions());
        Ok((value_function, distances))
    }
}
