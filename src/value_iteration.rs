//! # Value Iteration
//!
//! Exact alpha-vector backups over any [`Model`]. Every strategy maps a value
//! function at horizon `h` to a new one at `h + 1`; the input is never
//! mutated.
//!
//! For action `a` and next alphas `α_o` (one per observation) the backed-up
//! vector is
//!
//! ```text
//! R[:, a] + Σ_o discount · M_ao · α_o
//! ```
//!
//! The strategies differ only in how much they prune before cross-summing
//! over observations.

use log::{debug, info, warn};
use ndarray::Array1;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpsrError};
use crate::linalg::cross_sum;
use crate::model::Model;
use crate::pruning::Pruner;
use crate::value_function::{Alpha, ValueFunction};

/// Backup strategy
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueIteration {
    /// Every combination of next alphas, pruned once at the end
    Enumerate,
    /// Prune per observation, then prune the full cross-sum per action
    #[default]
    IncrementalPruning,
    /// Prune per observation, then fold the cross-sum pairwise with pruning
    TrueIncrementalPruning,
}

/// Horizon 0: the single zero alpha, tagged with no action
pub fn init<M: Model + ?Sized>(model: &M) -> ValueFunction {
    ValueFunction::new(
        vec![Alpha {
            action: None,
            vector: Array1::zeros(model.rank()),
        }],
        0,
    )
}

/// One backup with the default strategy
pub fn iterate<M: Model + ?Sized>(model: &M, value_function: &ValueFunction, epsilon: f64) -> Result<ValueFunction> {
    ValueIteration::default().iterate(model, value_function, epsilon)
}

impl ValueIteration {
    /// One backup, actions processed sequentially
    pub fn iterate<M: Model + ?Sized>(
        self,
        model: &M,
        value_function: &ValueFunction,
        epsilon: f64,
    ) -> Result<ValueFunction> {
        self.run(model, value_function, epsilon, false)
    }

    /// One backup with actions processed on the rayon pool.
    ///
    /// Produces the same set of alphas as [`ValueIteration::iterate`].
    pub fn par_iterate<M: Model + ?Sized>(
        self,
        model: &M,
        value_function: &ValueFunction,
        epsilon: f64,
    ) -> Result<ValueFunction> {
        self.run(model, value_function, epsilon, true)
    }

    fn run<M: Model + ?Sized>(
        self,
        model: &M,
        value_function: &ValueFunction,
        epsilon: f64,
        parallel: bool,
    ) -> Result<ValueFunction> {
        check_value_function(model, value_function)?;
        let pruner = Pruner::new(model.witness_points(), epsilon)?;

        let backup = |action: usize| -> Result<Vec<Alpha>> {
            match self {
                ValueIteration::Enumerate => enumerate_action(model, value_function, action),
                _ => self.prune_action(model, &pruner, value_function, action),
            }
        };

        let per_action: Vec<Vec<Alpha>> = if parallel {
            (0..model.num_actions())
                .into_par_iter()
                .map(backup)
                .collect::<Result<_>>()?
        } else {
            (0..model.num_actions()).map(backup).collect::<Result<_>>()?
        };

        let candidates: Vec<Alpha> = per_action.into_iter().flatten().collect();
        let count = candidates.len();
        let alphas = pruner.purge(candidates)?;

        if pruner.lp_failures() > 0 {
            warn!(
                "{} pruning LPs failed during backup to horizon {}",
                pruner.lp_failures(),
                value_function.horizon() + 1
            );
        }
        info!(
            "{:?} backup to horizon {}: {} candidates, {} alphas",
            self,
            value_function.horizon() + 1,
            count,
            alphas.len()
        );

        Ok(ValueFunction::new(alphas, value_function.horizon() + 1))
    }

    fn prune_action<M: Model + ?Sized>(
        self,
        model: &M,
        pruner: &Pruner<'_>,
        value_function: &ValueFunction,
        action: usize,
    ) -> Result<Vec<Alpha>> {
        let share = model.rewards().column(action).to_owned() / model.num_observations() as f64;

        let mut slots = Vec::with_capacity(model.num_observations());
        for observation in 0..model.num_observations() {
            let candidates: Vec<Array1<f64>> = value_function
                .alphas()
                .iter()
                .map(|alpha| &share + &model.bootstrap(action, observation, alpha.vector.view()))
                .collect();
            slots.push(pruner.purge(candidates)?);
        }

        let combined = match self {
            ValueIteration::TrueIncrementalPruning => pruner.inc_prune(&slots)?,
            _ => pruner.purge(cross_sum(&slots))?,
        };
        debug!(
            "action {}: slot sizes {:?} -> {} vectors",
            action,
            slots.iter().map(Vec::len).collect::<Vec<_>>(),
            combined.len()
        );

        Ok(combined.into_iter().map(|vector| Alpha::new(action, vector)).collect())
    }
}

fn enumerate_action<M: Model + ?Sized>(model: &M, value_function: &ValueFunction, action: usize) -> Result<Vec<Alpha>> {
    let reward = model.rewards().column(action).to_owned();
    let slots: Vec<Vec<Array1<f64>>> = (0..model.num_observations())
        .map(|observation| {
            value_function
                .alphas()
                .iter()
                .map(|alpha| model.bootstrap(action, observation, alpha.vector.view()))
                .collect()
        })
        .collect();

    let alphas: Vec<Alpha> = cross_sum(&slots)
        .into_iter()
        .map(|sum| Alpha::new(action, sum + &reward))
        .collect();
    debug!("action {}: enumerated {} vectors", action, alphas.len());
    Ok(alphas)
}

fn check_value_function<M: Model + ?Sized>(model: &M, value_function: &ValueFunction) -> Result<()> {
    if value_function.is_empty() {
        return Err(RpsrError::EmptyInput("value function has no alpha vectors".to_string()));
    }
    if let Some(alpha) = value_function.alphas().iter().find(|alpha| alpha.vector.len() != model.rank()) {
        return Err(RpsrError::dimension_mismatch(
            format!("alphas of length {}", model.rank()),
            format!("alpha of length {}", alpha.vector.len()),
        ));
    }
    Ok(())
}
