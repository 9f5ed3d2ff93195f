//! Solver configuration, loadable from JSON or assembled with a builder.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RpsrError};
use crate::search::SearchStrategy;
use crate::value_iteration::ValueIteration;

/// State representation the solver plans in
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Representation {
    /// Predictive state over a basis of tests
    Psr,
    /// Reward-predictive state over a basis of intents
    #[default]
    Rpsr,
    /// Belief over POMDP states
    Belief,
}

/// Distance used between consecutive value functions
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConvergenceMetric {
    Alpha,
    /// Value difference at the model's start state
    BellmanAtStart,
}

/// Early stopping rule
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Convergence {
    pub metric: ConvergenceMetric,
    /// Stop once the distance is at or below this
    pub threshold: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    pub representation: Representation,
    pub search: SearchStrategy,
    pub value_iteration: ValueIteration,
    /// Absolute singular value cutoff for rank decisions; `None` uses
    /// `σ_max · max(m, n) · f64::EPSILON`
    pub rank_tolerance: Option<f64>,
    pub prune_epsilon: f64,
    pub horizon: usize,
    pub convergence: Option<Convergence>,
    /// Back up actions on the rayon pool
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            representation: Representation::default(),
            search: SearchStrategy::default(),
            value_iteration: ValueIteration::default(),
            rank_tolerance: None,
            prune_epsilon: 1e-15,
            horizon: 20,
            convergence: None,
            parallel: false,
        }
    }
}

impl SolverConfig {
    pub fn builder() -> SolverConfigBuilder {
        SolverConfigBuilder::new()
    }

    /// Load and validate a JSON configuration; missing fields take defaults
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        let config: SolverConfig = serde_json::from_reader(reader)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if let Some(tolerance) = self.rank_tolerance {
            if !(tolerance >= 0.0) {
                return Err(RpsrError::InvalidParameter {
                    name: "rank_tolerance".to_string(),
                    reason: format!("must be non-negative, got {}", tolerance),
                });
            }
        }
        if !(self.prune_epsilon >= 0.0) {
            return Err(RpsrError::InvalidParameter {
                name: "prune_epsilon".to_string(),
                reason: format!("must be non-negative, got {}", self.prune_epsilon),
            });
        }
        if let Some(convergence) = &self.convergence {
            if !(convergence.threshold >= 0.0) {
                return Err(RpsrError::InvalidParameter {
                    name: "convergence.threshold".to_string(),
                    reason: format!("must be non-negative, got {}", convergence.threshold),
                });
            }
        }
        Ok(())
    }
}

/// Builder for [`SolverConfig`]
pub struct SolverConfigBuilder {
    config: SolverConfig,
}

impl SolverConfigBuilder {
    pub fn new() -> Self {
        SolverConfigBuilder {
            config: SolverConfig::default(),
        }
    }

    pub fn representation(mut self, representation: Representation) -> Self {
        self.config.representation = representation;
        self
    }

    pub fn search(mut self, search: SearchStrategy) -> Self {
        self.config.search = search;
        self
    }

    pub fn value_iteration(mut self, value_iteration: ValueIteration) -> Self {
        self.config.value_iteration = value_iteration;
        self
    }

    pub fn rank_tolerance(mut self, tolerance: f64) -> Self {
        self.config.rank_tolerance = Some(tolerance);
        self
    }

    pub fn prune_epsilon(mut self, epsilon: f64) -> Self {
        self.config.prune_epsilon = epsilon;
        self
    }

    pub fn horizon(mut self, horizon: usize) -> Self {
        self.config.horizon = horizon;
        self
    }

    /// Stop early once `metric` between consecutive value functions is at
    /// or below `threshold`
    pub fn convergence(mut self, metric: ConvergenceMetric, threshold: f64) -> Self {
        self.config.convergence = Some(Convergence { metric, threshold });
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.config.parallel = parallel;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SolverConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for SolverConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = SolverConfig::builder().build().unwrap();
        assert_eq!(config.representation, Representation::Rpsr);
        assert_eq!(config.search, SearchStrategy::BreadthFirst);
        assert_eq!(config.value_iteration, ValueIteration::IncrementalPruning);
        assert_eq!(config.prune_epsilon, 1e-15);
        assert_eq!(config.horizon, 20);
        assert_eq!(config.rank_tolerance, None);
        assert!(config.convergence.is_none());
    }

    #[test]
    fn test_builder_validates() {
        assert!(SolverConfig::builder().prune_epsilon(-1.0).build().is_err());
        assert!(SolverConfig::builder().rank_tolerance(-1e-3).build().is_err());
        assert!(SolverConfig::builder()
            .convergence(ConvergenceMetric::Alpha, f64::NAN)
            .build()
            .is_err());

        let config = SolverConfig::builder()
            .representation(Representation::Psr)
            .search(SearchStrategy::DepthFirst)
            .value_iteration(ValueIteration::TrueIncrementalPruning)
            .horizon(5)
            .convergence(ConvergenceMetric::BellmanAtStart, 1e-6)
            .parallel(true)
            .build()
            .unwrap();
        assert_eq!(config.horizon, 5);
        assert!(config.parallel);
    }

    #[test]
    fn test_json_file_with_partial_fields() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"{{"representation": "Belief", "horizon": 7, "convergence": {{"metric": "Alpha", "threshold": 0.01}}}}"#
        )
        .unwrap();

        let config = SolverConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.representation, Representation::Belief);
        assert_eq!(config.horizon, 7);
        assert_eq!(config.prune_epsilon, 1e-15);
        assert_eq!(
            config.convergence,
            Some(Convergence {
                metric: ConvergenceMetric::Alpha,
                threshold: 0.01
            })
        );
    }

    #[test]
    fn test_json_file_rejects_invalid() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, r#"{{"prune_epsilon": -0.5}}"#).unwrap();
        assert!(matches!(
            SolverConfig::from_json_file(file.path()),
            Err(RpsrError::InvalidParameter { .. })
        ));
    }
}
