//! # Models
//!
//! A model tracks an agent's state in some linear coordinate system and
//! exposes the operators value iteration needs. Three representations share
//! the [`Model`] contract:
//!
//! - [`PsrModel`]: predictive state over a basis of tests
//! - [`RpsrModel`]: reward-predictive state over a basis of intents
//! - [`BeliefModel`]: the plain belief over POMDP states
//!
//! States are plain vectors owned by the caller; models never mutate them.

pub mod belief;
pub mod compressed;

use log::warn;
use ndarray::{Array1, ArrayView1, ArrayView2};

use crate::error::{Result, RpsrError};

pub use belief::BeliefModel;
pub use compressed::{CompressedModel, PsrModel, RpsrModel};

/// Denominators at or below this are treated as impossible observations
pub const IMPOSSIBLE_OBSERVATION: f64 = 1e-12;

/// Tolerance before observation probabilities are reported as drifted
const PROBABILITY_DRIFT: f64 = 1e-9;

/// Linear state-space model of a POMDP
pub trait Model: Send + Sync {
    /// State dimension
    fn rank(&self) -> usize;

    fn num_actions(&self) -> usize;

    fn num_observations(&self) -> usize;

    fn discount(&self) -> f64;

    /// State at the start of an episode
    fn start(&self) -> ArrayView1<'_, f64>;

    /// Points (rows) spanning the reachable state region, used for pruning
    fn witness_points(&self) -> ArrayView2<'_, f64>;

    /// `rank × |A|` matrix; `state · rewards[:, a]` is the expected reward
    fn rewards(&self) -> ArrayView2<'_, f64>;

    /// `state · op` is the next state scaled by the observation probability
    fn update_operator(&self, action: usize, observation: usize) -> ArrayView2<'_, f64>;

    /// `state · m` is the probability of `observation` after `action`
    fn normalizer(&self, action: usize, observation: usize) -> ArrayView1<'_, f64>;

    /// Smallest and largest expected immediate reward over POMDP states
    fn reward_range(&self) -> (f64, f64) {
        let rewards = self.witness_points().dot(&self.rewards());
        rewards.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &r| {
            (lo.min(r), hi.max(r))
        })
    }

    /// Next state after taking `action` and seeing `observation`
    fn dynamics(&self, state: ArrayView1<f64>, action: usize, observation: usize) -> Result<Array1<f64>> {
        check_state(self, state)?;
        RpsrError::check_action(action, self.num_actions())?;
        check_observation(self, observation)?;

        let probability = state.dot(&self.normalizer(action, observation));
        if probability.abs() <= IMPOSSIBLE_OBSERVATION {
            return Err(RpsrError::ImpossibleObservation {
                action,
                observation,
                probability,
            });
        }

        Ok(state.dot(&self.update_operator(action, observation)) / probability)
    }

    /// Raw observation probabilities; may drift slightly outside the simplex
    fn observation_probs(&self, state: ArrayView1<f64>, action: usize) -> Result<Array1<f64>> {
        check_state(self, state)?;
        RpsrError::check_action(action, self.num_actions())?;

        Ok(Array1::from_iter(
            (0..self.num_observations()).map(|o| state.dot(&self.normalizer(action, o))),
        ))
    }

    /// Observation probabilities clipped to `[0, 1]` and renormalized
    fn normalized_observation_probs(&self, state: ArrayView1<f64>, action: usize) -> Result<Array1<f64>> {
        let probs = self.observation_probs(state, action)?;
        normalize_probabilities(probs)
    }

    fn expected_reward(&self, state: ArrayView1<f64>, action: usize) -> Result<f64> {
        check_state(self, state)?;
        RpsrError::check_action(action, self.num_actions())?;
        Ok(state.dot(&self.rewards().column(action)))
    }

    /// `discount · op · vector`, the backed-up value of `vector`
    fn bootstrap(&self, action: usize, observation: usize, vector: ArrayView1<f64>) -> Array1<f64> {
        self.update_operator(action, observation).dot(&vector) * self.discount()
    }
}

fn check_state<M: Model + ?Sized>(model: &M, state: ArrayView1<f64>) -> Result<()> {
    if state.len() != model.rank() {
        return Err(RpsrError::dimension_mismatch(
            format!("state of length {}", model.rank()),
            format!("{}", state.len()),
        ));
    }
    Ok(())
}

fn check_observation<M: Model + ?Sized>(model: &M, observation: usize) -> Result<()> {
    if observation >= model.num_observations() {
        return Err(RpsrError::invalid_parameter(
            "observation".to_string(),
            format!("{} must be less than {}", observation, model.num_observations()),
        ));
    }
    Ok(())
}

/// Clip to `[0, 1]` and renormalize, warning when the input drifted
pub fn normalize_probabilities(probs: Array1<f64>) -> Result<Array1<f64>> {
    let drifted = probs.iter().any(|&p| !(-PROBABILITY_DRIFT..=1.0 + PROBABILITY_DRIFT).contains(&p))
        || (probs.sum() - 1.0).abs() > PROBABILITY_DRIFT;

    let clipped = probs.mapv(|p| p.clamp(0.0, 1.0));
    let total = clipped.sum();
    if !(total > 0.0) {
        return Err(RpsrError::NumericalError(format!(
            "observation probabilities {} have no positive mass",
            probs
        )));
    }

    if drifted {
        warn!(
            "observation probabilities {} drifted off the simplex; clipping to [0, 1] and renormalizing",
            probs
        );
    }

    Ok(clipped / total)
}
