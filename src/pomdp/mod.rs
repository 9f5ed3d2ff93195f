//! # POMDP Specification
//!
//! The raw model every representation in this crate is derived from:
//! state/action/observation counts, the transition tensor `T[s, a, s']`,
//! the observation tensor `O[s, a, s', o]`, the reward tensor
//! `R[s, a, s', o]`, a discount factor and a starting belief.
//!
//! A [`Pomdp`] is validated once at construction and is immutable afterwards.
//! The dense operators derived from it (see [`operators`]) are computed lazily
//! on first use and cached inside the instance, so they never leak across
//! distinct specifications.

pub mod operators;

use std::sync::OnceLock;

use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpsrError};

pub use operators::Operators;

const PROBABILITY_TOLERANCE: f64 = 1e-6;

/// Plain tensor data of a POMDP, as stored on disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PomdpData {
    pub transitions: Array3<f64>,
    pub observations: Array4<f64>,
    pub rewards: Array4<f64>,
    pub discount: f64,
    pub start: Array1<f64>,
}

/// A validated POMDP specification
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "PomdpData", into = "PomdpData")]
pub struct Pomdp {
    data: PomdpData,
    operators: OnceLock<Operators>,
}

impl Pomdp {
    /// Create a POMDP from its tensors.
    ///
    /// Shapes must agree (`T: |S|×|A|×|S|`, `O` and `R: |S|×|A|×|S|×|O|`,
    /// `start: |S|`), the discount must lie in `(0, 1]`, and `T`, `O` and
    /// `start` must be (row-)stochastic up to a small tolerance.
    pub fn new(
        transitions: Array3<f64>,
        observations: Array4<f64>,
        rewards: Array4<f64>,
        discount: f64,
        start: Array1<f64>,
    ) -> Result<Self> {
        let data = PomdpData {
            transitions,
            observations,
            rewards,
            discount,
            start,
        };
        Self::validate(&data)?;

        Ok(Pomdp {
            data,
            operators: OnceLock::new(),
        })
    }

    /// Skip validation; for generators that are stochastic by construction
    pub(crate) fn from_data_unchecked(data: PomdpData) -> Self {
        debug_assert!(Self::validate(&data).is_ok());
        Pomdp {
            data,
            operators: OnceLock::new(),
        }
    }

    fn validate(data: &PomdpData) -> Result<()> {
        let (num_states, num_actions, next_states) = data.transitions.dim();
        if num_states == 0 || num_actions == 0 {
            return Err(RpsrError::EmptyInput("POMDP needs at least one state and one action".to_string()));
        }
        if next_states != num_states {
            return Err(RpsrError::dimension_mismatch(
                format!("T of shape ({0}, {1}, {0})", num_states, num_actions),
                format!("{:?}", data.transitions.shape()),
            ));
        }

        let num_observations = data.observations.len_of(Axis(3));
        if num_observations == 0 {
            return Err(RpsrError::EmptyInput("POMDP needs at least one observation".to_string()));
        }
        let expected = (num_states, num_actions, num_states, num_observations);
        if data.observations.dim() != expected {
            return Err(RpsrError::dimension_mismatch(
                format!("O of shape {:?}", expected),
                format!("{:?}", data.observations.shape()),
            ));
        }
        if data.rewards.dim() != expected {
            return Err(RpsrError::dimension_mismatch(
                format!("R of shape {:?}", expected),
                format!("{:?}", data.rewards.shape()),
            ));
        }
        if data.start.len() != num_states {
            return Err(RpsrError::dimension_mismatch(
                format!("start of length {}", num_states),
                format!("{}", data.start.len()),
            ));
        }

        if !(data.discount > 0.0 && data.discount <= 1.0) {
            return Err(RpsrError::invalid_parameter(
                "discount".to_string(),
                format!("{} is outside (0, 1]", data.discount),
            ));
        }

        if !is_distribution(data.start.view()) {
            return Err(RpsrError::invalid_parameter(
                "start",
                "starting belief is not a probability distribution",
            ));
        }
        for row in data.transitions.lanes(Axis(2)) {
            if !is_distribution(row) {
                return Err(RpsrError::invalid_parameter(
                    "transitions",
                    "T[s, a, :] is not a probability distribution",
                ));
            }
        }
        for row in data.observations.lanes(Axis(3)) {
            if !is_distribution(row) {
                return Err(RpsrError::invalid_parameter(
                    "observations",
                    "O[s, a, s', :] is not a probability distribution",
                ));
            }
        }

        Ok(())
    }

    pub fn num_states(&self) -> usize {
        self.data.transitions.len_of(Axis(0))
    }

    pub fn num_actions(&self) -> usize {
        self.data.transitions.len_of(Axis(1))
    }

    pub fn num_observations(&self) -> usize {
        self.data.observations.len_of(Axis(3))
    }

    pub fn discount(&self) -> f64 {
        self.data.discount
    }

    pub fn start(&self) -> ArrayView1<'_, f64> {
        self.data.start.view()
    }

    pub fn transitions(&self) -> &Array3<f64> {
        &self.data.transitions
    }

    pub fn observations(&self) -> &Array4<f64> {
        &self.data.observations
    }

    pub fn rewards(&self) -> &Array4<f64> {
        &self.data.rewards
    }

    /// Derived operators, computed on first access
    pub fn operators(&self) -> &Operators {
        self.operators.get_or_init(|| Operators::from_tensors(&self.data))
    }

    /// Expected immediate rewards `R[s, a]`
    pub fn expected_rewards(&self) -> &Array2<f64> {
        &self.operators().rewards
    }

    /// Generative slice `G[a, o]` with entries `Pr(s', o | s, a)` at `[s', s]`
    pub fn generative(&self, action: usize, observation: usize) -> ArrayView2<'_, f64> {
        self.operators().generative_slice(action, observation)
    }
}

impl TryFrom<PomdpData> for Pomdp {
    type Error = RpsrError;

    fn try_from(data: PomdpData) -> Result<Self> {
        Pomdp::new(data.transitions, data.observations, data.rewards, data.discount, data.start)
    }
}

impl From<Pomdp> for PomdpData {
    fn from(pomdp: Pomdp) -> Self {
        pomdp.data
    }
}

fn is_distribution(values: ArrayView1<f64>) -> bool {
    values.iter().all(|&p| p >= -PROBABILITY_TOLERANCE)
        && (values.sum() - 1.0).abs() <= PROBABILITY_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tiger;
    use ndarray::array;

    #[test]
    fn test_tiger_dimensions() {
        let pomdp = tiger();
        assert_eq!(pomdp.num_states(), 2);
        assert_eq!(pomdp.num_actions(), 3);
        assert_eq!(pomdp.num_observations(), 2);
        assert_eq!(pomdp.discount(), 0.95);
    }

    #[test]
    fn test_rejects_bad_discount() {
        let pomdp = tiger();
        let data: PomdpData = pomdp.into();
        let result = Pomdp::new(data.transitions, data.observations, data.rewards, 0.0, data.start);
        assert!(matches!(result, Err(RpsrError::InvalidParameter { .. })));
    }

    #[test]
    fn test_rejects_bad_start() {
        let data: PomdpData = tiger().into();
        let result = Pomdp::new(
            data.transitions,
            data.observations,
            data.rewards,
            0.9,
            array![0.7, 0.7],
        );
        assert!(matches!(result, Err(RpsrError::InvalidParameter { .. })));
    }

    #[test]
    fn test_rejects_shape_mismatch() {
        let data: PomdpData = tiger().into();
        let result = Pomdp::new(
            data.transitions,
            data.observations,
            data.rewards,
            0.9,
            array![0.2, 0.3, 0.5],
        );
        assert!(matches!(result, Err(RpsrError::DimensionMismatch { .. })));
    }

    #[test]
    fn test_json_round_trip_validates() {
        let pomdp = tiger();
        let json = serde_json::to_string(&pomdp).unwrap();
        let restored: Pomdp = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.transitions(), pomdp.transitions());
        assert_eq!(restored.expected_rewards(), pomdp.expected_rewards());

        let mut data: PomdpData = pomdp.into();
        data.discount = 2.0;
        let json = serde_json::to_string(&data).unwrap();
        assert!(serde_json::from_str::<Pomdp>(&json).is_err());
    }
}
