//! Dense operators synthesized from the raw POMDP tensors.

use ndarray::{s, Array2, Array4, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use super::PomdpData;

/// Reward, generative and dynamics operators of a POMDP
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Operators {
    /// `R[s, a] = E[r | s, a]`
    pub rewards: Array2<f64>,
    /// `G[a, o, s', s] = Pr(s', o | s, a)`
    pub generative: Array4<f64>,
    /// `D[a, o, s', s] = Pr(s' | s, a, o)`, zero where `o` is impossible
    pub dynamics: Array4<f64>,
}

impl Operators {
    pub(crate) fn from_tensors(data: &PomdpData) -> Self {
        let (num_states, num_actions, _) = data.transitions.dim();
        let num_observations = data.observations.len_of(Axis(3));

        let mut rewards = Array2::zeros((num_states, num_actions));
        let mut generative = Array4::zeros((num_actions, num_observations, num_states, num_states));

        for s in 0..num_states {
            for a in 0..num_actions {
                for next in 0..num_states {
                    let t = data.transitions[[s, a, next]];
                    if t == 0.0 {
                        continue;
                    }
                    for o in 0..num_observations {
                        let p = t * data.observations[[s, a, next, o]];
                        generative[[a, o, next, s]] = p;
                        rewards[[s, a]] += p * data.rewards[[s, a, next, o]];
                    }
                }
            }
        }

        let mut dynamics = generative.clone();
        for a in 0..num_actions {
            for o in 0..num_observations {
                for s in 0..num_states {
                    let mut column = dynamics.slice_mut(s![a, o, .., s]);
                    let total = column.sum();
                    if total > 0.0 {
                        column /= total;
                    } else {
                        column.fill(0.0);
                    }
                }
            }
        }

        Operators {
            rewards,
            generative,
            dynamics,
        }
    }

    pub fn generative_slice(&self, action: usize, observation: usize) -> ArrayView2<'_, f64> {
        self.generative.slice(s![action, observation, .., ..])
    }

    pub fn dynamics_slice(&self, action: usize, observation: usize) -> ArrayView2<'_, f64> {
        self.dynamics.slice(s![action, observation, .., ..])
    }
}

#[cfg(test)]
mod tests {
    use crate::testing::tiger;
    use ndarray::{array, Axis};

    #[test]
    fn test_tiger_expected_rewards() {
        let pomdp = tiger();
        let rewards = pomdp.expected_rewards();
        assert_eq!(rewards, &array![[-1.0, -100.0, 10.0], [-1.0, 10.0, -100.0]]);
    }

    #[test]
    fn test_generative_marginalizes_to_one() {
        let pomdp = tiger();
        let ops = pomdp.operators();
        // summing over observations and next states recovers total probability
        let totals = ops.generative.sum_axis(Axis(2)).sum_axis(Axis(1));
        for &total in totals.iter() {
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_listen_generative() {
        let pomdp = tiger();
        let g = pomdp.generative(0, 0);
        assert!((g[[0, 0]] - 0.85).abs() < 1e-12);
        assert!((g[[1, 1]] - 0.15).abs() < 1e-12);
        assert_eq!(g[[0, 1]], 0.0);
    }

    #[test]
    fn test_dynamics_columns_normalized() {
        let pomdp = tiger();
        let d = pomdp.operators().dynamics_slice(1, 1);
        for column in d.axis_iter(Axis(1)) {
            assert!((column.sum() - 1.0).abs() < 1e-12);
        }
    }
}
