//! Policies acting on a model one interaction at a time.

use log::debug;
use ndarray::{Array1, ArrayView1};
use rand::Rng;

use crate::error::{Result, RpsrError};
use crate::model::Model;
use crate::value_function::ValueFunction;

/// Chooses actions from the history of interactions
pub trait Policy {
    /// Start a new episode and return the first action
    fn reset(&mut self) -> Result<usize>;

    /// Record `action` and the `observation` it produced; return the next action
    fn step(&mut self, action: usize, observation: usize) -> Result<usize>;
}

/// Greedy policy over a value function, tracking the model state
pub struct ModelPolicy<'a, M: Model + ?Sized> {
    model: &'a M,
    value_function: &'a ValueFunction,
    state: Array1<f64>,
}

impl<'a, M: Model + ?Sized> ModelPolicy<'a, M> {
    pub fn new(model: &'a M, value_function: &'a ValueFunction) -> Result<Self> {
        if value_function.is_empty() {
            return Err(RpsrError::EmptyInput("value function has no alpha vectors".to_string()));
        }
        if value_function.matrix().nrows() != model.rank() {
            return Err(RpsrError::dimension_mismatch(
                format!("alphas of length {}", model.rank()),
                format!("alphas of length {}", value_function.matrix().nrows()),
            ));
        }

        Ok(ModelPolicy {
            model,
            value_function,
            state: model.start().to_owned(),
        })
    }

    /// Current model state
    pub fn state(&self) -> ArrayView1<'_, f64> {
        self.state.view()
    }

    fn act(&self) -> Result<usize> {
        let action = self.value_function.policy(self.state.view())?;
        debug!("state {} -> action {:?}", self.state, action);
        action.ok_or_else(|| {
            RpsrError::invalid_parameter(
                "value_function".to_string(),
                format!(
                    "best alpha at horizon {} carries no action",
                    self.value_function.horizon()
                ),
            )
        })
    }
}

impl<M: Model + ?Sized> Policy for ModelPolicy<'_, M> {
    fn reset(&mut self) -> Result<usize> {
        self.state = self.model.start().to_owned();
        self.act()
    }

    fn step(&mut self, action: usize, observation: usize) -> Result<usize> {
        self.state = self.model.dynamics(self.state.view(), action, observation)?;
        self.act()
    }
}

/// Uniformly random actions
pub struct RandomPolicy<R: Rng> {
    num_actions: usize,
    rng: R,
}

impl<R: Rng> RandomPolicy<R> {
    pub fn new(num_actions: usize, rng: R) -> Result<Self> {
        if num_actions == 0 {
            return Err(RpsrError::invalid_parameter(
                "num_actions".to_string(),
                "must be positive".to_string(),
            ));
        }
        Ok(RandomPolicy { num_actions, rng })
    }
}

impl<R: Rng> Policy for RandomPolicy<R> {
    fn reset(&mut self) -> Result<usize> {
        Ok(self.rng.gen_range(0..self.num_actions))
    }

    fn step(&mut self, action: usize, _observation: usize) -> Result<usize> {
        RpsrError::check_action(action, self.num_actions)?;
        Ok(self.rng.gen_range(0..self.num_actions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BeliefModel;
    use crate::testing::tiger;
    use crate::value_iteration::{init, ValueIteration};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn solved(model: &BeliefModel, steps: usize) -> ValueFunction {
        let mut vf = init(model);
        for _ in 0..steps {
            vf = ValueIteration::IncrementalPruning.iterate(model, &vf, 1e-15).unwrap();
        }
        vf
    }

    #[test]
    fn test_tiger_policy_listens_then_opens() {
        let model = BeliefModel::new(&tiger());
        let vf = solved(&model, 10);
        let mut policy = ModelPolicy::new(&model, &vf).unwrap();

        // uncertain: listen
        assert_eq!(policy.reset().unwrap(), 0);
        // one growl on the left is not enough
        assert_eq!(policy.step(0, 0).unwrap(), 0);
        // two agreeing growls on the left: open the right door
        assert_eq!(policy.step(0, 0).unwrap(), 2);
        assert!(policy.state()[0] > 0.96);

        // resetting restores the start belief
        assert_eq!(policy.reset().unwrap(), 0);
        assert_eq!(policy.state(), model.start());
    }

    #[test]
    fn test_horizon_zero_has_no_action() {
        let model = BeliefModel::new(&tiger());
        let vf = init(&model);
        let mut policy = ModelPolicy::new(&model, &vf).unwrap();
        assert!(matches!(policy.reset(), Err(RpsrError::InvalidParameter { .. })));
    }

    #[test]
    fn test_model_policy_rejects_wrong_dimension() {
        let model = BeliefModel::new(&tiger());
        let vf = ValueFunction::new(vec![crate::value_function::Alpha::new(0, Array1::zeros(5))], 1);
        assert!(ModelPolicy::new(&model, &vf).is_err());
    }

    #[test]
    fn test_random_policy() {
        let mut policy = RandomPolicy::new(3, StdRng::seed_from_u64(0)).unwrap();
        for _ in 0..50 {
            let action = policy.reset().unwrap();
            assert!(action < 3);
            assert!(policy.step(action, 0).unwrap() < 3);
        }
        assert!(policy.step(3, 0).is_err());
        assert!(RandomPolicy::new(0, StdRng::seed_from_u64(0)).is_err());
    }
}
