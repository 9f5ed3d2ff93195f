//! # Value Functions
//!
//! A value function is the upper envelope of a set of [`Alpha`] vectors over
//! model states: `value(state) = max_i state · alpha_i`. Alphas are kept in a
//! canonical order so equal sets compare equal regardless of how they were
//! produced.

use std::cmp::Ordering;
use std::sync::OnceLock;

use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RpsrError};
use crate::pruning::AsVector;

/// One linear piece of a value function, tagged with its action.
///
/// `action == None` marks the initial zero vector, which belongs to no action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Alpha {
    pub action: Option<usize>,
    pub vector: Array1<f64>,
}

impl Alpha {
    pub fn new(action: usize, vector: Array1<f64>) -> Self {
        Alpha {
            action: Some(action),
            vector,
        }
    }
}

impl AsVector for Alpha {
    fn as_vector(&self) -> ArrayView1<'_, f64> {
        self.vector.view()
    }
}

/// Piecewise-linear convex value function over model states
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(from = "StoredValueFunction", into = "StoredValueFunction")]
pub struct ValueFunction {
    alphas: Vec<Alpha>,
    horizon: usize,
    matrix: OnceLock<Array2<f64>>,
}

#[derive(Serialize, Deserialize)]
struct StoredValueFunction {
    alphas: Vec<Alpha>,
    horizon: usize,
}

impl From<StoredValueFunction> for ValueFunction {
    fn from(stored: StoredValueFunction) -> Self {
        ValueFunction::new(stored.alphas, stored.horizon)
    }
}

impl From<ValueFunction> for StoredValueFunction {
    fn from(vf: ValueFunction) -> Self {
        StoredValueFunction {
            alphas: vf.alphas,
            horizon: vf.horizon,
        }
    }
}

impl ValueFunction {
    /// Alphas are stored in canonical (lexicographic vector) order
    pub fn new(mut alphas: Vec<Alpha>, horizon: usize) -> Self {
        alphas.sort_by(|a, b| canonical_order(&a.vector, &b.vector));
        ValueFunction {
            alphas,
            horizon,
            matrix: OnceLock::new(),
        }
    }

    pub fn alphas(&self) -> &[Alpha] {
        &self.alphas
    }

    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn len(&self) -> usize {
        self.alphas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alphas.is_empty()
    }

    /// Alpha vectors as columns
    pub fn matrix(&self) -> &Array2<f64> {
        self.matrix.get_or_init(|| {
            let dim = self.alphas.first().map_or(0, |alpha| alpha.vector.len());
            let mut matrix = Array2::zeros((dim, self.alphas.len()));
            for (j, alpha) in self.alphas.iter().enumerate() {
                matrix.column_mut(j).assign(&alpha.vector);
            }
            matrix
        })
    }

    fn best(&self, state: ArrayView1<f64>) -> Result<(usize, f64)> {
        if self.alphas.is_empty() {
            return Err(RpsrError::EmptyInput("value function has no alpha vectors".to_string()));
        }
        let matrix = self.matrix();
        if matrix.nrows() != state.len() {
            return Err(RpsrError::dimension_mismatch(
                format!("state of length {}", matrix.nrows()),
                format!("{}", state.len()),
            ));
        }

        let values = matrix.t().dot(&state);
        let mut best = (0, f64::NEG_INFINITY);
        for (i, &value) in values.iter().enumerate() {
            if value > best.1 {
                best = (i, value);
            }
        }
        Ok(best)
    }

    /// `max_i state · alpha_i`
    pub fn value(&self, state: ArrayView1<f64>) -> Result<f64> {
        self.best(state).map(|(_, value)| value)
    }

    /// Action of the maximizing alpha; `None` for the initial zero alpha
    pub fn policy(&self, state: ArrayView1<f64>) -> Result<Option<usize>> {
        self.best(state).map(|(i, _)| self.alphas[i].action)
    }

    /// Distinct actions used by the alphas, ascending
    pub fn actions(&self) -> Vec<Option<usize>> {
        let mut actions: Vec<Option<usize>> = self.alphas.iter().map(|alpha| alpha.action).collect();
        actions.sort();
        actions.dedup();
        actions
    }
}

impl PartialEq for ValueFunction {
    fn eq(&self, other: &Self) -> bool {
        self.horizon == other.horizon && self.alphas == other.alphas
    }
}

fn canonical_order(a: &Array1<f64>, b: &Array1<f64>) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|ordering| *ordering != Ordering::Equal)
        .unwrap_or_else(|| a.len().cmp(&b.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::random_value_function;
    use ndarray::array;
    use rand::thread_rng;

    #[test]
    fn test_zero_alpha_is_zero_everywhere() {
        let vf = ValueFunction::new(vec![Alpha { action: None, vector: Array1::zeros(3) }], 0);
        assert_eq!(vf.value(array![0.2, 0.3, 0.5].view()).unwrap(), 0.0);
        assert_eq!(vf.value(array![-4.0, 1.0, 9.0].view()).unwrap(), 0.0);
        assert_eq!(vf.policy(array![1.0, 0.0, 0.0].view()).unwrap(), None);
    }

    #[test]
    fn test_value_and_policy() {
        let vf = ValueFunction::new(
            vec![Alpha::new(0, array![1.0, 0.0]), Alpha::new(1, array![0.0, 1.0])],
            3,
        );
        assert_eq!(vf.value(array![0.7, 0.3].view()).unwrap(), 0.7);
        assert_eq!(vf.policy(array![0.7, 0.3].view()).unwrap(), Some(0));
        assert_eq!(vf.policy(array![0.2, 0.8].view()).unwrap(), Some(1));
        assert_eq!(vf.horizon(), 3);
    }

    #[test]
    fn test_value_is_convex() {
        let mut rng = thread_rng();
        let vf = random_value_function(&mut rng, 10, 3, 2);
        let x = array![1.0, -2.0];
        let y = array![0.5, 3.0];
        for &t in &[0.1, 0.25, 0.5, 0.9] {
            let mix = &x * t + &y * (1.0 - t);
            let lhs = vf.value(mix.view()).unwrap();
            let rhs = t * vf.value(x.view()).unwrap() + (1.0 - t) * vf.value(y.view()).unwrap();
            assert!(lhs <= rhs + 1e-9);
        }
    }

    #[test]
    fn test_canonical_order_makes_equal() {
        let a = Alpha::new(0, array![1.0, 0.0]);
        let b = Alpha::new(1, array![0.0, 1.0]);
        let first = ValueFunction::new(vec![a.clone(), b.clone()], 1);
        let second = ValueFunction::new(vec![b, a], 1);
        assert_eq!(first, second);
        assert_eq!(first.alphas()[0].vector, array![0.0, 1.0]);
    }

    #[test]
    fn test_state_dimension_checked() {
        let vf = ValueFunction::new(vec![Alpha::new(0, array![1.0, 0.0])], 1);
        assert!(matches!(
            vf.value(array![1.0].view()),
            Err(RpsrError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut rng = thread_rng();
        let vf = random_value_function(&mut rng, 5, 2, 3);
        let json = serde_json::to_string(&vf).unwrap();
        let restored: ValueFunction = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, vf);
        assert_eq!(restored.matrix(), vf.matrix());
    }
}
