//! # Outcome Engine
//!
//! The outcome vector of a trace maps every POMDP state to the expected value
//! of that trace from the state: the probability of a test succeeding, or
//! for an intent with an action, the expected reward of that action gated by
//! its test. It is computed by folding the transposed generative slices over
//! the trace from the last interaction back to the first.

use std::collections::HashMap;

use log::debug;
use ndarray::{Array1, Array2};

use crate::pomdp::Pomdp;
use crate::trace::{Intent, Interaction, Test, Trace};

/// Traces with an outcome vector over POMDP states
pub trait Outcome {
    fn outcome(&self, pomdp: &Pomdp) -> Array1<f64>;
}

fn fold_back(pomdp: &Pomdp, interactions: &[Interaction], init: Array1<f64>) -> Array1<f64> {
    interactions.iter().rev().fold(init, |vector, interaction| {
        pomdp
            .generative(interaction.action, interaction.observation)
            .t()
            .dot(&vector)
    })
}

impl Outcome for Test {
    fn outcome(&self, pomdp: &Pomdp) -> Array1<f64> {
        fold_back(pomdp, self.interactions(), Array1::ones(pomdp.num_states()))
    }
}

impl Outcome for Intent {
    fn outcome(&self, pomdp: &Pomdp) -> Array1<f64> {
        let init = match self.action {
            Some(action) => pomdp.expected_rewards().column(action).to_owned(),
            None => Array1::ones(pomdp.num_states()),
        };
        fold_back(pomdp, self.test.interactions(), init)
    }
}

/// Outcome vectors stacked as columns, in iteration order
pub fn outcome_matrix<'a, T, I>(pomdp: &Pomdp, traces: I) -> Array2<f64>
where
    T: Outcome + 'a,
    I: IntoIterator<Item = &'a T>,
{
    let columns: Vec<Array1<f64>> = traces.into_iter().map(|trace| trace.outcome(pomdp)).collect();
    stack_columns(pomdp.num_states(), &columns)
}

pub(crate) fn stack_columns(rows: usize, columns: &[Array1<f64>]) -> Array2<f64> {
    let mut matrix = Array2::zeros((rows, columns.len()));
    for (j, column) in columns.iter().enumerate() {
        matrix.column_mut(j).assign(column);
    }
    matrix
}

/// Memoized outcome vectors for a single POMDP.
///
/// Keys are compared structurally, so equal traces built independently hit
/// the same entry. A cache must not outlive or be shared across POMDPs; the
/// borrow enforces that.
pub struct OutcomeCache<'a, T> {
    pomdp: &'a Pomdp,
    vectors: HashMap<T, Array1<f64>>,
}

impl<'a, T: Trace + Outcome> OutcomeCache<'a, T> {
    pub fn new(pomdp: &'a Pomdp) -> Self {
        OutcomeCache {
            pomdp,
            vectors: HashMap::new(),
        }
    }

    pub fn pomdp(&self) -> &'a Pomdp {
        self.pomdp
    }

    pub fn get(&mut self, trace: &T) -> &Array1<f64> {
        let pomdp = self.pomdp;
        self.vectors.entry(trace.clone()).or_insert_with(|| {
            debug!("computing outcome vector of {}", trace);
            trace.outcome(pomdp)
        })
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::tiger;
    use ndarray::array;

    #[test]
    fn test_empty_test_is_all_ones() {
        let pomdp = tiger();
        assert_eq!(Test::empty().outcome(&pomdp), array![1.0, 1.0]);
    }

    #[test]
    fn test_listen_outcome() {
        let pomdp = tiger();
        // hearing the tiger on the left after listening
        let outcome = Interaction::new(0, 0).as_test().outcome(&pomdp);
        assert!((outcome[0] - 0.85).abs() < 1e-12);
        assert!((outcome[1] - 0.15).abs() < 1e-12);
    }

    #[test]
    fn test_intent_outcomes() {
        let pomdp = tiger();
        assert_eq!(Intent::action_only(1).outcome(&pomdp), array![-100.0, 10.0]);
        assert_eq!(Intent::test_only(Test::empty()).outcome(&pomdp), array![1.0, 1.0]);

        let intent = Intent::action_only(1).prepend(Interaction::new(0, 0));
        let outcome = intent.outcome(&pomdp);
        assert!((outcome[0] - 0.85 * -100.0).abs() < 1e-9);
        assert!((outcome[1] - 0.15 * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_outcome_matrix_column_order() {
        let pomdp = tiger();
        let tests = vec![Interaction::new(0, 0).as_test(), Interaction::new(0, 1).as_test()];
        let matrix = outcome_matrix(&pomdp, &tests);
        assert_eq!(matrix.dim(), (2, 2));
        assert_eq!(matrix.column(0), tests[0].outcome(&pomdp));
        assert_eq!(matrix.column(1), tests[1].outcome(&pomdp));
    }

    #[test]
    fn test_cache_is_bit_identical() {
        let pomdp = tiger();
        let mut cache = OutcomeCache::new(&pomdp);
        let test = Test::new(vec![Interaction::new(0, 1), Interaction::new(0, 0)]);
        let first = cache.get(&test).clone();
        let rebuilt = Test::new(test.interactions().to_vec());
        assert_eq!(cache.get(&rebuilt), &first);
        assert_eq!(cache.len(), 1);
        assert_eq!(first, test.outcome(&pomdp));
    }
}
