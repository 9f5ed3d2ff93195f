//! Compressed PSR / RPSR models built from a POMDP and a discovered basis.
//!
//! With `U` the `|S| × k` outcome matrix of the basis and `U⁺` its
//! pseudo-inverse, the model holds for every interaction `(a, o)`:
//!
//! - `M_ao = Uᵗ · G_ao · (U⁺)ᵗ`, the compressed transition operator
//! - `M_ao^ext`, whose column `j` is `U⁺ · outcome(ao · q_j)`; the numerator
//!   of the state update
//! - `m_ao = U⁺ · outcome(normalizer(ao))`, the denominator
//!
//! plus the compressed rewards `U⁺ · R` and the start state `b₀ · U`.

use log::info;
use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView1, ArrayView2};

use super::Model;
use crate::error::{Result, RpsrError};
use crate::linalg::{matrix_rank, pinv};
use crate::outcome::{stack_columns, Outcome, OutcomeCache};
use crate::pomdp::Pomdp;
use crate::trace::{interactions, Intent, Interaction, Test, Trace};

/// Compressed model over a basis of traces `T`
#[derive(Clone, Debug)]
pub struct CompressedModel<T> {
    basis: Vec<T>,
    outcome_matrix: Array2<f64>,
    pseudo_inverse: Array2<f64>,
    transitions: Array4<f64>,
    updates: Array4<f64>,
    normalizers: Array3<f64>,
    rewards: Array2<f64>,
    start: Array1<f64>,
    discount: f64,
}

/// Predictive state representation over tests
pub type PsrModel = CompressedModel<Test>;

/// Reward-predictive state representation over intents
pub type RpsrModel = CompressedModel<Intent>;

impl<T: Trace + Outcome> CompressedModel<T> {
    /// Build every operator eagerly.
    ///
    /// The basis must be non-empty, index only valid actions and observations,
    /// and have linearly independent outcome vectors. `rank_tolerance` is the
    /// singular value cutoff used for both checks and the pseudo-inverse.
    pub fn new(pomdp: &Pomdp, basis: &[T], rank_tolerance: Option<f64>) -> Result<Self> {
        if basis.is_empty() {
            return Err(RpsrError::EmptyInput("compressed model needs a non-empty basis".to_string()));
        }
        let num_actions = pomdp.num_actions();
        let num_observations = pomdp.num_observations();
        for trace in basis {
            trace.validate(num_actions, num_observations)?;
        }

        let k = basis.len();
        let mut cache = OutcomeCache::new(pomdp);

        let columns: Vec<Array1<f64>> = basis.iter().map(|trace| cache.get(trace).clone()).collect();
        let outcome_matrix = stack_columns(pomdp.num_states(), &columns);
        let rank = matrix_rank(outcome_matrix.view(), rank_tolerance);
        if rank != k {
            return Err(RpsrError::NumericalError(format!(
                "basis of {} traces has outcome rank {}",
                k, rank
            )));
        }
        let pseudo_inverse = pinv(outcome_matrix.view(), rank_tolerance);

        let mut transitions = Array4::zeros((num_actions, num_observations, k, k));
        let mut updates = Array4::zeros((num_actions, num_observations, k, k));
        let mut normalizers = Array3::zeros((num_actions, num_observations, k));

        for interaction in interactions(num_actions, num_observations) {
            let Interaction { action: a, observation: o } = interaction;

            let generative = pomdp.generative(a, o);
            transitions
                .slice_mut(s![a, o, .., ..])
                .assign(&outcome_matrix.t().dot(&generative).dot(&pseudo_inverse.t()));

            let mut update = updates.slice_mut(s![a, o, .., ..]);
            for (j, trace) in basis.iter().enumerate() {
                let extended = trace.prepend(interaction);
                update.column_mut(j).assign(&pseudo_inverse.dot(cache.get(&extended)));
            }

            let normalizer = T::normalizer(interaction);
            normalizers
                .slice_mut(s![a, o, ..])
                .assign(&pseudo_inverse.dot(cache.get(&normalizer)));
        }

        let rewards = pseudo_inverse.dot(pomdp.expected_rewards());
        let start = pomdp.start().dot(&outcome_matrix);

        info!(
            "built compressed model of rank {} over {} states ({} outcome vectors)",
            k,
            pomdp.num_states(),
            cache.len()
        );

        Ok(CompressedModel {
            basis: basis.to_vec(),
            outcome_matrix,
            pseudo_inverse,
            transitions,
            updates,
            normalizers,
            rewards,
            start,
            discount: pomdp.discount(),
        })
    }
}

impl<T> CompressedModel<T> {
    pub fn basis(&self) -> &[T] {
        &self.basis
    }

    /// `|S| × k` outcome matrix of the basis
    pub fn outcome_matrix(&self) -> &Array2<f64> {
        &self.outcome_matrix
    }

    /// `k × |S|` pseudo-inverse of the outcome matrix
    pub fn pseudo_inverse(&self) -> &Array2<f64> {
        &self.pseudo_inverse
    }

    /// `M_ao = Uᵗ · G_ao · (U⁺)ᵗ`
    pub fn transition(&self, action: usize, observation: usize) -> ArrayView2<'_, f64> {
        self.transitions.slice(s![action, observation, .., ..])
    }

    /// Project a POMDP belief into model coordinates
    pub fn compress(&self, belief: ArrayView1<f64>) -> Result<Array1<f64>> {
        if belief.len() != self.outcome_matrix.nrows() {
            return Err(RpsrError::dimension_mismatch(
                format!("belief of length {}", self.outcome_matrix.nrows()),
                format!("{}", belief.len()),
            ));
        }
        Ok(belief.dot(&self.outcome_matrix))
    }

    /// Expected rewards `R[s, a]` recovered from the compressed rewards
    pub fn rewards_as_pomdp(&self) -> Array2<f64> {
        self.outcome_matrix.dot(&self.rewards)
    }
}

impl<T: Send + Sync> Model for CompressedModel<T> {
    fn rank(&self) -> usize {
        self.outcome_matrix.ncols()
    }

    fn num_actions(&self) -> usize {
        self.updates.dim().0
    }

    fn num_observations(&self) -> usize {
        self.updates.dim().1
    }

    fn discount(&self) -> f64 {
        self.discount
    }

    fn start(&self) -> ArrayView1<'_, f64> {
        self.start.view()
    }

    fn witness_points(&self) -> ArrayView2<'_, f64> {
        self.outcome_matrix.view()
    }

    fn rewards(&self) -> ArrayView2<'_, f64> {
        self.rewards.view()
    }

    fn update_operator(&self, action: usize, observation: usize) -> ArrayView2<'_, f64> {
        self.updates.slice(s![action, observation, .., ..])
    }

    fn normalizer(&self, action: usize, observation: usize) -> ArrayView1<'_, f64> {
        self.normalizers.slice(s![action, observation, ..])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BeliefModel;
    use crate::outcome::outcome_matrix;
    use crate::search::{search_intents, search_tests, SearchStrategy};
    use crate::testing::tiger;
    use ndarray::array;

    fn assert_close(a: ArrayView1<f64>, b: ArrayView1<f64>, tolerance: f64) {
        assert_eq!(a.len(), b.len());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < tolerance, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_outcome_matrix_round_trip() {
        let pomdp = tiger();
        let tests = search_tests(&pomdp, SearchStrategy::BreadthFirst, None);
        let model = PsrModel::new(&pomdp, tests.as_slice(), None).unwrap();
        let recomputed = outcome_matrix(&pomdp, tests.iter());
        assert_eq!(model.outcome_matrix(), &recomputed);
    }

    #[test]
    fn test_rebuild_is_bit_identical() {
        let pomdp = tiger();
        let intents = search_intents(&pomdp, SearchStrategy::BreadthFirst, None);
        let first = RpsrModel::new(&pomdp, intents.as_slice(), None).unwrap();
        let second = RpsrModel::new(&pomdp, intents.as_slice(), None).unwrap();
        assert_eq!(first.updates, second.updates);
        assert_eq!(first.normalizers, second.normalizers);
        assert_eq!(first.rewards, second.rewards);
    }

    #[test]
    fn test_psr_tracks_belief() {
        let pomdp = tiger();
        let tests = search_tests(&pomdp, SearchStrategy::DepthFirst, None);
        let psr = PsrModel::new(&pomdp, tests.as_slice(), None).unwrap();
        let belief = BeliefModel::new(&pomdp);

        let mut b = belief.start().to_owned();
        let mut q = psr.start().to_owned();
        for &(a, o) in &[(0, 0), (0, 0), (0, 1), (1, 1), (0, 0)] {
            b = belief.dynamics(b.view(), a, o).unwrap();
            q = psr.dynamics(q.view(), a, o).unwrap();
            assert_close(psr.compress(b.view()).unwrap().view(), q.view(), 1e-9);

            let expected = belief.observation_probs(b.view(), 0).unwrap();
            let actual = psr.observation_probs(q.view(), 0).unwrap();
            assert_close(expected.view(), actual.view(), 1e-9);
        }
    }

    #[test]
    fn test_rewards_recovered() {
        let pomdp = tiger();
        let intents = search_intents(&pomdp, SearchStrategy::DepthFirst, None);
        let rpsr = RpsrModel::new(&pomdp, intents.as_slice(), None).unwrap();
        let recovered = rpsr.rewards_as_pomdp();
        for (x, y) in recovered.iter().zip(pomdp.expected_rewards().iter()) {
            assert!((x - y).abs() < 1e-9);
        }
        let (lo, hi) = rpsr.reward_range();
        assert!((lo + 100.0).abs() < 1e-9);
        assert!((hi - 10.0).abs() < 1e-9);

        let start = rpsr.start().to_owned();
        assert!((rpsr.expected_reward(start.view(), 0).unwrap() + 1.0).abs() < 1e-9);
        assert!((rpsr.expected_reward(start.view(), 1).unwrap() + 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_dependent_basis() {
        let pomdp = tiger();
        let basis = vec![Test::empty(), Interaction::new(1, 0).as_test(), Interaction::new(1, 1).as_test()];
        assert!(matches!(
            PsrModel::new(&pomdp, &basis, None),
            Err(RpsrError::NumericalError(_))
        ));
    }

    #[test]
    fn test_rejects_out_of_range_basis() {
        let pomdp = tiger();
        let basis = vec![Interaction::new(7, 0).as_test()];
        assert!(matches!(
            PsrModel::new(&pomdp, &basis, None),
            Err(RpsrError::InvalidAction { .. })
        ));
        assert!(matches!(
            PsrModel::new(&pomdp, &[], None),
            Err(RpsrError::EmptyInput(_))
        ));
    }

    #[test]
    fn test_impossible_observation() {
        let pomdp = tiger();
        let tests = search_tests(&pomdp, SearchStrategy::BreadthFirst, None);
        let psr = PsrModel::new(&pomdp, tests.as_slice(), None).unwrap();
        let zero = Array1::zeros(psr.rank());
        assert!(matches!(
            psr.dynamics(zero.view(), 0, 0),
            Err(RpsrError::ImpossibleObservation { .. })
        ));
        assert!(psr.dynamics(array![1.0].view(), 0, 0).is_err());
    }
}
