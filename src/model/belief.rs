//! Uncompressed belief-state model.

use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, Axis};

use super::Model;
use crate::pomdp::Pomdp;

/// Belief over POMDP states, updated with Bayes' rule
#[derive(Clone, Debug)]
pub struct BeliefModel {
    identity: Array2<f64>,
    rewards: Array2<f64>,
    updates: Array4<f64>,
    normalizers: Array3<f64>,
    start: Array1<f64>,
    discount: f64,
}

impl BeliefModel {
    pub fn new(pomdp: &Pomdp) -> Self {
        let generative = &pomdp.operators().generative;

        // G[a, o, s', s] -> op[a, o, s, s'] so that `belief · op` is the next belief
        let updates = generative
            .view()
            .permuted_axes([0, 1, 3, 2])
            .as_standard_layout()
            .into_owned();
        let normalizers = generative.sum_axis(Axis(2));

        BeliefModel {
            identity: Array2::eye(pomdp.num_states()),
            rewards: pomdp.expected_rewards().clone(),
            updates,
            normalizers,
            start: pomdp.start().to_owned(),
            discount: pomdp.discount(),
        }
    }
}

impl Model for BeliefModel {
    fn rank(&self) -> usize {
        self.identity.nrows()
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
        self.identity.view()
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
