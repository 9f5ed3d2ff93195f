//! # Basis Search
//!
//! Grows a maximal set of traces with linearly independent outcome vectors.
//! Tests are searched for PSRs ([`search_tests`]), intents for RPSRs
//! ([`search_intents`]). Both strategies stop at a fixed point where no
//! extension of the basis is independent; they may return different bases,
//! all spanning the same outcome space.
//!
//! The basis grows by one dimension per accepted trace, so it never exceeds
//! the number of POMDP states.

pub mod psr;
pub mod rpsr;

use log::{debug, info};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

use crate::linalg::linearly_independent;
use crate::outcome::{Outcome, OutcomeCache};
use crate::pomdp::Pomdp;
use crate::trace::{Intents, Tests, Trace};

/// Traversal order of the basis search
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SearchStrategy {
    /// Extend every basis element level by level until a full scan adds nothing
    #[default]
    BreadthFirst,
    /// Extend a single branch as deep as it stays independent, then backtrack
    DepthFirst,
}

/// Result of a basis search, as persisted
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Basis {
    Tests(Tests),
    Intents(Intents),
}

impl Basis {
    pub fn len(&self) -> usize {
        match self {
            Basis::Tests(tests) => tests.len(),
            Basis::Intents(intents) => intents.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Search a PSR basis of tests
pub fn search_tests(pomdp: &Pomdp, strategy: SearchStrategy, rank_tolerance: Option<f64>) -> Tests {
    let mut builder = BasisBuilder::new(pomdp, rank_tolerance);
    match strategy {
        SearchStrategy::BreadthFirst => psr::breadth_first(&mut builder),
        SearchStrategy::DepthFirst => psr::depth_first(&mut builder),
    }
    info!(
        "{:?} PSR search over {} states found {} tests",
        strategy,
        pomdp.num_states(),
        builder.len()
    );
    Tests::new(builder.into_basis())
}

/// Search an RPSR basis of intents
pub fn search_intents(pomdp: &Pomdp, strategy: SearchStrategy, rank_tolerance: Option<f64>) -> Intents {
    let mut builder = BasisBuilder::new(pomdp, rank_tolerance);
    match strategy {
        SearchStrategy::BreadthFirst => rpsr::breadth_first(&mut builder),
        SearchStrategy::DepthFirst => rpsr::depth_first(&mut builder),
    }
    info!(
        "{:?} RPSR search over {} states found {} intents",
        strategy,
        pomdp.num_states(),
        builder.len()
    );
    Intents::new(builder.into_basis())
}

/// Basis under construction, with the independence oracle
pub struct BasisBuilder<'a, T> {
    cache: OutcomeCache<'a, T>,
    basis: Vec<T>,
    vectors: Vec<Array1<f64>>,
    rank_tolerance: Option<f64>,
}

impl<'a, T: Trace + Outcome> BasisBuilder<'a, T> {
    pub fn new(pomdp: &'a Pomdp, rank_tolerance: Option<f64>) -> Self {
        BasisBuilder {
            cache: OutcomeCache::new(pomdp),
            basis: Vec::new(),
            vectors: Vec::new(),
            rank_tolerance,
        }
    }

    pub fn pomdp(&self) -> &'a Pomdp {
        self.cache.pomdp()
    }

    /// Whether the basis already spans every state
    pub fn is_full(&self) -> bool {
        self.basis.len() >= self.pomdp().num_states()
    }

    /// Accept `trace` iff its outcome vector is independent of the basis
    pub fn try_add(&mut self, trace: T) -> bool {
        if self.is_full() || self.basis.contains(&trace) {
            return false;
        }

        let vector = self.cache.get(&trace).clone();
        let independent = linearly_independent(&self.vectors, vector.view(), self.rank_tolerance);
        debug!(
            "independence of {} against {} traces: {}",
            trace,
            self.basis.len(),
            independent
        );

        if independent {
            self.basis.push(trace);
            self.vectors.push(vector);
        }
        independent
    }

    pub fn basis(&self) -> &[T] {
        &self.basis
    }

    pub fn len(&self) -> usize {
        self.basis.len()
    }

    pub fn is_empty(&self) -> bool {
        self.basis.is_empty()
    }

    pub fn into_basis(self) -> Vec<T> {
        self.basis
    }
}
