//! # Symbolic Traces
//!
//! Value types describing future interaction sequences:
//!
//! - [`Interaction`]: one (action, observation) pair
//! - [`Test`]: an ordered sequence of interactions, read left to right as
//!   "next" to "last"
//! - [`Intent`]: a test paired with an optional trailing action whose
//!   expected immediate reward is queried
//! - [`Tests`] / [`Intents`]: duplicate-free collections, the result of a
//!   basis search
//!
//! All of them are immutable; `prepend` returns a new value.

use std::collections::HashSet;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::{Result, RpsrError};

/// One action followed by one observation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Interaction {
    pub action: usize,
    pub observation: usize,
}

impl Interaction {
    pub fn new(action: usize, observation: usize) -> Self {
        Interaction { action, observation }
    }

    /// The single-interaction test
    pub fn as_test(self) -> Test {
        Test {
            interactions: vec![self],
        }
    }
}

impl fmt::Display for Interaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "a{}o{}", self.action, self.observation)
    }
}

/// Every interaction of a model, action-major
pub fn interactions(num_actions: usize, num_observations: usize) -> impl Iterator<Item = Interaction> {
    (0..num_actions).flat_map(move |a| (0..num_observations).map(move |o| Interaction::new(a, o)))
}

/// Ordered sequence of interactions
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Test {
    interactions: Vec<Interaction>,
}

impl Test {
    pub fn new(interactions: Vec<Interaction>) -> Self {
        Test { interactions }
    }

    pub fn empty() -> Self {
        Test::default()
    }

    pub fn interactions(&self) -> &[Interaction] {
        &self.interactions
    }

    pub fn len(&self) -> usize {
        self.interactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interactions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Interaction> {
        self.interactions.iter()
    }
}

impl fmt::Display for Test {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.interactions.is_empty() {
            return write!(f, "ε");
        }
        for (i, interaction) in self.interactions.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{}", interaction)?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Test {
    type Item = &'a Interaction;
    type IntoIter = std::slice::Iter<'a, Interaction>;

    fn into_iter(self) -> Self::IntoIter {
        self.interactions.iter()
    }
}

/// A test followed by an optional reward query.
///
/// `action == None` is a pure prediction; `Some(a)` asks for the expected
/// immediate reward of taking `a` after the test succeeds.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Intent {
    pub test: Test,
    pub action: Option<usize>,
}

impl Intent {
    pub fn new(test: Test, action: Option<usize>) -> Self {
        Intent { test, action }
    }

    /// Pure prediction of `test`
    pub fn test_only(test: Test) -> Self {
        Intent { test, action: None }
    }

    /// Immediate reward query for `action`
    pub fn action_only(action: usize) -> Self {
        Intent {
            test: Test::empty(),
            action: Some(action),
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.action {
            Some(action) => write!(f, "{} r{}", self.test, action),
            None => write!(f, "{}", self.test),
        }
    }
}

/// Structural operations shared by tests and intents
pub trait Trace: Clone + Eq + Hash + fmt::Debug + fmt::Display + Send + Sync {
    /// New trace with `interaction` in front
    fn prepend(&self, interaction: Interaction) -> Self;

    /// Trace whose compressed outcome normalizes the belief update for `interaction`
    fn normalizer(interaction: Interaction) -> Self;

    fn test(&self) -> &Test;

    /// Action whose reward is queried at the end of the trace
    fn reward_action(&self) -> Option<usize>;

    /// Fails if any index falls outside the model's spaces
    fn validate(&self, num_actions: usize, num_observations: usize) -> Result<()> {
        for interaction in self.test() {
            RpsrError::check_action(interaction.action, num_actions)?;
            if interaction.observation >= num_observations {
                return Err(RpsrError::invalid_parameter(
                    "observation".to_string(),
                    format!(
                        "{} in trace {} must be less than {}",
                        interaction.observation, self, num_observations
                    ),
                ));
            }
        }
        if let Some(action) = self.reward_action() {
            RpsrError::check_action(action, num_actions)?;
        }
        Ok(())
    }
}

impl Trace for Test {
    fn prepend(&self, interaction: Interaction) -> Self {
        let mut interactions = Vec::with_capacity(self.interactions.len() + 1);
        interactions.push(interaction);
        interactions.extend_from_slice(&self.interactions);
        Test { interactions }
    }

    fn normalizer(interaction: Interaction) -> Self {
        interaction.as_test()
    }

    fn test(&self) -> &Test {
        self
    }

    fn reward_action(&self) -> Option<usize> {
        None
    }
}

impl Trace for Intent {
    fn prepend(&self, interaction: Interaction) -> Self {
        Intent {
            test: self.test.prepend(interaction),
            action: self.action,
        }
    }

    fn normalizer(interaction: Interaction) -> Self {
        Intent::test_only(interaction.as_test())
    }

    fn test(&self) -> &Test {
        &self.test
    }

    fn reward_action(&self) -> Option<usize> {
        self.action
    }
}

fn dedup<T: Clone + Eq + Hash>(items: Vec<T>) -> Vec<T> {
    let mut seen = HashSet::with_capacity(items.len());
    items.into_iter().filter(|item| seen.insert(item.clone())).collect()
}

fn same_set<T: Eq + Hash>(a: &[T], b: &[T]) -> bool {
    a.len() == b.len() && a.iter().collect::<HashSet<_>>() == b.iter().collect::<HashSet<_>>()
}

macro_rules! trace_collection {
    ($name:ident, $item:ty, $field:ident) => {
        /// Duplicate-free collection; equality ignores order, iteration keeps
        /// insertion order so a reloaded basis rebuilds identical operators.
        #[derive(Clone, Debug, Default, Serialize, Deserialize)]
        pub struct $name {
            $field: Vec<$item>,
        }

        impl $name {
            pub fn new(items: Vec<$item>) -> Self {
                $name { $field: dedup(items) }
            }

            pub fn len(&self) -> usize {
                self.$field.len()
            }

            pub fn is_empty(&self) -> bool {
                self.$field.is_empty()
            }

            pub fn iter(&self) -> std::slice::Iter<'_, $item> {
                self.$field.iter()
            }

            pub fn as_slice(&self) -> &[$item] {
                &self.$field
            }

            pub fn contains(&self, item: &$item) -> bool {
                self.$field.contains(item)
            }
        }

        impl PartialEq for $name {
            fn eq(&self, other: &Self) -> bool {
                same_set(&self.$field, &other.$field)
            }
        }

        impl Eq for $name {}

        impl From<Vec<$item>> for $name {
            fn from(items: Vec<$item>) -> Self {
                $name::new(items)
            }
        }

        impl<'a> IntoIterator for &'a $name {
            type Item = &'a $item;
            type IntoIter = std::slice::Iter<'a, $item>;

            fn into_iter(self) -> Self::IntoIter {
                self.$field.iter()
            }
        }
    };
}

trace_collection!(Tests, Test, tests);
trace_collection!(Intents, Intent, intents);
