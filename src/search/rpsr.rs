//! Intent search for RPSR bases.

use super::BasisBuilder;
use crate::trace::{interactions, Intent, Test, Trace};

/// The pure prediction followed by one reward query per action
fn reward_queries(num_actions: usize) -> impl Iterator<Item = Option<usize>> {
    std::iter::once(None).chain((0..num_actions).map(Some))
}

/// Seed with `(ε, z)` for every reward query `z`, then extend each basis
/// intent by every interaction until a full scan adds nothing.
pub fn breadth_first(builder: &mut BasisBuilder<'_, Intent>) {
    let pomdp = builder.pomdp();
    let (num_actions, num_observations) = (pomdp.num_actions(), pomdp.num_observations());

    for query in reward_queries(num_actions) {
        builder.try_add(Intent::new(Test::empty(), query));
    }

    loop {
        let snapshot = builder.basis().to_vec();
        let mut added = false;
        for intent in &snapshot {
            for interaction in interactions(num_actions, num_observations) {
                added |= builder.try_add(intent.prepend(interaction));
            }
        }
        if !added || builder.is_full() {
            break;
        }
    }
}

/// Try every reward query at the empty test; each accepted intent sends the
/// search down every one-interaction extension of its test.
pub fn depth_first(builder: &mut BasisBuilder<'_, Intent>) {
    descend(builder, &Test::empty());
}

fn descend(builder: &mut BasisBuilder<'_, Intent>, test: &Test) {
    let pomdp = builder.pomdp();
    let (num_actions, num_observations) = (pomdp.num_actions(), pomdp.num_observations());

    for query in reward_queries(num_actions) {
        if builder.try_add(Intent::new(test.clone(), query)) {
            for interaction in interactions(num_actions, num_observations) {
                descend(builder, &test.prepend(interaction));
            }
        }
    }
}
