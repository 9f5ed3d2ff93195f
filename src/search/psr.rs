//! Test search for PSR bases.

use super::BasisBuilder;
use crate::trace::{interactions, Test, Trace};

/// Seed with every one-interaction test, then extend each basis test by
/// every interaction until a full scan adds nothing.
pub fn breadth_first(builder: &mut BasisBuilder<'_, Test>) {
    let pomdp = builder.pomdp();
    let (num_actions, num_observations) = (pomdp.num_actions(), pomdp.num_observations());

    for interaction in interactions(num_actions, num_observations) {
        builder.try_add(interaction.as_test());
    }

    loop {
        let snapshot = builder.basis().to_vec();
        let mut added = false;
        for test in &snapshot {
            for interaction in interactions(num_actions, num_observations) {
                added |= builder.try_add(test.prepend(interaction));
            }
        }
        if !added || builder.is_full() {
            break;
        }
    }
}

/// Extend the empty test recursively, descending into each accepted test.
pub fn depth_first(builder: &mut BasisBuilder<'_, Test>) {
    descend(builder, &Test::empty());
}

fn descend(builder: &mut BasisBuilder<'_, Test>, test: &Test) {
    let pomdp = builder.pomdp();
    for interaction in interactions(pomdp.num_actions(), pomdp.num_observations()) {
        let extended = test.prepend(interaction);
        if builder.try_add(extended.clone()) {
            descend(builder, &extended);
        }
    }
}
