//! Random generators and reference POMDPs for tests and benchmarks.

use ndarray::{array, Array1, Array3, Array4, Axis};
use ndarray_rand::RandomExt;
use rand::Rng;
use rand_distr::{StandardNormal, Uniform};

use crate::pomdp::{Pomdp, PomdpData};
use crate::trace::{Intent, Intents, Interaction, Test, Tests};
use crate::value_function::{Alpha, ValueFunction};

pub fn random_action<R: Rng + ?Sized>(rng: &mut R, num_actions: usize) -> usize {
    rng.gen_range(0..num_actions)
}

/// A random action or, with probability `1 / (num_actions + 1)`, none
pub fn random_extended_action<R: Rng + ?Sized>(rng: &mut R, num_actions: usize) -> Option<usize> {
    let action = rng.gen_range(0..=num_actions);
    (action < num_actions).then_some(action)
}

pub fn random_observation<R: Rng + ?Sized>(rng: &mut R, num_observations: usize) -> usize {
    rng.gen_range(0..num_observations)
}

pub fn random_interaction<R: Rng + ?Sized>(rng: &mut R, num_actions: usize, num_observations: usize) -> Interaction {
    Interaction::new(
        random_action(rng, num_actions),
        random_observation(rng, num_observations),
    )
}

pub fn random_test<R: Rng + ?Sized>(rng: &mut R, len: usize, num_actions: usize, num_observations: usize) -> Test {
    Test::new(
        (0..len)
            .map(|_| random_interaction(rng, num_actions, num_observations))
            .collect(),
    )
}

pub fn random_intent<R: Rng + ?Sized>(rng: &mut R, len: usize, num_actions: usize, num_observations: usize) -> Intent {
    let test = random_test(rng, len, num_actions, num_observations);
    Intent::new(test, random_extended_action(rng, num_actions))
}

/// Up to `count` tests (duplicates collapse) of length at most `max_len`
pub fn random_tests<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    max_len: usize,
    num_actions: usize,
    num_observations: usize,
) -> Tests {
    Tests::new(
        (0..count)
            .map(|_| {
                let len = rng.gen_range(0..=max_len);
                random_test(rng, len, num_actions, num_observations)
            })
            .collect(),
    )
}

/// Up to `count` intents (duplicates collapse) of length at most `max_len`
pub fn random_intents<R: Rng + ?Sized>(
    rng: &mut R,
    count: usize,
    max_len: usize,
    num_actions: usize,
    num_observations: usize,
) -> Intents {
    Intents::new(
        (0..count)
            .map(|_| {
                let len = rng.gen_range(0..=max_len);
                random_intent(rng, len, num_actions, num_observations)
            })
            .collect(),
    )
}

/// Alpha with a standard normal vector
pub fn random_alpha<R: Rng + ?Sized>(rng: &mut R, num_actions: usize, dim: usize) -> Alpha {
    let action = random_action(rng, num_actions);
    Alpha::new(action, Array1::random_using(dim, StandardNormal, rng))
}

pub fn random_value_function<R: Rng + ?Sized>(
    rng: &mut R,
    num_alphas: usize,
    num_actions: usize,
    dim: usize,
) -> ValueFunction {
    let alphas = (0..num_alphas).map(|_| random_alpha(rng, num_actions, dim)).collect();
    ValueFunction::new(alphas, 1)
}

/// POMDP with uniformly drawn distributions and standard normal rewards
pub fn random_pomdp<R: Rng + ?Sized>(
    rng: &mut R,
    num_states: usize,
    num_actions: usize,
    num_observations: usize,
) -> Pomdp {
    let weights = Uniform::new(0.05, 1.0);

    let mut transitions = Array3::random_using((num_states, num_actions, num_states), weights, rng);
    let totals = transitions.sum_axis(Axis(2)).insert_axis(Axis(2));
    transitions /= &totals;

    let shape = (num_states, num_actions, num_states, num_observations);
    let mut observations = Array4::random_using(shape, weights, rng);
    let totals = observations.sum_axis(Axis(3)).insert_axis(Axis(3));
    observations /= &totals;

    let rewards = Array4::random_using(shape, StandardNormal, rng);

    let mut start = Array1::random_using(num_states, weights, rng);
    let total = start.sum();
    start /= total;

    Pomdp::from_data_unchecked(PomdpData {
        transitions,
        observations,
        rewards,
        discount: 0.95,
        start,
    })
}

/// The tiger problem.
///
/// States: tiger behind the left (0) or right (1) door. Actions: listen (0),
/// open left (1), open right (2). Observations: growl left (0) or right (1),
/// heard correctly with probability 0.85 when listening and uniformly at
/// random after opening a door, which also resets the problem.
pub fn tiger() -> Pomdp {
    let (states, actions, observations) = (2, 3, 2);

    let mut t = Array3::zeros((states, actions, states));
    let mut o = Array4::zeros((states, actions, states, observations));
    let mut r = Array4::zeros((states, actions, states, observations));

    for s in 0..states {
        t[[s, 0, s]] = 1.0;
        for next in 0..states {
            t[[s, 1, next]] = 0.5;
            t[[s, 2, next]] = 0.5;

            for obs in 0..observations {
                o[[s, 0, next, obs]] = if obs == next { 0.85 } else { 0.15 };
                o[[s, 1, next, obs]] = 0.5;
                o[[s, 2, next, obs]] = 0.5;

                r[[s, 0, next, obs]] = -1.0;
                r[[s, 1, next, obs]] = if s == 0 { -100.0 } else { 10.0 };
                r[[s, 2, next, obs]] = if s == 1 { -100.0 } else { 10.0 };
            }
        }
    }

    Pomdp::from_data_unchecked(PomdpData {
        transitions: t,
        observations: o,
        rewards: r,
        discount: 0.95,
        start: array![0.5, 0.5],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::Trace;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_pomdp_is_valid() {
        let mut rng = StdRng::seed_from_u64(1);
        let pomdp = random_pomdp(&mut rng, 4, 3, 2);
        let data: PomdpData = pomdp.into();
        assert!(Pomdp::new(data.transitions, data.observations, data.rewards, data.discount, data.start).is_ok());
    }

    #[test]
    fn test_tiger_is_valid() {
        let data: PomdpData = tiger().into();
        assert!(Pomdp::new(data.transitions, data.observations, data.rewards, data.discount, data.start).is_ok());
    }

    #[test]
    fn test_random_traces_in_range() {
        let mut rng = StdRng::seed_from_u64(2);
        for intent in random_intents(&mut rng, 20, 4, 3, 2).iter() {
            assert!(intent.test.len() <= 4);
            assert!(intent.validate(3, 2).is_ok());
        }
        for test in random_tests(&mut rng, 20, 4, 3, 2).iter() {
            assert!(test.validate(3, 2).is_ok());
        }
    }

    #[test]
    fn test_extended_action_covers_sentinel() {
        let mut rng = StdRng::seed_from_u64(5);
        let draws: Vec<_> = (0..200).map(|_| random_extended_action(&mut rng, 2)).collect();
        assert!(draws.contains(&None));
        assert!(draws.contains(&Some(0)));
        assert!(draws.contains(&Some(1)));
    }
}
