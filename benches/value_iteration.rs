//! Criterion benchmarks for basis search, model construction, pruning and
//! value iteration backups on the tiger problem and small random POMDPs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rpsr::model::{BeliefModel, RpsrModel};
use rpsr::pruning::prune;
use rpsr::search::{search_intents, SearchStrategy};
use rpsr::testing::{random_pomdp, tiger};
use rpsr::value_iteration::{init, ValueIteration};

fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_intents");
    let mut rng = StdRng::seed_from_u64(0);
    for states in [4, 8, 16] {
        let pomdp = random_pomdp(&mut rng, states, 2, 2);
        for strategy in [SearchStrategy::BreadthFirst, SearchStrategy::DepthFirst] {
            group.bench_with_input(
                BenchmarkId::new(format!("{:?}", strategy), states),
                &pomdp,
                |b, pomdp| b.iter(|| search_intents(black_box(pomdp), strategy, None)),
            );
        }
    }
    group.finish();
}

fn bench_model(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(1);
    let pomdp = random_pomdp(&mut rng, 16, 3, 3);
    let intents = search_intents(&pomdp, SearchStrategy::BreadthFirst, None);
    c.bench_function("rpsr_model_16_states", |b| {
        b.iter(|| RpsrModel::new(black_box(&pomdp), intents.as_slice(), None))
    });
}

fn bench_prune(c: &mut Criterion) {
    let mut group = c.benchmark_group("prune");
    let mut rng = StdRng::seed_from_u64(2);
    let witness = Array2::<f64>::eye(4);
    for count in [16, 64, 256] {
        let vectors: Vec<Array1<f64>> = (0..count)
            .map(|_| Array1::random_using(4, StandardNormal, &mut rng))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(count), &vectors, |b, vectors| {
            b.iter(|| prune(vectors.clone(), witness.view(), 1e-15))
        });
    }
    group.finish();
}

fn bench_backup(c: &mut Criterion) {
    let mut group = c.benchmark_group("tiger_backup");
    let pomdp = tiger();
    let model = BeliefModel::new(&pomdp);
    let mut vf = init(&model);
    for _ in 0..5 {
        vf = ValueIteration::IncrementalPruning
            .iterate(&model, &vf, 1e-15)
            .unwrap();
    }

    for strategy in [
        ValueIteration::Enumerate,
        ValueIteration::IncrementalPruning,
        ValueIteration::TrueIncrementalPruning,
    ] {
        group.bench_function(format!("{:?}", strategy), |b| {
            b.iter(|| strategy.iterate(black_box(&model), &vf, 1e-15))
        });
    }
    group.bench_function("IncrementalPruning_parallel", |b| {
        b.iter(|| ValueIteration::IncrementalPruning.par_iterate(black_box(&model), &vf, 1e-15))
    });
    group.finish();
}

criterion_group!(benches, bench_search, bench_model, bench_prune, bench_backup);
criterion_main!(benches);
