mod common;

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use infinite_track::prelude::*;

fn generator(platforms: usize, horizon: f32) -> TrackGenerator {
    let config = GeneratorConfig::new(horizon, -20.0).with_seed(42);
    TrackGenerator::try_new(config, common::make_catalog(platforms)).unwrap()
}

fn spawn_run_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/spawn_run");

    for &horizon in &[100.0f32, 400.0, 1600.0] {
        group.bench_with_input(
            BenchmarkId::from_parameter(horizon as u32),
            &horizon,
            |b, &horizon| {
                b.iter_batched(
                    || generator(8, horizon),
                    |mut g| black_box(g.spawn_run(true)),
                    BatchSize::SmallInput,
                );
            },
        );
    }

    group.finish();
}

fn move_objects_benches(c: &mut Criterion) {
    let mut group = c.benchmark_group("generator/move_objects");

    for &steps in &[60usize, 600] {
        group.throughput(common::elements_throughput(steps));

        group.bench_with_input(BenchmarkId::new("steady", steps), &steps, |b, &steps| {
            let mut g = generator(8, 200.0);
            g.start_game();
            let mut player = PlayerPose::default();
            b.iter(|| {
                for _ in 0..steps {
                    g.move_objects(0.5, &mut player, &mut ());
                }
                black_box(g.pool().in_use());
            });
        });
    }

    group.bench_function("reset_cycle", |b| {
        let mut g = generator(8, 200.0);
        g.start_game();
        b.iter(|| {
            g.reset();
            g.ready_from_reset();
            black_box(g.pool().total_instances());
        });
    });

    group.finish();
}

criterion_group! {
    name = benches;
    config = common::default_criterion();
    targets = spawn_run_benches, move_objects_benches
}
criterion_main!(benches);
