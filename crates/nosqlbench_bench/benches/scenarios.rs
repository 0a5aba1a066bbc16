//! Contended scenario benchmarks.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use nosqlbench_testkit::{
    counter_race, memory_db, transfer_race, CounterConfig, DeltaMode, TransferConfig,
};

/// Benchmark the counter race at increasing contention.
fn bench_counter_race(c: &mut Criterion) {
    let mut group = c.benchmark_group("counter_race");
    group.sample_size(10);

    for threads in [1, 4, 16].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            threads,
            |b, &threads| {
                let config = CounterConfig::new()
                    .threads(threads)
                    .repeat(100)
                    .delta_mode(DeltaMode::Increment);

                b.iter(|| counter_race(memory_db(), &config).unwrap());
            },
        );
    }
    group.finish();
}

/// Benchmark the transfer race until every account settles.
fn bench_transfer_race(c: &mut Criterion) {
    let mut group = c.benchmark_group("transfer_race");
    group.sample_size(10);

    for threads in [1, 4, 16].iter() {
        group.bench_with_input(
            BenchmarkId::from_parameter(threads),
            threads,
            |b, &threads| {
                let config = TransferConfig::new().threads(threads).entities(20).ceiling(10);

                b.iter(|| transfer_race(memory_db(), &config).unwrap());
            },
        );
    }
    group.finish();
}

criterion_group!(benches, bench_counter_race, bench_transfer_race);

criterion_main!(benches);
