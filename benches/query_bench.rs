//! Benchmarks for the analytics query operations
//!
//! Run with: cargo bench

use analytics_dashboard::query::AnalyticsFilter;
use analytics_dashboard::storage::*;
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn seeded_store(count: usize) -> EventStore {
    let store = EventStore::open_in_memory().unwrap();
    seed_store(&store, count, 42).unwrap();
    store
}

fn bench_queries(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    let store = seeded_store(DEFAULT_SEED_COUNT);

    let all = EventPredicate::default();
    let filtered = EventPredicate::new()
        .start(1_711_929_600_000) // 2024-04-01
        .end(1_719_791_999_999) // 2024-06-30
        .region("Europe");

    group.throughput(Throughput::Elements(DEFAULT_SEED_COUNT as u64));

    group.bench_function("aggregate_all", |b| {
        b.iter(|| store.aggregate(black_box(&all)).unwrap())
    });

    group.bench_function("aggregate_filtered", |b| {
        b.iter(|| store.aggregate(black_box(&filtered)).unwrap())
    });

    for interval in [BucketInterval::Day, BucketInterval::Hour] {
        group.bench_function(format!("chart_{}", interval), |b| {
            b.iter(|| store.chart(black_box(&all), interval).unwrap())
        });
    }

    group.bench_function("page_first", |b| {
        b.iter(|| store.page(black_box(&all), 0, 20).unwrap())
    });

    group.bench_function("page_deep", |b| {
        b.iter(|| store.page(black_box(&all), 9_000, 100).unwrap())
    });

    group.finish();
}

fn bench_ingest(c: &mut Criterion) {
    let mut group = c.benchmark_group("ingest");

    for size in [100, 1000] {
        group.throughput(Throughput::Elements(size as u64));
        group.bench_function(format!("insert_batch_{}", size), |b| {
            let store = EventStore::open_in_memory().unwrap();
            b.iter_batched(
                || {
                    let mut rng = StdRng::seed_from_u64(size as u64);
                    generate_events(size, &mut rng)
                },
                |events| store.insert_batch(events).unwrap(),
                criterion::BatchSize::SmallInput,
            )
        });
    }

    group.finish();
}

fn bench_filter_parse(c: &mut Criterion) {
    let params: HashMap<String, String> = [
        ("startDate", "2024-01-01T00:00:00Z"),
        ("endDate", "2024-12-31T23:59:59Z"),
        ("region", "Europe"),
        ("page", "3"),
        ("limit", "50"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    c.bench_function("filter_from_params", |b| {
        b.iter(|| AnalyticsFilter::from_params(black_box(&params)).unwrap())
    });
}

criterion_group!(benches, bench_queries, bench_ingest, bench_filter_parse);
criterion_main!(benches);
