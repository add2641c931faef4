//! Catalog lookup benchmarks.

use autoidx_bench::{catalog_id, catalog_name, populated_catalog};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

/// Benchmark lookups by identifier.
fn bench_lookup_by_id(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_lookup_by_id");

    for size in [16, 256, 4096].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let catalog = populated_catalog(size);
            let mut i = 0usize;

            b.iter(|| {
                let index = catalog.try_get_by_id(black_box(catalog_id(i % size)));
                black_box(index);
                i += 1;
            });
        });
    }

    group.finish();
}

/// Benchmark case-insensitive lookups by name.
fn bench_lookup_by_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_lookup_by_name");

    for size in [16, 256, 4096].iter() {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let catalog = populated_catalog(size);
            let names: Vec<String> = (0..size).map(|i| catalog_name(i).to_uppercase()).collect();
            let mut i = 0usize;

            b.iter(|| {
                let index = catalog.try_get_by_name(black_box(&names[i % size]));
                black_box(index);
                i += 1;
            });
        });
    }

    group.finish();
}

/// Benchmark taking a sorted snapshot of the whole catalog.
fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("catalog_snapshot");

    for size in [16, 256, 4096].iter() {
        group.throughput(Throughput::Elements(*size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            let catalog = populated_catalog(size);

            b.iter(|| {
                black_box(catalog.snapshot());
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lookup_by_id, bench_lookup_by_name, bench_snapshot);
criterion_main!(benches);
