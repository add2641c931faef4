//! Name derivation and decision benchmarks.

use autoidx_bench::{auto_definition, generate_fields};
use autoidx_core::{decide, derive_auto_index_name, AutoIndexDefinition, IndexDefinition};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

/// Benchmark deriving a name from fields given in reverse order.
fn bench_derive_name(c: &mut Criterion) {
    let mut group = c.benchmark_group("derive_auto_index_name");

    for count in [1, 4, 16, 64].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let mut fields = generate_fields(count);
            fields.reverse();

            b.iter(|| {
                let name = derive_auto_index_name(black_box("Users"), black_box(&fields)).unwrap();
                black_box(name);
            });
        });
    }

    group.finish();
}

/// Benchmark the create decision against an equal existing definition.
fn bench_decide_equal(c: &mut Criterion) {
    let mut group = c.benchmark_group("decide_equal");

    for count in [1, 8, 32].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, &count| {
            let existing: IndexDefinition = auto_definition(count).into();
            let mut reordered = generate_fields(count);
            reordered.reverse();
            let candidate: IndexDefinition =
                AutoIndexDefinition::new("Users", reordered).unwrap().into();

            b.iter(|| {
                let decision = decide(black_box(&candidate), Some(black_box(&existing))).unwrap();
                black_box(decision);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_derive_name, bench_decide_equal);
criterion_main!(benches);
