//! Benchmarks for single and batched proximity queries.
//!
//! Run with: `cargo bench --bench spatial_query`

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use ringhash::prelude::*;

const EXTENT: f32 = 256.0;

fn populated(count: usize, radius_cells: u32) -> (SpatialHash, Vec<Vec2>) {
    let mut rng = StdRng::seed_from_u64(1);
    let entries: Vec<Entry> = (0..count)
        .map(|i| {
            Entry::new(
                i as u32,
                Vec2::new(rng.gen_range(0.0..EXTENT), rng.gen_range(0.0..EXTENT)),
            )
        })
        .collect();
    let queries = (0..256)
        .map(|_| Vec2::new(rng.gen_range(0.0..EXTENT), rng.gen_range(0.0..EXTENT)))
        .collect();

    let config = SpatialConfig::new(8, 1.0);
    let mut hash = SpatialHash::new(config, &RawGeometry::generate(radius_cells).unwrap()).unwrap();
    hash.initialize(&entries);
    (hash, queries)
}

fn bench_single_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    for count in [10_000usize, 100_000] {
        let (mut hash, queries) = populated(count, 4);
        for max_count in [5usize, 50] {
            group.bench_with_input(
                BenchmarkId::new(format!("k{}", max_count), count),
                &max_count,
                |b, &max_count| {
                    let mut i = 0;
                    b.iter(|| {
                        let position = queries[i % queries.len()];
                        i += 1;
                        black_box(hash.search(position, 3.0, max_count).len())
                    })
                },
            );
        }
    }

    group.finish();
}

fn bench_bulk_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search_bulk");
    let (mut hash, queries) = populated(100_000, 4);

    for batch in [16usize, 256] {
        group.bench_with_input(BenchmarkId::from_parameter(batch), &batch, |b, &batch| {
            b.iter(|| black_box(hash.search_bulk(&queries[..batch], 3.0, 8).neighbors().len()))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_single_search, bench_bulk_search);
criterion_main!(benches);
