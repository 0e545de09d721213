//! Criterion microbenches for the scoring hot path.
//!
//! - full rescan vs incremental update after one cut
//! - rectangle averages through the summed-area table

use std::sync::Arc;

use blockpaint::prelude::*;
use blockpaint::scoring::{raw_similarity, rect_error};
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

fn noise(size: u32, seed: u64) -> Arc<TargetImage> {
    let mut rng = StdRng::seed_from_u64(seed);
    let pixels = (0..size * size)
        .map(|_| Color::new(rng.gen(), rng.gen(), rng.gen(), 255))
        .collect();
    Arc::new(TargetImage::from_pixels(size, size, pixels).unwrap())
}

fn bench_similarity(c: &mut Criterion) {
    let mut group = c.benchmark_group("similarity");
    for size in [100u32, 400] {
        let target = noise(size, 42);
        let canvas = Canvas::new(size, size, Color::WHITE);
        group.bench_function(BenchmarkId::new("full_rescan", size), |b| {
            b.iter(|| raw_similarity(&target, &canvas))
        });
        group.bench_function(BenchmarkId::new("apply_point_cut", size), |b| {
            b.iter_batched(
                || ProgramState::new(Arc::clone(&target)),
                |state| {
                    let mid = Point::new(size as i32 / 2, size as i32 / 2);
                    state
                        .apply(Move::PointCut {
                            block: BlockId::root(0),
                            point: mid,
                        })
                        .unwrap()
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

fn bench_rectangles(c: &mut Criterion) {
    let mut group = c.benchmark_group("rectangles");
    let target = noise(400, 7);
    let shape = Shape::new(37, 51, 301, 388);
    group.bench_function(BenchmarkId::new("average", "264x337"), |b| {
        b.iter(|| target.average(&shape))
    });
    group.bench_function(BenchmarkId::new("rect_error", "264x337"), |b| {
        b.iter(|| rect_error(&target, &shape, Color::BLACK))
    });
    group.finish();
}

criterion_group!(benches, bench_similarity, bench_rectangles);
criterion_main!(benches);
