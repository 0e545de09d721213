//! End-to-end pipeline timings on a synthetic 200x200 target.

use std::sync::Arc;

use blockpaint::prelude::*;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};

fn scene() -> Arc<TargetImage> {
    let panels = [
        (Shape::new(20, 30, 90, 170), Color::new(190, 40, 40, 255)),
        (Shape::new(110, 120, 180, 150), Color::new(40, 60, 200, 255)),
        (Shape::new(120, 20, 170, 80), Color::new(240, 200, 40, 255)),
    ];
    let pixels = (0..200)
        .flat_map(|y| (0..200).map(move |x| Point::new(x, y)))
        .map(|p| {
            panels
                .iter()
                .find(|(s, _)| s.contains(p))
                .map_or(Color::new(30, 30, 40, 255), |(_, c)| *c)
        })
        .collect();
    Arc::new(TargetImage::from_pixels(200, 200, pixels).unwrap())
}

fn bench_pipelines(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipelines");
    group.sample_size(10);
    let target = scene();
    let params = SolverParams::default();
    for kind in PipelineKind::ALL {
        group.bench_function(BenchmarkId::new("solve", kind), |b| {
            b.iter(|| solve(kind, &params, Arc::clone(&target), None).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_pipelines);
criterion_main!(benches);
