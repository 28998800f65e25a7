//! Canvas engine benchmarks

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use dayink_lib::geometry::{Point, Rect};
use dayink_lib::input::{RawPoint, StrokeEngine};
use dayink_lib::render::LayerManager;
use dayink_lib::spatial::{FlatIndex, QuadTree, SpatialIndex};
use dayink_lib::stroke::{Stroke, StrokeRef};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn generate_samples(count: usize) -> Vec<RawPoint> {
    (0..count)
        .map(|i| {
            let t = i as f32 / count as f32;
            RawPoint::at(
                0.05 + t * 0.9,
                (t * std::f32::consts::PI * 4.0).sin() * 0.1 + 0.5,
                i as u64,
            )
        })
        .collect()
}

/// Short scribbles scattered over the page
fn generate_strokes(count: usize, seed: u64) -> Vec<StrokeRef> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .filter_map(|_| {
            let start = Point::new(rng.gen_range(0.0..0.95), rng.gen_range(0.0..0.95));
            let points = (0..8)
                .map(|i| {
                    Point::new(
                        start.x + i as f32 * 0.005,
                        start.y + rng.gen_range(0.0..0.04),
                    )
                })
                .collect();
            Stroke::with_points(points).map(Stroke::into_ref)
        })
        .collect()
}

fn benchmark_index_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("Index Query");
    let range = Rect::new(0.4, 0.4, 0.45, 0.45);

    for count in [100, 1000, 5000].iter() {
        let strokes = generate_strokes(*count, 7);
        let mut tree = QuadTree::new();
        let mut flat = FlatIndex::new();
        tree.rebuild(&strokes);
        flat.rebuild(&strokes);

        group.bench_with_input(BenchmarkId::new("quadtree", count), &range, |b, range| {
            b.iter(|| tree.query(range))
        });
        group.bench_with_input(BenchmarkId::new("flat", count), &range, |b, range| {
            b.iter(|| flat.query(range))
        });
    }

    group.finish();
}

fn benchmark_smoothing(c: &mut Criterion) {
    let mut group = c.benchmark_group("Smoothing");

    for count in [10, 100, 1000].iter() {
        let samples = generate_samples(*count);
        group.bench_with_input(BenchmarkId::new("process", count), &samples, |b, samples| {
            b.iter(|| {
                let mut engine = StrokeEngine::new();
                engine.start(samples[0]);
                for chunk in samples[1..].chunks(4) {
                    engine.process(chunk);
                }
                engine.finalize()
            })
        });
    }

    group.finish();
}

fn benchmark_restore(c: &mut Criterion) {
    let mut group = c.benchmark_group("Restore");
    group.sample_size(10);

    let strokes = generate_strokes(500, 11);
    for dim in [512u32, 1024].iter() {
        let mut layers = match LayerManager::new(*dim) {
            Ok(layers) => layers,
            Err(_) => continue,
        };
        group.bench_function(BenchmarkId::new("restore_from_paths", dim), |b| {
            b.iter(|| layers.restore_from_paths(&strokes))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    benchmark_index_query,
    benchmark_smoothing,
    benchmark_restore
);
criterion_main!(benches);
