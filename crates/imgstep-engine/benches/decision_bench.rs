//! Benchmarks for the scroll decision engine and snap corrector.
//!
//! Run with: cargo bench -p imgstep-engine

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use imgstep_engine::{DecisionEngine, SnapCorrector, ViewportState};
use imgstep_index::PositionIndex;
use std::hint::black_box;

const VIEWPORT: f64 = 900.0;

/// A gallery of `n` images, every fifth one taller than the viewport.
fn gallery(n: usize) -> PositionIndex<()> {
    let mut top = 0.0;
    let spans: Vec<(f64, f64)> = (0..n)
        .map(|i| {
            let height = if i % 5 == 0 { 2400.0 } else { 600.0 };
            let span = (top, top + height);
            top += height + 40.0;
            span
        })
        .collect();
    PositionIndex::from_spans(&spans)
}

fn document_height(index: &PositionIndex<()>) -> f64 {
    index.records().last().map_or(VIEWPORT, |record| record.bottom)
}

fn bench_next(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/next");
    let engine = DecisionEngine::default();

    for n in [10, 100, 1000] {
        let index = gallery(n);
        let height = document_height(&index);
        let viewport = ViewportState::new(height / 2.0, VIEWPORT, height);
        group.bench_with_input(BenchmarkId::new("mid_page", n), &index, |b, index| {
            b.iter(|| black_box(engine.next(index.records(), black_box(&viewport))))
        });
    }

    group.finish();
}

fn bench_previous_and_page_up(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/up");
    let engine = DecisionEngine::default();
    let index = gallery(500);
    let height = document_height(&index);
    let viewport = ViewportState::new(height * 0.75, VIEWPORT, height);

    group.bench_function("previous", |b| {
        b.iter(|| black_box(engine.previous(index.records(), black_box(&viewport))))
    });
    group.bench_function("page_up", |b| {
        b.iter(|| black_box(engine.page_up(index.records(), black_box(&viewport))))
    });

    group.finish();
}

fn bench_snap_staircase(c: &mut Criterion) {
    let mut group = c.benchmark_group("engine/snap");
    let corrector = SnapCorrector::default();

    for steps in [10, 100] {
        // Each image overlaps the one above it, so every snap moves up once more.
        let spans: Vec<(f64, f64)> = (0..steps)
            .map(|i| {
                let top = 1000.0 + 10.0 * i as f64;
                (top, top + 20.0)
            })
            .collect();
        let index = PositionIndex::from_spans(&spans);
        let start = 1000.0 + 10.0 * steps as f64 - 0.5;
        group.bench_with_input(BenchmarkId::new("staircase", steps), &index, |b, index| {
            b.iter(|| black_box(corrector.snap(black_box(start), index.records(), VIEWPORT)))
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_next,
    bench_previous_and_page_up,
    bench_snap_staircase
);
criterion_main!(benches);
