//! Benchmarks for journal capture and replay.
//!
//! Measures the cost of capturing sparse pixel diffs versus whole-region
//! patches, and of undoing and redoing a stroke group, on a 256x256 RGB
//! image.
//!
//! Run with: cargo bench -p palimpsest-journal --bench journal_bench
//!
//! | Scenario               | Captured bytes       |
//! |------------------------|----------------------|
//! | Dirty, 1% of pixels    | ~4 bytes per pixel   |
//! | Region, full image     | 256 KiB              |
//! | Undo/redo, 64 strokes  | replays 66 records   |

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use palimpsest_journal::{History, JournalConfig};
use palimpsest_raster::{ColorMode, Dirty, Image, ObjectId, Registry};

const SIZE: usize = 256;

// ============================================================================
// Setup helpers
// ============================================================================

fn setup() -> (Registry, ObjectId) {
    let mut reg = Registry::new();
    let image = reg.bind(Image::new(ColorMode::Rgb, SIZE, SIZE));
    (reg, image)
}

/// A diff touching every `step`-th pixel along the diagonal band.
fn sparse_dirty(step: usize) -> Dirty {
    let mut dirty = Dirty::new(ColorMode::Rgb, 0, 0, 0, 0);
    for y in (0..SIZE).step_by(step) {
        dirty.add_run(y, y, step.min(SIZE - y));
    }
    dirty
}

// ============================================================================
// Capture
// ============================================================================

fn bench_capture_dirty(c: &mut Criterion) {
    let mut group = c.benchmark_group("journal/capture_dirty");
    for step in [2usize, 8, 32] {
        let (reg, image) = setup();
        let dirty = sparse_dirty(step);
        group.bench_with_input(BenchmarkId::from_parameter(step), &dirty, |b, dirty| {
            b.iter(|| {
                let mut history = History::new(JournalConfig::unlimited());
                history.capture_dirty(&reg, image, dirty).unwrap();
                black_box(history.undo_bytes())
            });
        });
    }
    group.finish();
}

fn bench_capture_region(c: &mut Criterion) {
    let (reg, image) = setup();
    c.bench_function("journal/capture_region_full", |b| {
        b.iter(|| {
            let mut history = History::new(JournalConfig::unlimited());
            history.capture_image(&reg, image, 0, 0, SIZE, SIZE).unwrap();
            black_box(history.undo_bytes())
        });
    });
}

// ============================================================================
// Replay
// ============================================================================

fn bench_undo_redo_group(c: &mut Criterion) {
    let (mut reg, image) = setup();
    let mut history = History::new(JournalConfig::unlimited());
    history.begin_group("stroke").unwrap();
    for i in 0..64 {
        history.capture_image(&reg, image, i, i, 16, 1).unwrap();
        reg.resolve_typed_mut::<Image>(image)
            .unwrap()
            .put_pixel(i, i, 0xFF00_FFFF)
            .unwrap();
    }
    history.end_group().unwrap();

    c.bench_function("journal/undo_redo_64_strokes", |b| {
        b.iter(|| {
            history.undo(&mut reg).unwrap().unwrap();
            history.redo(&mut reg).unwrap().unwrap();
            black_box(history.edit_count())
        });
    });
}

criterion_group!(
    benches,
    bench_capture_dirty,
    bench_capture_region,
    bench_undo_redo_group,
);
criterion_main!(benches);
