#![forbid(unsafe_code)]

//! Property tests for [`History`] invariants.
//!
//! Validates:
//! - Random capture/undo/redo sequences match a snapshot model exactly.
//! - Stream byte totals always equal the sum of their record sizes.
//! - Retention leaves either a stream within budget or a single group.
//! - Palette remaps and their inverse mappings compose to the identity.

use proptest::prelude::*;

use palimpsest_journal::{History, JournalConfig, inverse_mapping};
use palimpsest_raster::{Cel, ColorMode, Image, Layer, ObjectId, Registry, Sprite, Stock};

const WIDTH: usize = 16;
const HEIGHT: usize = 8;

// ============================================================================
// Strategy helpers
// ============================================================================

/// One horizontal run painted with a single value.
#[derive(Debug, Clone, Copy)]
struct Stroke {
    row: usize,
    x: usize,
    w: usize,
    value: u8,
}

#[derive(Debug, Clone)]
enum Op {
    Paint(Stroke),
    Group(Vec<Stroke>),
    Undo,
    Redo,
}

fn stroke_strategy() -> impl Strategy<Value = Stroke> {
    (0..HEIGHT, 0..WIDTH, 1..=WIDTH, any::<u8>()).prop_map(|(row, x, w, value)| Stroke {
        row,
        x,
        w: w.min(WIDTH - x),
        value,
    })
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => stroke_strategy().prop_map(Op::Paint),
        2 => prop::collection::vec(stroke_strategy(), 1..5).prop_map(Op::Group),
        2 => Just(Op::Undo),
        2 => Just(Op::Redo),
    ]
}

fn ops_strategy(max_len: usize) -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(op_strategy(), 1..=max_len)
}

fn permutation_strategy() -> impl Strategy<Value = [u8; 256]> {
    Just((0..=255u8).collect::<Vec<u8>>())
        .prop_shuffle()
        .prop_map(|table| {
            let mut mapping = [0u8; 256];
            mapping.copy_from_slice(&table);
            mapping
        })
}

fn paint(history: &mut History, reg: &mut Registry, image: ObjectId, s: Stroke) {
    history.capture_image(reg, image, s.x, s.row, s.w, 1).unwrap();
    reg.resolve_typed_mut::<Image>(image)
        .unwrap()
        .write_region(s.x, s.row, s.w, 1, &vec![s.value; s.w])
        .unwrap();
}

fn pixels(reg: &Registry, image: ObjectId) -> Vec<u8> {
    reg.resolve_typed::<Image>(image).unwrap().data().to_vec()
}

fn assert_byte_totals(history: &History) -> Result<(), TestCaseError> {
    let undo: usize = history
        .undo_stream()
        .iter()
        .map(|r| r.byte_size() as usize)
        .sum();
    let redo: usize = history
        .redo_stream()
        .iter()
        .map(|r| r.byte_size() as usize)
        .sum();
    prop_assert_eq!(undo, history.undo_bytes());
    prop_assert_eq!(redo, history.redo_bytes());
    prop_assert_eq!(undo + redo, history.memory_usage());
    Ok(())
}

// ============================================================================
// Invariant 1: Replay matches a snapshot model
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn random_sequences_match_snapshot_model(ops in ops_strategy(40)) {
        let mut reg = Registry::new();
        let image = reg.bind(Image::new(ColorMode::Indexed, WIDTH, HEIGHT));
        let mut history = History::new(JournalConfig::unlimited());

        let mut model_undo: Vec<Vec<u8>> = Vec::new();
        let mut model_redo: Vec<Vec<u8>> = Vec::new();

        for op in ops {
            match op {
                Op::Paint(stroke) => {
                    model_undo.push(pixels(&reg, image));
                    model_redo.clear();
                    paint(&mut history, &mut reg, image, stroke);
                }
                Op::Group(strokes) => {
                    model_undo.push(pixels(&reg, image));
                    model_redo.clear();
                    history.begin_group("group").unwrap();
                    for stroke in strokes {
                        paint(&mut history, &mut reg, image, stroke);
                    }
                    history.end_group().unwrap();
                }
                Op::Undo => match model_undo.pop() {
                    Some(expected) => {
                        model_redo.push(pixels(&reg, image));
                        prop_assert!(history.undo(&mut reg).unwrap().is_ok());
                        prop_assert_eq!(pixels(&reg, image), expected);
                    }
                    None => prop_assert!(history.undo(&mut reg).is_none()),
                },
                Op::Redo => match model_redo.pop() {
                    Some(expected) => {
                        model_undo.push(pixels(&reg, image));
                        prop_assert!(history.redo(&mut reg).unwrap().is_ok());
                        prop_assert_eq!(pixels(&reg, image), expected);
                    }
                    None => prop_assert!(history.redo(&mut reg).is_none()),
                },
            }
            prop_assert_eq!(history.can_undo(), !model_undo.is_empty());
            prop_assert_eq!(history.can_redo(), !model_redo.is_empty());
            assert_byte_totals(&history)?;
        }
    }
}

// ============================================================================
// Invariant 2: Full undo then full redo round-trips
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn undo_all_then_redo_all_round_trips(
        strokes in prop::collection::vec(stroke_strategy(), 1..30)
    ) {
        let mut reg = Registry::new();
        let image = reg.bind(Image::new(ColorMode::Indexed, WIDTH, HEIGHT));
        let mut history = History::new(JournalConfig::unlimited());
        for stroke in strokes {
            paint(&mut history, &mut reg, image, stroke);
        }
        let painted = pixels(&reg, image);
        let edits = history.edit_count();

        while let Some(step) = history.undo(&mut reg) {
            prop_assert!(step.is_ok());
        }
        prop_assert!(pixels(&reg, image).iter().all(|&px| px == 0));
        prop_assert_eq!(history.edit_count(), 0);

        while let Some(step) = history.redo(&mut reg) {
            prop_assert!(step.is_ok());
        }
        prop_assert_eq!(pixels(&reg, image), painted);
        prop_assert_eq!(history.edit_count(), edits);
    }
}

// ============================================================================
// Invariant 3: Retention respects the budget or keeps one group
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn retention_keeps_budget_or_single_group(
        budget in 40usize..400,
        groups in prop::collection::vec(prop::collection::vec(stroke_strategy(), 1..4), 1..12)
    ) {
        let mut reg = Registry::new();
        let image = reg.bind(Image::new(ColorMode::Indexed, WIDTH, HEIGHT));
        let mut history = History::new(JournalConfig::new(budget));

        for strokes in groups {
            history.begin_group("g").unwrap();
            for stroke in strokes {
                paint(&mut history, &mut reg, image, stroke);
            }
            history.end_group().unwrap();

            let live_groups = history.undo_labels(usize::MAX).len();
            prop_assert!(live_groups >= 1);
            prop_assert!(history.undo_bytes() <= budget || live_groups == 1);
            prop_assert!(!history.can_redo());
            assert_byte_totals(&history)?;
        }
    }
}

// ============================================================================
// Invariant 4: Palette remaps are invertible
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn inverse_mapping_composes_to_identity(mapping in permutation_strategy()) {
        let inverse = inverse_mapping(&mapping);
        for c in 0..=255u8 {
            prop_assert_eq!(inverse[usize::from(mapping[usize::from(c)])], c);
            prop_assert_eq!(mapping[usize::from(inverse[usize::from(c)])], c);
        }
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn remap_undo_restores_every_index(mapping in permutation_strategy()) {
        let mut reg = Registry::new();
        let sprite = reg.create_sprite(ColorMode::Indexed, 16, 16);
        let (root, stock) = {
            let s = reg.resolve_typed::<Sprite>(sprite).unwrap();
            (s.root(), s.stock())
        };
        let layer = reg.add_layer(root, Layer::new_image(sprite, "ink")).unwrap();
        let data: Vec<u8> = (0..=255u8).collect();
        let image = reg
            .bind(Image::from_raw(ColorMode::Indexed, 16, 16, data.clone()).unwrap());
        let slot = reg.resolve_typed_mut::<Stock>(stock).unwrap().add_image(image);
        reg.add_cel(layer, Cel::new(0, slot as u16)).unwrap();

        let mut history = History::default();
        history.capture_remap_palette(&reg, sprite, 0, 0, &mapping).unwrap();
        reg.remap_images(sprite, 0, 0, &mapping).unwrap();
        let remapped: Vec<u8> = data.iter().map(|&c| mapping[usize::from(c)]).collect();
        prop_assert_eq!(pixels(&reg, image), remapped.clone());

        history.undo(&mut reg).unwrap().unwrap();
        prop_assert_eq!(pixels(&reg, image), data);

        history.redo(&mut reg).unwrap().unwrap();
        prop_assert_eq!(pixels(&reg, image), remapped);
    }
}
