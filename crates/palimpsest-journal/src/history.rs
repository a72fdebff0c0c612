#![forbid(unsafe_code)]

//! The undo/redo history.
//!
//! [`History`] owns two [`Stream`]s. Calling code captures the pre-mutation
//! state of an object with one of the `capture_*` methods and then mutates
//! the object itself. [`History::undo`] pops records from the undo stream and
//! inverts them; every invert captures the state it is about to overwrite
//! into the redo stream, which is what [`History::redo`] replays later.
//!
//! # Invariants
//!
//! 1. Both streams' byte totals equal the sum of their records' sizes.
//! 2. Undo and redo stop only at a balanced group boundary, or when the
//!    source stream runs out.
//! 3. Any capture clears the redo stream.
//! 4. Retention never splits a group and never drops the newest group.
//!
//! # Retention
//!
//! ```text
//! budget 100, undo stream oldest..newest:
//! [OPEN img CLOSE]=60  [OPEN img CLOSE]=80      total 140, 2 groups
//!  ^ discarded from the tail, never inverted
//! [OPEN img CLOSE]=80                           total 80, 1 group
//! ```
//!
//! # Known limitation
//!
//! When an invert fails halfway through a group, the records already
//! replayed stay applied. The failing record goes back on its source stream,
//! and the opposite stream keeps the inverses of the records that were
//! replayed. Both streams are then unbalanced. Once the next capture clears
//! the redo stream, the undo stream still holds a group without its closing
//! half, so retention never trims it again; only [`History::clear`] restores
//! trimming.

use std::borrow::Cow;
use std::fmt;

use palimpsest_raster::{Dirty, ObjectId, Registry};

use crate::config::JournalConfig;
use crate::error::Result;
use crate::kinds::{self, Emitter, Outcome};
use crate::stream::Stream;
use crate::TRACE_TARGET;

/// Direction of a replay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Undo,
    Redo,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Undo => "undo",
            Self::Redo => "redo",
        })
    }
}

/// Linear undo/redo journal for one document.
pub struct History {
    /// Records available for undo (newest at back).
    undo: Stream,
    /// Records available for redo (newest at back).
    redo: Stream,
    config: JournalConfig,
    /// Forward edits applied, net of undos.
    edit_count: i64,
    saved_mark: i64,
    enabled: bool,
    label: Option<Cow<'static, str>>,
    /// One entry per open group: whether its OPEN bracket was recorded.
    open_groups: Vec<bool>,
}

impl fmt::Debug for History {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("History")
            .field("undo_depth", &self.undo.len())
            .field("redo_depth", &self.redo.len())
            .field("undo_bytes", &self.undo.byte_total())
            .field("edit_count", &self.edit_count)
            .field("label", &self.label)
            .field("config", &self.config)
            .finish()
    }
}

impl Default for History {
    fn default() -> Self {
        Self::new(JournalConfig::default())
    }
}

impl History {
    #[must_use]
    pub fn new(config: JournalConfig) -> Self {
        Self {
            undo: Stream::new(),
            redo: Stream::new(),
            config,
            edit_count: 0,
            saved_mark: 0,
            enabled: true,
            label: None,
            open_groups: Vec::new(),
        }
    }

    // ========================================================================
    // State
    // ========================================================================

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// While disabled, captures and group brackets are ignored.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    /// Label given to the next captured records.
    #[must_use]
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    pub fn set_label(&mut self, label: Option<Cow<'static, str>>) {
        self.label = label;
    }

    #[must_use]
    pub fn config(&self) -> &JournalConfig {
        &self.config
    }

    /// Change the retention budget and trim to it.
    pub fn set_budget_bytes(&mut self, budget_bytes: usize) {
        self.config.budget_bytes = budget_bytes;
        self.enforce_budget();
    }

    #[must_use]
    pub fn edit_count(&self) -> i64 {
        self.edit_count
    }

    /// Whether the document matches its last saved state.
    #[must_use]
    pub fn is_saved(&self) -> bool {
        self.edit_count == self.saved_mark
    }

    pub fn mark_saved(&mut self) {
        self.saved_mark = self.edit_count;
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Open an atomic group. Nested groups undo as part of the outermost.
    ///
    /// A group opened while the history is disabled records no brackets,
    /// even if the history is enabled again before the group closes.
    pub fn begin_group(&mut self, label: impl Into<Cow<'static, str>>) -> Result<()> {
        if !self.enabled {
            self.open_groups.push(false);
            return Ok(());
        }
        self.label = Some(label.into());
        self.open_groups.push(true);
        if let Err(err) = self.record_with(|out| kinds::bracket::capture_open(out)) {
            self.open_groups.pop();
            return Err(err);
        }
        Ok(())
    }

    /// Close the innermost group. Closing the outermost clears the label.
    ///
    /// The CLOSE bracket is recorded exactly when the matching OPEN was,
    /// whether or not the history is enabled now.
    pub fn end_group(&mut self) -> Result<()> {
        let recorded = self.open_groups.pop().unwrap_or(self.enabled);
        let closed = if recorded {
            self.record_with(|out| kinds::bracket::capture_close(out))
        } else {
            Ok(())
        };
        if self.open_groups.is_empty() {
            self.label = None;
        }
        closed
    }

    // ========================================================================
    // Capture
    // ========================================================================

    fn capture_with(&mut self, f: impl FnOnce(&mut Emitter<'_>) -> Result<()>) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        self.record_with(f)
    }

    fn record_with(&mut self, f: impl FnOnce(&mut Emitter<'_>) -> Result<()>) -> Result<()> {
        let mark = self.undo.len();
        let mut out = Emitter::new(&mut self.undo, self.label.clone());
        if let Err(err) = f(&mut out) {
            self.undo.truncate_to(mark);
            return Err(err);
        }
        self.after_capture();
        Ok(())
    }

    /// Bytes `offset..offset + size` of an object's field block.
    pub fn capture_data(
        &mut self,
        reg: &Registry,
        object: ObjectId,
        offset: usize,
        size: usize,
    ) -> Result<()> {
        self.capture_with(|out| kinds::field::capture_data(out, reg, object, offset, size))
    }

    /// A `w`x`h` rectangle of pixels at (`x`, `y`).
    pub fn capture_image(
        &mut self,
        reg: &Registry,
        image: ObjectId,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
    ) -> Result<()> {
        self.capture_with(|out| kinds::pixels::capture_image(out, reg, image, (x, y, w, h)))
    }

    /// A flip of the inclusive rectangle (`x1`, `y1`)-(`x2`, `y2`).
    pub fn capture_flip(
        &mut self,
        reg: &Registry,
        image: ObjectId,
        (x1, y1): (usize, usize),
        (x2, y2): (usize, usize),
        horizontal: bool,
    ) -> Result<()> {
        self.capture_with(|out| {
            kinds::pixels::capture_flip(out, reg, image, (x1, y1, x2, y2), horizontal)
        })
    }

    /// The live pixels under every run of `dirty`.
    pub fn capture_dirty(&mut self, reg: &Registry, image: ObjectId, dirty: &Dirty) -> Result<()> {
        self.capture_with(|out| kinds::pixels::capture_dirty(out, reg, image, dirty))
    }

    /// An image about to be added at `index`.
    pub fn capture_add_image(
        &mut self,
        reg: &Registry,
        stock: ObjectId,
        index: usize,
    ) -> Result<()> {
        self.capture_with(|out| kinds::stock::capture_add_image(out, reg, stock, index))
    }

    pub fn capture_remove_image(
        &mut self,
        reg: &Registry,
        stock: ObjectId,
        index: usize,
    ) -> Result<()> {
        self.capture_with(|out| kinds::stock::capture_remove_image(out, reg, stock, index))
    }

    pub fn capture_replace_image(
        &mut self,
        reg: &Registry,
        stock: ObjectId,
        index: usize,
    ) -> Result<()> {
        self.capture_with(|out| kinds::stock::capture_replace_image(out, reg, stock, index))
    }

    /// A cel just attached to `layer`.
    pub fn capture_add_cel(
        &mut self,
        reg: &Registry,
        layer: ObjectId,
        cel: ObjectId,
    ) -> Result<()> {
        self.capture_with(|out| kinds::cel::capture_add_cel(out, reg, layer, cel))
    }

    pub fn capture_remove_cel(
        &mut self,
        reg: &Registry,
        layer: ObjectId,
        cel: ObjectId,
    ) -> Result<()> {
        self.capture_with(|out| kinds::cel::capture_remove_cel(out, reg, layer, cel))
    }

    pub fn capture_set_layer_name(&mut self, reg: &Registry, layer: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::layer::capture_set_layer_name(out, reg, layer))
    }

    /// A layer just attached to `folder`.
    pub fn capture_add_layer(
        &mut self,
        reg: &Registry,
        folder: ObjectId,
        layer: ObjectId,
    ) -> Result<()> {
        self.capture_with(|out| kinds::layer::capture_add_layer(out, reg, folder, layer))
    }

    /// An attached layer about to be removed, with its whole subtree.
    pub fn capture_remove_layer(&mut self, reg: &Registry, layer: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::layer::capture_remove_layer(out, reg, layer))
    }

    /// The current position of an attached layer.
    pub fn capture_move_layer(&mut self, reg: &Registry, layer: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::layer::capture_move_layer(out, reg, layer))
    }

    /// The sprite's active layer.
    pub fn capture_set_layer(&mut self, reg: &Registry, sprite: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::layer::capture_set_layer(out, reg, sprite))
    }

    pub fn capture_add_palette(
        &mut self,
        reg: &Registry,
        sprite: ObjectId,
        palette: ObjectId,
    ) -> Result<()> {
        self.capture_with(|out| kinds::palette::capture_add_palette(out, reg, sprite, palette))
    }

    pub fn capture_remove_palette(
        &mut self,
        reg: &Registry,
        sprite: ObjectId,
        palette: ObjectId,
    ) -> Result<()> {
        self.capture_with(|out| kinds::palette::capture_remove_palette(out, reg, sprite, palette))
    }

    /// Entries `from..=to` of a palette.
    pub fn capture_set_palette_colors(
        &mut self,
        reg: &Registry,
        sprite: ObjectId,
        palette: ObjectId,
        from: u8,
        to: u8,
    ) -> Result<()> {
        self.capture_with(|out| {
            kinds::palette::capture_set_palette_colors(out, reg, sprite, palette, from, to)
        })
    }

    /// A color index permutation about to be applied on frames `from..=to`.
    pub fn capture_remap_palette(
        &mut self,
        reg: &Registry,
        sprite: ObjectId,
        from: u32,
        to: u32,
        mapping: &[u8; 256],
    ) -> Result<()> {
        self.capture_with(|out| {
            kinds::palette::capture_remap_palette(out, reg, sprite, (from, to), mapping)
        })
    }

    pub fn capture_set_mask(&mut self, reg: &Registry, document: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::sprite::capture_set_mask(out, reg, document))
    }

    pub fn capture_set_imgtype(&mut self, reg: &Registry, sprite: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::sprite::capture_set_imgtype(out, reg, sprite))
    }

    pub fn capture_set_size(&mut self, reg: &Registry, sprite: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::sprite::capture_set_size(out, reg, sprite))
    }

    pub fn capture_set_frame(&mut self, reg: &Registry, sprite: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::sprite::capture_set_frame(out, reg, sprite))
    }

    pub fn capture_set_frames(&mut self, reg: &Registry, sprite: ObjectId) -> Result<()> {
        self.capture_with(|out| kinds::sprite::capture_set_frames(out, reg, sprite))
    }

    /// The duration of one existing frame.
    pub fn capture_set_frlen(
        &mut self,
        reg: &Registry,
        sprite: ObjectId,
        frame: u32,
    ) -> Result<()> {
        self.capture_with(|out| kinds::sprite::capture_set_frlen(out, reg, sprite, frame))
    }

    fn after_capture(&mut self) {
        self.edit_count += 1;
        self.clear_redo();
        self.enforce_budget();
    }

    fn enforce_budget(&mut self) {
        if !self.undo.is_balanced() {
            return;
        }
        let mut groups = self.undo.count_groups();
        while groups > 1 && self.undo.byte_total() > self.config.budget_bytes {
            self.discard_oldest_group();
            groups -= 1;
        }
    }

    /// Drop the oldest whole group from the undo stream without inverting
    /// it.
    pub fn discard_oldest_group(&mut self) {
        let mut level = 0i32;
        let mut records = 0usize;
        let mut bytes = 0usize;
        while let Some(record) = self.undo.pop_tail() {
            records += 1;
            bytes += record.byte_size() as usize;
            level += record.kind().nesting();
            if level == 0 {
                break;
            }
        }
        if records > 0 {
            tracing::info!(
                target: TRACE_TARGET,
                records,
                bytes,
                remaining_bytes = self.undo.byte_total(),
                "oldest undo group discarded"
            );
        }
    }

    // ========================================================================
    // Undo / Redo
    // ========================================================================

    #[must_use]
    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Label of the next record [`undo`](Self::undo) would replay.
    #[must_use]
    pub fn peek_undo_label(&self) -> Option<&str> {
        self.undo.peek().map(|r| r.label())
    }

    #[must_use]
    pub fn peek_redo_label(&self) -> Option<&str> {
        self.redo.peek().map(|r| r.label())
    }

    /// Revert the newest group.
    ///
    /// # Returns
    ///
    /// - `Some(Ok(label))` with the label of the first replayed record
    /// - `Some(Err(error))` if an invert failed (the failing record stays on
    ///   the undo stream; records replayed before it stay applied and the
    ///   undo stream is left unbalanced, which stops retention)
    /// - `None` if there is nothing to undo
    pub fn undo(&mut self, reg: &mut Registry) -> Option<Result<String>> {
        self.replay(Direction::Undo, reg)
    }

    /// Re-apply the newest undone group.
    pub fn redo(&mut self, reg: &mut Registry) -> Option<Result<String>> {
        self.replay(Direction::Redo, reg)
    }

    fn replay(&mut self, direction: Direction, reg: &mut Registry) -> Option<Result<String>> {
        let (source, target, step) = match direction {
            Direction::Undo => (&mut self.undo, &mut self.redo, -1),
            Direction::Redo => (&mut self.redo, &mut self.undo, 1),
        };
        let first = source.peek()?.label().to_owned();

        let span = tracing::debug_span!(
            target: TRACE_TARGET,
            "journal.replay",
            direction = %direction,
            records = tracing::field::Empty,
            skipped = tracing::field::Empty,
        );
        let _guard = span.enter();

        let mut level = 0i32;
        let mut replayed = 0usize;
        let mut skipped = 0usize;
        while let Some(record) = source.pop() {
            let mark = target.len();
            let mut out = Emitter::new(target, Some(record.label_cow().clone()));
            match kinds::invert(&record, &mut out, reg) {
                Ok(Outcome::Applied) => {}
                Ok(Outcome::Skipped) => skipped += 1,
                Err(err) => {
                    target.truncate_to(mark);
                    tracing::error!(
                        target: TRACE_TARGET,
                        direction = %direction,
                        kind = %record.kind(),
                        error = %err,
                        "invert failed"
                    );
                    source.push(record);
                    span.record("records", replayed);
                    return Some(Err(err));
                }
            }
            self.edit_count += step;
            replayed += 1;
            level += record.kind().nesting();
            if level == 0 {
                break;
            }
            if source.is_empty() {
                tracing::warn!(
                    target: TRACE_TARGET,
                    direction = %direction,
                    level,
                    "stream exhausted inside a group"
                );
            }
        }
        span.record("records", replayed);
        span.record("skipped", skipped);
        Some(Ok(first))
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Drop every redo record.
    pub fn clear_redo(&mut self) {
        self.redo.clear();
    }

    /// Drop both streams. Counters and the saved mark are kept. Groups that
    /// are still open no longer record a closing bracket.
    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.open_groups.fill(false);
    }

    #[must_use]
    pub fn undo_stream(&self) -> &Stream {
        &self.undo
    }

    #[must_use]
    pub fn redo_stream(&self) -> &Stream {
        &self.redo
    }

    #[must_use]
    pub fn undo_depth(&self) -> usize {
        self.undo.len()
    }

    #[must_use]
    pub fn redo_depth(&self) -> usize {
        self.redo.len()
    }

    #[must_use]
    pub fn undo_bytes(&self) -> usize {
        self.undo.byte_total()
    }

    #[must_use]
    pub fn redo_bytes(&self) -> usize {
        self.redo.byte_total()
    }

    /// Bytes held by both streams.
    #[must_use]
    pub fn memory_usage(&self) -> usize {
        self.undo.byte_total() + self.redo.byte_total()
    }

    /// Labels of the newest `limit` undo groups, newest first.
    #[must_use]
    pub fn undo_labels(&self, limit: usize) -> Vec<&str> {
        group_labels(&self.undo, limit)
    }

    #[must_use]
    pub fn redo_labels(&self, limit: usize) -> Vec<&str> {
        group_labels(&self.redo, limit)
    }
}

fn group_labels(stream: &Stream, limit: usize) -> Vec<&str> {
    let mut labels = Vec::new();
    let mut level = 0i32;
    for record in stream.iter() {
        if labels.len() >= limit {
            break;
        }
        if level == 0 {
            labels.push(record.label());
        }
        level += record.kind().nesting();
    }
    labels
}
