#![forbid(unsafe_code)]

//! Per-kind capture and invert.
//!
//! Every record kind has a `capture` that snapshots the live state of its
//! subject into a stream, and an `invert` that first captures the current
//! state into the opposite stream and then writes the recorded state back.
//! [`invert`] dispatches on the record kind.
//!
//! Subjects are looked up through the registry on every use. Content
//! subjects (images, documents) are *required*: if they are gone the invert
//! fails. Structural subjects (layers, sprites, palettes, stocks, cels) are
//! *optional*: if they are gone the invert is skipped.

pub(crate) mod bracket;
pub(crate) mod cel;
pub(crate) mod field;
pub(crate) mod layer;
pub(crate) mod palette;
pub(crate) mod pixels;
pub(crate) mod sprite;
pub(crate) mod stock;

use std::borrow::Cow;

use palimpsest_raster::{Kinded, ObjectId, ObjectKind, Registry, RegistryError};

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{JournalError, Result};
use crate::record::{Record, RecordKind};
use crate::stream::Stream;
use crate::TRACE_TARGET;

/// What an invert did with its record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    /// The recorded state was written back.
    Applied,
    /// An optional subject was gone; nothing changed.
    Skipped,
}

/// Pushes new records onto one stream under a common label.
pub(crate) struct Emitter<'a> {
    stream: &'a mut Stream,
    label: Option<Cow<'static, str>>,
}

impl<'a> Emitter<'a> {
    pub(crate) fn new(stream: &'a mut Stream, label: Option<Cow<'static, str>>) -> Self {
        Self { stream, label }
    }

    pub(crate) fn emit(&mut self, kind: RecordKind, payload: ByteWriter) -> Result<()> {
        let label = self.label.clone().unwrap_or(Cow::Borrowed(kind.name()));
        let record = Record::new(kind, label, payload.into_bytes())?;
        tracing::debug!(
            target: TRACE_TARGET,
            kind = %kind,
            label = record.label(),
            bytes = record.byte_size(),
            "record captured"
        );
        self.stream.push(record);
        Ok(())
    }
}

/// Resolve a subject that must exist.
pub(crate) fn required<T: Kinded>(reg: &Registry, id: ObjectId) -> Result<&T> {
    reg.resolve_typed::<T>(id).map_err(|err| missing(err, T::KIND))
}

pub(crate) fn required_mut<T: Kinded>(reg: &mut Registry, id: ObjectId) -> Result<&mut T> {
    reg.resolve_typed_mut::<T>(id).map_err(|err| missing(err, T::KIND))
}

fn missing(err: RegistryError, kind: ObjectKind) -> JournalError {
    match err {
        RegistryError::NotFound(id) => JournalError::MissingReferent { id, kind },
        other => other.into(),
    }
}

/// Resolve a subject that may have gone away. `Ok(None)` means skip.
pub(crate) fn optional<T: Kinded>(
    reg: &Registry,
    id: ObjectId,
    kind: RecordKind,
) -> Result<Option<&T>> {
    match reg.resolve_typed::<T>(id) {
        Ok(object) => Ok(Some(object)),
        Err(RegistryError::NotFound(_)) => {
            skip(kind, id);
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// Log a skipped invert.
pub(crate) fn skip(kind: RecordKind, subject: ObjectId) -> Outcome {
    tracing::debug!(
        target: TRACE_TARGET,
        kind = %kind,
        subject = %subject,
        "subject gone, invert skipped"
    );
    Outcome::Skipped
}

/// Whether an optional subject is present; logs and returns `false` if not.
pub(crate) fn present<T: Kinded>(reg: &Registry, id: ObjectId, kind: RecordKind) -> Result<bool> {
    optional::<T>(reg, id, kind).map(|found| found.is_some())
}

/// Undo one record: capture its inverse into `out`, then apply it.
pub(crate) fn invert(
    record: &Record,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let mut r = ByteReader::new(record.payload());
    match record.kind() {
        RecordKind::Open => bracket::invert_open(&mut r, out),
        RecordKind::Close => bracket::invert_close(&mut r, out),
        RecordKind::Data => field::invert_data(&mut r, out, reg),
        RecordKind::Image => pixels::invert_image(&mut r, out, reg),
        RecordKind::Flip => pixels::invert_flip(&mut r, out, reg),
        RecordKind::Dirty => pixels::invert_dirty(&mut r, out, reg),
        RecordKind::AddImage => stock::invert_add_image(&mut r, out, reg),
        RecordKind::RemoveImage => stock::invert_remove_image(&mut r, out, reg),
        RecordKind::ReplaceImage => stock::invert_replace_image(&mut r, out, reg),
        RecordKind::AddCel => cel::invert_add_cel(&mut r, out, reg),
        RecordKind::RemoveCel => cel::invert_remove_cel(&mut r, out, reg),
        RecordKind::SetLayerName => layer::invert_set_layer_name(&mut r, out, reg),
        RecordKind::AddLayer => layer::invert_add_layer(&mut r, out, reg),
        RecordKind::RemoveLayer => layer::invert_remove_layer(&mut r, out, reg),
        RecordKind::MoveLayer => layer::invert_move_layer(&mut r, out, reg),
        RecordKind::SetLayer => layer::invert_set_layer(&mut r, out, reg),
        RecordKind::AddPalette => palette::invert_add_palette(&mut r, out, reg),
        RecordKind::RemovePalette => palette::invert_remove_palette(&mut r, out, reg),
        RecordKind::SetPaletteColors => palette::invert_set_palette_colors(&mut r, out, reg),
        RecordKind::RemapPalette => palette::invert_remap_palette(&mut r, out, reg),
        RecordKind::SetMask => sprite::invert_set_mask(&mut r, out, reg),
        RecordKind::SetImgType => sprite::invert_set_imgtype(&mut r, out, reg),
        RecordKind::SetSize => sprite::invert_set_size(&mut r, out, reg),
        RecordKind::SetFrame => sprite::invert_set_frame(&mut r, out, reg),
        RecordKind::SetFrames => sprite::invert_set_frames(&mut r, out, reg),
        RecordKind::SetFrlen => sprite::invert_set_frlen(&mut r, out, reg),
    }
}
