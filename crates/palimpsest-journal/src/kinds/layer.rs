#![forbid(unsafe_code)]

//! Layer tree edits and the active layer.

use palimpsest_raster::{Layer, ObjectId, RasterError, Registry, Sprite};

use super::{Emitter, Outcome, optional, present, required};
use crate::codec::{ByteReader, ByteWriter, read_layer, write_layer};
use crate::error::{CodecError, JournalError, Result};
use crate::record::RecordKind;

fn attached_parent(reg: &Registry, layer: ObjectId) -> Result<ObjectId> {
    required::<Layer>(reg, layer)?
        .parent()
        .ok_or_else(|| JournalError::InvalidCapture(format!("layer {layer} is not attached")))
}

/// Whether an optional folder is present and really a folder.
fn folder_present(reg: &Registry, folder: ObjectId, kind: RecordKind) -> Result<bool> {
    match optional::<Layer>(reg, folder, kind)? {
        None => Ok(false),
        Some(node) if node.is_folder() => Ok(true),
        Some(_) => Err(RasterError::NotAFolder(folder).into()),
    }
}

// ============================================================================
// set_layer_name
// ============================================================================

pub(crate) fn capture_set_layer_name(
    out: &mut Emitter<'_>,
    reg: &Registry,
    layer: ObjectId,
) -> Result<()> {
    let name = required::<Layer>(reg, layer)?.name();
    let mut p = ByteWriter::new();
    p.put_id(Some(layer));
    p.put_u16_from(name.len(), "layer name length")?
        .put_bytes(name.as_bytes());
    out.emit(RecordKind::SetLayerName, p)
}

pub(crate) fn invert_set_layer_name(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let layer = r.required_id("layer")?;
    let len = usize::from(r.u16()?);
    let name = std::str::from_utf8(r.bytes(len)?).map_err(|_| CodecError::InvalidUtf8)?;
    r.finish()?;

    if !present::<Layer>(reg, layer, RecordKind::SetLayerName)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_layer_name(out, reg, layer)?;
    reg.resolve_typed_mut::<Layer>(layer)?.set_name(name);
    Ok(Outcome::Applied)
}

// ============================================================================
// add_layer / remove_layer
// ============================================================================

pub(crate) fn capture_add_layer(
    out: &mut Emitter<'_>,
    reg: &Registry,
    folder: ObjectId,
    layer: ObjectId,
) -> Result<()> {
    required::<Layer>(reg, folder)?;
    required::<Layer>(reg, layer)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(folder)).put_id(Some(layer));
    out.emit(RecordKind::AddLayer, p)
}

/// Destroy the added layer, saving its whole subtree first.
pub(crate) fn invert_add_layer(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let folder = r.required_id("folder")?;
    let layer = r.required_id("layer")?;
    r.finish()?;

    if !present::<Layer>(reg, folder, RecordKind::AddLayer)?
        || !present::<Layer>(reg, layer, RecordKind::AddLayer)?
    {
        return Ok(Outcome::Skipped);
    }
    capture_remove_layer(out, reg, layer)?;
    reg.destroy_layer(layer)?;
    Ok(Outcome::Applied)
}

/// Store `layer` with its parent folder, the sibling below it and its
/// complete subtree.
pub(crate) fn capture_remove_layer(
    out: &mut Emitter<'_>,
    reg: &Registry,
    layer: ObjectId,
) -> Result<()> {
    let folder = attached_parent(reg, layer)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(folder)).put_id(reg.prev_sibling(layer));
    write_layer(&mut p, reg, layer)?;
    out.emit(RecordKind::RemoveLayer, p)
}

/// Rebuild the stored subtree and link it back above its recorded sibling.
pub(crate) fn invert_remove_layer(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let folder = r.required_id("folder")?;
    let after = r.id()?;
    let raw = read_layer(r)?;
    r.finish()?;

    if !folder_present(reg, folder, RecordKind::RemoveLayer)?
        || !present::<Sprite>(reg, raw.sprite(), RecordKind::RemoveLayer)?
    {
        return Ok(Outcome::Skipped);
    }
    let layer = raw.restore(reg)?;
    reg.attach_layer(folder, layer, after)?;
    capture_add_layer(out, reg, folder, layer)?;
    Ok(Outcome::Applied)
}

// ============================================================================
// move_layer
// ============================================================================

pub(crate) fn capture_move_layer(
    out: &mut Emitter<'_>,
    reg: &Registry,
    layer: ObjectId,
) -> Result<()> {
    let folder = attached_parent(reg, layer)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(folder))
        .put_id(Some(layer))
        .put_id(reg.prev_sibling(layer));
    out.emit(RecordKind::MoveLayer, p)
}

pub(crate) fn invert_move_layer(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let folder = r.required_id("folder")?;
    let layer = r.required_id("layer")?;
    let after = r.id()?;
    r.finish()?;

    if !folder_present(reg, folder, RecordKind::MoveLayer)?
        || !present::<Layer>(reg, layer, RecordKind::MoveLayer)?
    {
        return Ok(Outcome::Skipped);
    }
    capture_move_layer(out, reg, layer)?;
    if let Some(parent) = reg.resolve_typed::<Layer>(layer)?.parent() {
        reg.detach_layer(parent, layer)?;
    }
    reg.attach_layer(folder, layer, after)?;
    Ok(Outcome::Applied)
}

// ============================================================================
// set_layer
// ============================================================================

pub(crate) fn capture_set_layer(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
) -> Result<()> {
    let current = required::<Sprite>(reg, sprite)?.current_layer();
    let mut p = ByteWriter::new();
    p.put_id(Some(sprite)).put_id(current);
    out.emit(RecordKind::SetLayer, p)
}

pub(crate) fn invert_set_layer(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let layer = r.id()?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetLayer)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_layer(out, reg, sprite)?;
    reg.resolve_typed_mut::<Sprite>(sprite)?
        .set_current_layer(layer);
    Ok(Outcome::Applied)
}
