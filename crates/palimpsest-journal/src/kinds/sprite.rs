#![forbid(unsafe_code)]

//! Selection mask and sprite metadata.

use palimpsest_raster::{ColorMode, Document, Mask, ObjectId, RasterError, Registry, Sprite};

use super::{Emitter, Outcome, present, required, required_mut};
use crate::codec::{ByteReader, ByteWriter};
use crate::error::{CodecError, Result};
use crate::record::RecordKind;

fn sprite_payload(sprite: ObjectId, fields: &[u32]) -> ByteWriter {
    let mut p = ByteWriter::new();
    p.put_id(Some(sprite));
    for &field in fields {
        p.put_u32(field);
    }
    p
}

// ============================================================================
// set_mask
// ============================================================================

pub(crate) fn capture_set_mask(
    out: &mut Emitter<'_>,
    reg: &Registry,
    document: ObjectId,
) -> Result<()> {
    let mask = required::<Document>(reg, document)?.mask();
    let mut p = ByteWriter::new();
    p.put_id(Some(document));
    p.put_u16_from(mask.x(), "mask x")?
        .put_u16_from(mask.y(), "mask y")?
        .put_u16_from(mask.width(), "mask width")?
        .put_u16_from(mask.height(), "mask height")?
        .put_bytes(mask.bitmap());
    out.emit(RecordKind::SetMask, p)
}

pub(crate) fn invert_set_mask(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let document = r.required_id("document")?;
    let x = usize::from(r.u16()?);
    let y = usize::from(r.u16()?);
    let width = usize::from(r.u16()?);
    let height = usize::from(r.u16()?);
    let bitmap = r.bytes(Mask::stride_for(width) * height)?;
    r.finish()?;

    let mask = Mask::from_raw(x, y, width, height, bitmap.to_vec())?;
    required::<Document>(reg, document)?;
    capture_set_mask(out, reg, document)?;
    required_mut::<Document>(reg, document)?
        .mask_mut()
        .copy_from(&mask);
    Ok(Outcome::Applied)
}

// ============================================================================
// set_imgtype
// ============================================================================

pub(crate) fn capture_set_imgtype(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
) -> Result<()> {
    let mode = required::<Sprite>(reg, sprite)?.mode();
    out.emit(
        RecordKind::SetImgType,
        sprite_payload(sprite, &[u32::from(mode.tag())]),
    )
}

pub(crate) fn invert_set_imgtype(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let tag = r.u32()?;
    let mode = ColorMode::from_tag(tag).map_err(|_| CodecError::UnknownColorMode(tag))?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetImgType)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_imgtype(out, reg, sprite)?;
    reg.resolve_typed_mut::<Sprite>(sprite)?.set_mode(mode);
    Ok(Outcome::Applied)
}

// ============================================================================
// set_size
// ============================================================================

pub(crate) fn capture_set_size(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
) -> Result<()> {
    let s = required::<Sprite>(reg, sprite)?;
    out.emit(
        RecordKind::SetSize,
        sprite_payload(sprite, &[s.width(), s.height()]),
    )
}

pub(crate) fn invert_set_size(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let width = r.u32()?;
    let height = r.u32()?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetSize)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_size(out, reg, sprite)?;
    reg.resolve_typed_mut::<Sprite>(sprite)?
        .set_size(width, height);
    Ok(Outcome::Applied)
}

// ============================================================================
// set_frame / set_frames / set_frlen
// ============================================================================

pub(crate) fn capture_set_frame(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
) -> Result<()> {
    let frame = required::<Sprite>(reg, sprite)?.current_frame();
    out.emit(RecordKind::SetFrame, sprite_payload(sprite, &[frame]))
}

pub(crate) fn invert_set_frame(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let frame = r.u32()?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetFrame)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_frame(out, reg, sprite)?;
    reg.resolve_typed_mut::<Sprite>(sprite)?
        .set_current_frame(frame);
    Ok(Outcome::Applied)
}

pub(crate) fn capture_set_frames(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
) -> Result<()> {
    let frames = required::<Sprite>(reg, sprite)?.total_frames();
    out.emit(RecordKind::SetFrames, sprite_payload(sprite, &[frames]))
}

pub(crate) fn invert_set_frames(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let frames = r.u32()?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetFrames)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_frames(out, reg, sprite)?;
    reg.resolve_typed_mut::<Sprite>(sprite)?
        .set_total_frames(frames)?;
    Ok(Outcome::Applied)
}

pub(crate) fn capture_set_frlen(
    out: &mut Emitter<'_>,
    reg: &Registry,
    sprite: ObjectId,
    frame: u32,
) -> Result<()> {
    let s = required::<Sprite>(reg, sprite)?;
    let duration = s.frame_duration(frame).ok_or(RasterError::FrameOutOfRange {
        frame,
        total: s.total_frames(),
    })?;
    out.emit(
        RecordKind::SetFrlen,
        sprite_payload(sprite, &[frame, duration]),
    )
}

pub(crate) fn invert_set_frlen(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let sprite = r.required_id("sprite")?;
    let frame = r.u32()?;
    let duration = r.u32()?;
    r.finish()?;

    if !present::<Sprite>(reg, sprite, RecordKind::SetFrlen)? {
        return Ok(Outcome::Skipped);
    }
    capture_set_frlen(out, reg, sprite, frame)?;
    reg.resolve_typed_mut::<Sprite>(sprite)?
        .set_frame_duration(frame, duration)?;
    Ok(Outcome::Applied)
}
