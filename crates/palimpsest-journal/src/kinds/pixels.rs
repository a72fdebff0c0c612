#![forbid(unsafe_code)]

//! Pixel edits: rectangular patches, flips and sparse diffs.

use palimpsest_raster::{ColorMode, Dirty, Image, ObjectId, Registry};

use super::{Emitter, Outcome, required, required_mut};
use crate::codec::{ByteReader, ByteWriter, read_dirty, read_mode, write_dirty};
use crate::error::{JournalError, Result};
use crate::record::RecordKind;

fn check_mode(id: ObjectId, image: &Image, expected: ColorMode) -> Result<()> {
    if image.mode() == expected {
        Ok(())
    } else {
        Err(JournalError::ColorModeMismatch {
            id,
            expected,
            actual: image.mode(),
        })
    }
}

// ============================================================================
// image
// ============================================================================

pub(crate) fn capture_image(
    out: &mut Emitter<'_>,
    reg: &Registry,
    id: ObjectId,
    (x, y, w, h): (usize, usize, usize, usize),
) -> Result<()> {
    let image = required::<Image>(reg, id)?;
    let pixels = image.copy_region(x, y, w, h)?;

    let mut p = ByteWriter::new();
    p.put_id(Some(id)).put_u8(image.mode().tag());
    p.put_u16_from(x, "region x")?
        .put_u16_from(y, "region y")?
        .put_u16_from(w, "region width")?
        .put_u16_from(h, "region height")?
        .put_bytes(&pixels);
    out.emit(RecordKind::Image, p)
}

pub(crate) fn invert_image(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let id = r.required_id("image")?;
    let mode = read_mode(r)?;
    let x = usize::from(r.u16()?);
    let y = usize::from(r.u16()?);
    let w = usize::from(r.u16()?);
    let h = usize::from(r.u16()?);
    let pixels = r.bytes(w * h * mode.bytes_per_pixel())?;
    r.finish()?;

    check_mode(id, required::<Image>(reg, id)?, mode)?;
    capture_image(out, reg, id, (x, y, w, h))?;
    required_mut::<Image>(reg, id)?.write_region(x, y, w, h, pixels)?;
    Ok(Outcome::Applied)
}

// ============================================================================
// flip
// ============================================================================

pub(crate) fn capture_flip(
    out: &mut Emitter<'_>,
    reg: &Registry,
    id: ObjectId,
    (x1, y1, x2, y2): (usize, usize, usize, usize),
    horizontal: bool,
) -> Result<()> {
    let image = required::<Image>(reg, id)?;
    if x2 < x1 || y2 < y1 {
        return Err(JournalError::InvalidCapture(format!(
            "flip corners ({x1}, {y1})-({x2}, {y2}) are reversed"
        )));
    }
    image.check_region(x1, y1, x2 - x1 + 1, y2 - y1 + 1)?;

    let mut p = ByteWriter::new();
    p.put_id(Some(id)).put_u8(image.mode().tag());
    p.put_u16_from(x1, "flip x1")?
        .put_u16_from(y1, "flip y1")?
        .put_u16_from(x2, "flip x2")?
        .put_u16_from(y2, "flip y2")?
        .put_u8(u8::from(horizontal));
    out.emit(RecordKind::Flip, p)
}

pub(crate) fn invert_flip(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let id = r.required_id("image")?;
    let mode = read_mode(r)?;
    let x1 = usize::from(r.u16()?);
    let y1 = usize::from(r.u16()?);
    let x2 = usize::from(r.u16()?);
    let y2 = usize::from(r.u16()?);
    let horizontal = r.u8()? != 0;
    r.finish()?;

    check_mode(id, required::<Image>(reg, id)?, mode)?;
    capture_flip(out, reg, id, (x1, y1, x2, y2), horizontal)?;
    required_mut::<Image>(reg, id)?.flip(x1, y1, x2, y2, horizontal)?;
    Ok(Outcome::Applied)
}

// ============================================================================
// dirty
// ============================================================================

/// Capture the live pixels under every run of `dirty`.
pub(crate) fn capture_dirty(
    out: &mut Emitter<'_>,
    reg: &Registry,
    id: ObjectId,
    dirty: &Dirty,
) -> Result<()> {
    let image = required::<Image>(reg, id)?;
    check_mode(id, image, dirty.mode())?;
    let mut saved = dirty.clone();
    saved.save_image_pixels(image)?;
    emit_dirty(out, id, &saved)
}

fn emit_dirty(out: &mut Emitter<'_>, id: ObjectId, dirty: &Dirty) -> Result<()> {
    let mut p = ByteWriter::new();
    p.put_id(Some(id));
    write_dirty(&mut p, dirty)?;
    out.emit(RecordKind::Dirty, p)
}

/// Swap the stored runs with the live image; the swapped-out runs become
/// the inverse record.
pub(crate) fn invert_dirty(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let id = r.required_id("image")?;
    let mut dirty = read_dirty(r)?;
    r.finish()?;

    let image = required_mut::<Image>(reg, id)?;
    check_mode(id, image, dirty.mode())?;
    dirty.swap_image_pixels(image)?;
    emit_dirty(out, id, &dirty)?;
    Ok(Outcome::Applied)
}
