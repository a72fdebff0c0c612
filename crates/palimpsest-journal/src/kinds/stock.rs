#![forbid(unsafe_code)]

//! Stock slot edits.
//!
//! Removing or replacing a slot stores the whole image it held, so the image
//! can be rebound under its old id on invert.

use palimpsest_raster::{Image, ObjectId, Registry, Stock};

use super::{Emitter, Outcome, optional, required, required_mut};
use crate::codec::{ByteReader, ByteWriter, read_image, write_image};
use crate::error::Result;
use crate::record::RecordKind;

pub(crate) fn capture_add_image(
    out: &mut Emitter<'_>,
    reg: &Registry,
    stock: ObjectId,
    index: usize,
) -> Result<()> {
    required::<Stock>(reg, stock)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(stock)).put_u32_from(index, "stock index")?;
    out.emit(RecordKind::AddImage, p)
}

pub(crate) fn invert_add_image(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let stock = r.required_id("stock")?;
    let index = r.u32()? as usize;
    r.finish()?;

    if optional::<Stock>(reg, stock, RecordKind::AddImage)?.is_none() {
        return Ok(Outcome::Skipped);
    }
    capture_remove_image(out, reg, stock, index)?;
    let removed = required_mut::<Stock>(reg, stock)?.remove_image(index);
    if let Some(image) = removed {
        reg.release(image);
    }
    Ok(Outcome::Applied)
}

fn slot_payload(reg: &Registry, stock: ObjectId, index: usize) -> Result<ByteWriter> {
    let slot = required::<Stock>(reg, stock)?.image_at(index);
    let mut p = ByteWriter::new();
    p.put_id(Some(stock)).put_u32_from(index, "stock index")?;
    match slot {
        Some(id) => write_image(&mut p, Some((id, required::<Image>(reg, id)?)))?,
        None => write_image(&mut p, None)?,
    }
    Ok(p)
}

pub(crate) fn capture_remove_image(
    out: &mut Emitter<'_>,
    reg: &Registry,
    stock: ObjectId,
    index: usize,
) -> Result<()> {
    let p = slot_payload(reg, stock, index)?;
    out.emit(RecordKind::RemoveImage, p)
}

pub(crate) fn invert_remove_image(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let stock = r.required_id("stock")?;
    let index = r.u32()? as usize;
    let slot = read_image(r)?;
    r.finish()?;

    if optional::<Stock>(reg, stock, RecordKind::RemoveImage)?.is_none() {
        return Ok(Outcome::Skipped);
    }
    capture_add_image(out, reg, stock, index)?;
    if let Some((id, image)) = slot {
        reg.rebind(id, image);
        required_mut::<Stock>(reg, stock)?.replace_image(index, Some(id));
    }
    Ok(Outcome::Applied)
}

pub(crate) fn capture_replace_image(
    out: &mut Emitter<'_>,
    reg: &Registry,
    stock: ObjectId,
    index: usize,
) -> Result<()> {
    let p = slot_payload(reg, stock, index)?;
    out.emit(RecordKind::ReplaceImage, p)
}

/// Put the recorded image back in its slot, releasing whatever image
/// occupies it now.
pub(crate) fn invert_replace_image(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let stock = r.required_id("stock")?;
    let index = r.u32()? as usize;
    let slot = read_image(r)?;
    r.finish()?;

    if optional::<Stock>(reg, stock, RecordKind::ReplaceImage)?.is_none() {
        return Ok(Outcome::Skipped);
    }
    capture_replace_image(out, reg, stock, index)?;
    let restored = slot.map(|(id, image)| {
        reg.rebind(id, image);
        id
    });
    let previous = required_mut::<Stock>(reg, stock)?.replace_image(index, restored);
    if let Some(old) = previous.filter(|&old| Some(old) != restored) {
        reg.release(old);
    }
    Ok(Outcome::Applied)
}
