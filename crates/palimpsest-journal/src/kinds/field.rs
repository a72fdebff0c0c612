#![forbid(unsafe_code)]

//! Generic field patches.
//!
//! A `data` record stores a byte range of an object's field block (see
//! [`FieldBlock`](palimpsest_raster::FieldBlock)) and swaps it back on
//! invert. It covers scalar edits without a dedicated kind.

use palimpsest_raster::{ObjectId, RasterError, Registry, RegistryError};

use super::{Emitter, Outcome, skip};
use crate::codec::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::record::RecordKind;

pub(crate) fn capture_data(
    out: &mut Emitter<'_>,
    reg: &Registry,
    object: ObjectId,
    offset: usize,
    size: usize,
) -> Result<()> {
    let subject = reg.resolve(object).ok_or(RegistryError::NotFound(object))?;
    let block = subject
        .field_block()
        .ok_or(RasterError::NoFieldBlock(subject.kind()))?;
    let bytes = block.read_field(offset, size)?;

    let mut w = ByteWriter::new();
    w.put_id(Some(object));
    w.put_u32_from(offset, "field offset")?
        .put_u32_from(size, "field size")?
        .put_bytes(&bytes);
    out.emit(RecordKind::Data, w)
}

pub(crate) fn invert_data(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let object = r.required_id("data subject")?;
    let offset = r.u32()? as usize;
    let size = r.u32()? as usize;
    let bytes = r.bytes(size)?;
    r.finish()?;

    if !reg.contains(object) {
        return Ok(skip(RecordKind::Data, object));
    }
    capture_data(out, reg, object, offset, size)?;

    let subject = reg.resolve_mut(object).ok_or(RegistryError::NotFound(object))?;
    let kind = subject.kind();
    subject
        .field_block_mut()
        .ok_or(RasterError::NoFieldBlock(kind))?
        .patch_field(offset, bytes)?;
    Ok(Outcome::Applied)
}
