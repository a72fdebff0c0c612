#![forbid(unsafe_code)]

//! Cel insertion and removal.

use palimpsest_raster::{Cel, Layer, ObjectId, RasterError, Registry};

use super::{Emitter, Outcome, optional, present, required};
use crate::codec::{ByteReader, ByteWriter, read_cel, write_cel};
use crate::error::Result;
use crate::record::RecordKind;

pub(crate) fn capture_add_cel(
    out: &mut Emitter<'_>,
    reg: &Registry,
    layer: ObjectId,
    cel: ObjectId,
) -> Result<()> {
    required::<Layer>(reg, layer)?;
    required::<Cel>(reg, cel)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(layer)).put_id(Some(cel));
    out.emit(RecordKind::AddCel, p)
}

pub(crate) fn invert_add_cel(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let layer = r.required_id("layer")?;
    let cel = r.required_id("cel")?;
    r.finish()?;

    if !present::<Layer>(reg, layer, RecordKind::AddCel)?
        || !present::<Cel>(reg, cel, RecordKind::AddCel)?
    {
        return Ok(Outcome::Skipped);
    }
    capture_remove_cel(out, reg, layer, cel)?;
    reg.remove_cel(layer, cel)?;
    reg.release(cel);
    Ok(Outcome::Applied)
}

pub(crate) fn capture_remove_cel(
    out: &mut Emitter<'_>,
    reg: &Registry,
    layer: ObjectId,
    cel: ObjectId,
) -> Result<()> {
    required::<Layer>(reg, layer)?;
    let value = required::<Cel>(reg, cel)?;
    let mut p = ByteWriter::new();
    p.put_id(Some(layer));
    write_cel(&mut p, cel, value);
    out.emit(RecordKind::RemoveCel, p)
}

pub(crate) fn invert_remove_cel(
    r: &mut ByteReader<'_>,
    out: &mut Emitter<'_>,
    reg: &mut Registry,
) -> Result<Outcome> {
    let layer = r.required_id("layer")?;
    let (id, cel) = read_cel(r)?;
    r.finish()?;

    let Some(target) = optional::<Layer>(reg, layer, RecordKind::RemoveCel)? else {
        return Ok(Outcome::Skipped);
    };
    if target.is_folder() {
        return Err(RasterError::NotAnImageLayer(layer).into());
    }
    reg.rebind(id, cel);
    capture_add_cel(out, reg, layer, id)?;
    reg.attach_cel(layer, id)?;
    Ok(Outcome::Applied)
}
