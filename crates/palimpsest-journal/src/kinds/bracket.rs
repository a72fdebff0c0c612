#![forbid(unsafe_code)]

//! Group brackets. Each bracket inverts to its counterpart.

use super::{Emitter, Outcome};
use crate::codec::{ByteReader, ByteWriter};
use crate::error::Result;
use crate::record::RecordKind;

pub(crate) fn capture_open(out: &mut Emitter<'_>) -> Result<()> {
    out.emit(RecordKind::Open, ByteWriter::new())
}

pub(crate) fn capture_close(out: &mut Emitter<'_>) -> Result<()> {
    out.emit(RecordKind::Close, ByteWriter::new())
}

pub(crate) fn invert_open(r: &mut ByteReader<'_>, out: &mut Emitter<'_>) -> Result<Outcome> {
    r.finish()?;
    capture_close(out)?;
    Ok(Outcome::Applied)
}

pub(crate) fn invert_close(r: &mut ByteReader<'_>, out: &mut Emitter<'_>) -> Result<Outcome> {
    r.finish()?;
    capture_open(out)?;
    Ok(Outcome::Applied)
}
