#![forbid(unsafe_code)]

//! Little-endian payload encoding.
//!
//! Record payloads are flat byte strings. [`ByteWriter`] appends fixed-width
//! fields and rejects values that do not fit; [`ByteReader`] consumes them in
//! the same order and reports truncation instead of panicking.
//!
//! Object ids travel as 4-byte values with `0` meaning "none".

mod layer;
mod raster;

pub(crate) use layer::{read_layer, write_layer};
pub(crate) use raster::{
    read_cel, read_dirty, read_image, read_mode, write_cel, write_dirty, write_image,
};

use palimpsest_raster::ObjectId;

use crate::error::CodecError;

type CodecResult<T> = std::result::Result<T, CodecError>;

/// Append-only payload builder.
#[derive(Debug, Default)]
pub(crate) struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn put_u8(&mut self, value: u8) -> &mut Self {
        self.buf.push(value);
        self
    }

    pub(crate) fn put_u16(&mut self, value: u16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn put_i16(&mut self, value: i16) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn put_u32(&mut self, value: u32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_le_bytes());
        self
    }

    pub(crate) fn put_bytes(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub(crate) fn put_id(&mut self, id: Option<ObjectId>) -> &mut Self {
        self.put_u32(ObjectId::to_wire(id))
    }

    /// Write a length or coordinate into a 2-byte field.
    pub(crate) fn put_u16_from(
        &mut self,
        value: usize,
        field: &'static str,
    ) -> CodecResult<&mut Self> {
        let narrow = u16::try_from(value).map_err(|_| CodecError::FieldOverflow {
            field,
            value: value as u64,
        })?;
        Ok(self.put_u16(narrow))
    }

    /// Write a length or index into a 4-byte field.
    pub(crate) fn put_u32_from(
        &mut self,
        value: usize,
        field: &'static str,
    ) -> CodecResult<&mut Self> {
        let narrow = u32::try_from(value).map_err(|_| CodecError::FieldOverflow {
            field,
            value: value as u64,
        })?;
        Ok(self.put_u32(narrow))
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.buf.len()
    }

    pub(crate) fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over a payload.
#[derive(Debug)]
pub(crate) struct ByteReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub(crate) fn bytes(&mut self, len: usize) -> CodecResult<&'a [u8]> {
        let remaining = self.remaining();
        if len > remaining {
            return Err(CodecError::Truncated {
                needed: len,
                remaining,
            });
        }
        let out = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    fn array<const N: usize>(&mut self) -> CodecResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.bytes(N)?);
        Ok(out)
    }

    pub(crate) fn u8(&mut self) -> CodecResult<u8> {
        Ok(self.array::<1>()?[0])
    }

    pub(crate) fn u16(&mut self) -> CodecResult<u16> {
        self.array().map(u16::from_le_bytes)
    }

    pub(crate) fn i16(&mut self) -> CodecResult<i16> {
        self.array().map(i16::from_le_bytes)
    }

    pub(crate) fn u32(&mut self) -> CodecResult<u32> {
        self.array().map(u32::from_le_bytes)
    }

    /// Read an optional id.
    pub(crate) fn id(&mut self) -> CodecResult<Option<ObjectId>> {
        self.u32().map(ObjectId::new)
    }

    /// Read an id that must not be `0`.
    pub(crate) fn required_id(&mut self, field: &'static str) -> CodecResult<ObjectId> {
        self.id()?.ok_or(CodecError::NullId { field })
    }

    /// Fail unless the whole payload was consumed.
    pub(crate) fn finish(&self) -> CodecResult<()> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }
}
