#![forbid(unsafe_code)]

//! Journal records.
//!
//! A [`Record`] is one immutable capture holding enough state to reverse a
//! single primitive mutation. Its payload layout is fixed by its
//! [`RecordKind`]; the header (kind and total size) is accounted for in
//! [`Record::byte_size`] but only materialized by [`Record::encode`].

use std::borrow::Cow;
use std::fmt;

use crate::codec::{ByteReader, ByteWriter};
use crate::error::{CodecError, Result};

/// Bytes of the common header: kind (2) and total size (4).
pub const RECORD_HEADER_SIZE: usize = 6;

macro_rules! record_kinds {
    ($($variant:ident = $tag:literal => $name:literal),* $(,)?) => {
        /// Closed set of mutation types a record can reverse.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #[repr(u16)]
        pub enum RecordKind {
            $($variant = $tag,)*
        }

        impl RecordKind {
            /// Every kind, in tag order.
            pub const ALL: &'static [RecordKind] = &[$(Self::$variant,)*];

            /// Canonical name, used as the label of unlabeled records.
            #[must_use]
            pub const fn name(self) -> &'static str {
                match self {
                    $(Self::$variant => $name,)*
                }
            }

            /// Decode a wire tag.
            #[must_use]
            pub fn from_tag(tag: u16) -> Option<Self> {
                match tag {
                    $($tag => Some(Self::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

record_kinds! {
    Open = 0 => "open",
    Close = 1 => "close",
    Data = 2 => "data",
    Image = 3 => "image",
    Flip = 4 => "flip",
    Dirty = 5 => "dirty",
    AddImage = 6 => "add_image",
    RemoveImage = 7 => "remove_image",
    ReplaceImage = 8 => "replace_image",
    AddCel = 9 => "add_cel",
    RemoveCel = 10 => "remove_cel",
    SetLayerName = 11 => "set_layer_name",
    AddLayer = 12 => "add_layer",
    RemoveLayer = 13 => "remove_layer",
    MoveLayer = 14 => "move_layer",
    SetLayer = 15 => "set_layer",
    AddPalette = 16 => "add_palette",
    RemovePalette = 17 => "remove_palette",
    SetPaletteColors = 18 => "set_palette_colors",
    RemapPalette = 19 => "remap_palette",
    SetMask = 20 => "set_mask",
    SetImgType = 21 => "set_imgtype",
    SetSize = 22 => "set_size",
    SetFrame = 23 => "set_frame",
    SetFrames = 24 => "set_frames",
    SetFrlen = 25 => "set_frlen",
}

impl RecordKind {
    #[must_use]
    pub const fn tag(self) -> u16 {
        self as u16
    }

    /// Change to the group nesting level when this record is replayed.
    #[must_use]
    pub const fn nesting(self) -> i32 {
        match self {
            Self::Open => 1,
            Self::Close => -1,
            _ => 0,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One captured mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    kind: RecordKind,
    byte_size: u32,
    label: Cow<'static, str>,
    payload: Vec<u8>,
}

impl Record {
    /// Build a record. Fails if the total size does not fit 32 bits.
    pub fn new(
        kind: RecordKind,
        label: impl Into<Cow<'static, str>>,
        payload: Vec<u8>,
    ) -> Result<Self> {
        let total = RECORD_HEADER_SIZE + payload.len();
        let byte_size = u32::try_from(total).map_err(|_| CodecError::FieldOverflow {
            field: "record size",
            value: total as u64,
        })?;
        Ok(Self {
            kind,
            byte_size,
            label: label.into(),
            payload,
        })
    }

    #[must_use]
    pub fn kind(&self) -> RecordKind {
        self.kind
    }

    /// Exact size including the header.
    #[must_use]
    pub fn byte_size(&self) -> u32 {
        self.byte_size
    }

    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    pub(crate) fn label_cow(&self) -> &Cow<'static, str> {
        &self.label
    }

    #[must_use]
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Header followed by payload. The label is not part of the wire form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut w = ByteWriter::new();
        w.put_u16(self.kind.tag())
            .put_u32(self.byte_size)
            .put_bytes(&self.payload);
        w.into_bytes()
    }

    /// Parse one encoded record, labeling it with its kind name.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut r = ByteReader::new(bytes);
        let tag = r.u16()?;
        let kind = RecordKind::from_tag(tag).ok_or(CodecError::UnknownRecordKind(tag))?;
        let size = r.u32()? as usize;
        let payload_len = size.checked_sub(RECORD_HEADER_SIZE).ok_or(CodecError::Truncated {
            needed: RECORD_HEADER_SIZE,
            remaining: size,
        })?;
        let payload = r.bytes(payload_len)?.to_vec();
        r.finish()?;
        Self::new(kind, kind.name(), payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_are_dense_and_named() {
        for (i, kind) in RecordKind::ALL.iter().enumerate() {
            assert_eq!(usize::from(kind.tag()), i);
            assert_eq!(RecordKind::from_tag(kind.tag()), Some(*kind));
        }
        assert_eq!(RecordKind::ALL.len(), 26);
        assert_eq!(RecordKind::SetImgType.name(), "set_imgtype");
        assert_eq!(RecordKind::from_tag(26), None);
    }

    #[test]
    fn byte_size_counts_header() {
        let record = Record::new(RecordKind::SetFrame, "frame", vec![0; 8]).unwrap();
        assert_eq!(record.byte_size(), 14);
        assert_eq!(record.label(), "frame");
    }

    #[test]
    fn encoded_header_carries_kind_and_size() {
        let record = Record::new(RecordKind::Flip, "flip", vec![1, 2, 3]).unwrap();
        let bytes = record.encode();
        assert_eq!(&bytes[..6], &[4, 0, 9, 0, 0, 0]);
        let back = Record::decode(&bytes).unwrap();
        assert_eq!(back.kind(), RecordKind::Flip);
        assert_eq!(back.payload(), &[1, 2, 3]);
    }

    #[test]
    fn decode_rejects_short_size() {
        let bytes = [0, 0, 3, 0, 0, 0];
        assert!(Record::decode(&bytes).is_err());
    }

    #[test]
    fn only_brackets_nest() {
        assert_eq!(RecordKind::Open.nesting(), 1);
        assert_eq!(RecordKind::Close.nesting(), -1);
        assert_eq!(RecordKind::Dirty.nesting(), 0);
    }
}
