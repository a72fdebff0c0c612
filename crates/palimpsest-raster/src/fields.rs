#![forbid(unsafe_code)]

//! Byte-addressable scalar fields.
//!
//! Field patches address an object's scalar state as a small fixed-layout,
//! little-endian byte block. Reading a range copies bytes out of the block;
//! patching overwrites a range and loads the whole block back, so a patch
//! that produces an invalid value is rejected without touching the object.
//!
//! | Object | Offset | Size | Field          |
//! |--------|--------|------|----------------|
//! | Sprite | 0      | 4    | color mode tag |
//! | Sprite | 4      | 4    | total frames   |
//! | Sprite | 8      | 4    | current frame  |
//! | Sprite | 12     | 4    | width          |
//! | Sprite | 16     | 4    | height         |
//! | Layer  | 0      | 1    | flags          |
//! | Cel    | 0      | 2    | frame          |
//! | Cel    | 2      | 2    | stock index    |
//! | Cel    | 4      | 2    | x (signed)     |
//! | Cel    | 6      | 2    | y (signed)     |
//! | Cel    | 8      | 2    | opacity        |
//! | Image  | 0      | 4    | mask color     |

use crate::error::{RasterError, Result};
use crate::image::{ColorMode, Image};
use crate::layer::{Cel, Layer};
use crate::sprite::Sprite;

/// Scalar state exposed as a fixed-layout byte block.
pub trait FieldBlock {
    /// Encode the current field values.
    fn field_bytes(&self) -> Vec<u8>;

    /// Decode and apply a complete block.
    fn load_field_bytes(&mut self, block: &[u8]) -> Result<()>;

    /// Copy `len` bytes starting at `offset`.
    fn read_field(&self, offset: usize, len: usize) -> Result<Vec<u8>> {
        let block = self.field_bytes();
        let range = field_range(offset, len, block.len())?;
        Ok(block[range].to_vec())
    }

    /// Overwrite the bytes at `offset` and apply the result.
    fn patch_field(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let mut block = self.field_bytes();
        let range = field_range(offset, bytes.len(), block.len())?;
        block[range].copy_from_slice(bytes);
        self.load_field_bytes(&block)
    }
}

fn field_range(offset: usize, len: usize, block: usize) -> Result<std::ops::Range<usize>> {
    match offset.checked_add(len) {
        Some(end) if len > 0 && end <= block => Ok(offset..end),
        _ => Err(RasterError::FieldOutOfRange { offset, len, block }),
    }
}

/// Fail unless `block` holds at least `len` bytes.
fn require(block: &[u8], len: usize) -> Result<()> {
    field_range(0, len, block.len()).map(drop)
}

fn u32_at(block: &[u8], at: usize) -> u32 {
    let mut b = [0u8; 4];
    b.copy_from_slice(&block[at..at + 4]);
    u32::from_le_bytes(b)
}

fn u16_at(block: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([block[at], block[at + 1]])
}

impl FieldBlock for Sprite {
    fn field_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(20);
        out.extend_from_slice(&u32::from(self.mode().tag()).to_le_bytes());
        out.extend_from_slice(&self.total_frames().to_le_bytes());
        out.extend_from_slice(&self.current_frame().to_le_bytes());
        out.extend_from_slice(&self.width().to_le_bytes());
        out.extend_from_slice(&self.height().to_le_bytes());
        out
    }

    fn load_field_bytes(&mut self, block: &[u8]) -> Result<()> {
        require(block, 20)?;
        let mode = ColorMode::from_tag(u32_at(block, 0))?;
        self.set_total_frames(u32_at(block, 4))?;
        self.set_mode(mode);
        self.set_current_frame(u32_at(block, 8));
        self.set_size(u32_at(block, 12), u32_at(block, 16));
        Ok(())
    }
}

impl FieldBlock for Layer {
    fn field_bytes(&self) -> Vec<u8> {
        vec![self.flags()]
    }

    fn load_field_bytes(&mut self, block: &[u8]) -> Result<()> {
        require(block, 1)?;
        self.set_flags(block[0]);
        Ok(())
    }
}

impl FieldBlock for Cel {
    fn field_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(10);
        out.extend_from_slice(&self.frame.to_le_bytes());
        out.extend_from_slice(&self.image.to_le_bytes());
        out.extend_from_slice(&self.x.to_le_bytes());
        out.extend_from_slice(&self.y.to_le_bytes());
        out.extend_from_slice(&self.opacity.to_le_bytes());
        out
    }

    fn load_field_bytes(&mut self, block: &[u8]) -> Result<()> {
        require(block, 10)?;
        self.frame = u16_at(block, 0);
        self.image = u16_at(block, 2);
        self.x = u16_at(block, 4) as i16;
        self.y = u16_at(block, 6) as i16;
        self.opacity = u16_at(block, 8);
        Ok(())
    }
}

impl FieldBlock for Image {
    fn field_bytes(&self) -> Vec<u8> {
        self.mask_color().to_le_bytes().to_vec()
    }

    fn load_field_bytes(&mut self, block: &[u8]) -> Result<()> {
        require(block, 4)?;
        self.set_mask_color(u32_at(block, 0));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::ObjectId;

    fn sprite() -> Sprite {
        let id = |raw| ObjectId::new(raw).unwrap();
        Sprite::new(ColorMode::Rgb, 16, 8, id(1), id(2))
    }

    #[test]
    fn sprite_frames_live_at_offset_four() {
        let mut spr = sprite();
        spr.set_total_frames(2).unwrap();
        assert_eq!(spr.read_field(4, 4).unwrap(), 2u32.to_le_bytes());

        spr.patch_field(4, &5u32.to_le_bytes()).unwrap();
        assert_eq!(spr.total_frames(), 5);
    }

    #[test]
    fn invalid_patch_leaves_object_untouched() {
        let mut spr = sprite();
        assert_eq!(
            spr.patch_field(0, &9u32.to_le_bytes()),
            Err(RasterError::UnknownColorMode(9))
        );
        assert_eq!(spr.mode(), ColorMode::Rgb);
    }

    #[test]
    fn out_of_range_reads_fail() {
        let spr = sprite();
        assert!(matches!(
            spr.read_field(18, 4),
            Err(RasterError::FieldOutOfRange { block: 20, .. })
        ));
        assert!(spr.read_field(0, 0).is_err());
        assert!(spr.read_field(usize::MAX, 2).is_err());
    }

    #[test]
    fn short_blocks_are_rejected() {
        let mut spr = sprite();
        assert_eq!(
            spr.load_field_bytes(&[0; 8]),
            Err(RasterError::FieldOutOfRange {
                offset: 0,
                len: 20,
                block: 8,
            })
        );
        assert_eq!(spr.mode(), ColorMode::Rgb);

        let mut cel = Cel::new(0, 0);
        assert!(cel.load_field_bytes(&[1, 0, 2]).is_err());
        assert_eq!(cel.frame, 0);
    }

    #[test]
    fn cel_position_is_signed() {
        let mut cel = Cel::new(0, 0);
        cel.patch_field(4, &(-3i16).to_le_bytes()).unwrap();
        assert_eq!(cel.x, -3);
        assert_eq!(cel.field_bytes().len(), 10);
    }
}
