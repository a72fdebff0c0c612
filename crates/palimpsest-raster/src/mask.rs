#![forbid(unsafe_code)]

//! Bit-packed selection masks.

use crate::error::{RasterError, Result};

/// A selection mask covering the rectangle (`x`, `y`, `width`, `height`).
///
/// Each row holds `(width + 7) / 8` bytes, most significant bit first.
/// An empty mask has zero width or height and no bitmap.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Mask {
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    bitmap: Vec<u8>,
}

impl Mask {
    /// Create an empty mask.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a mask with every pixel of the rectangle selected.
    #[must_use]
    pub fn from_rect(x: usize, y: usize, width: usize, height: usize) -> Self {
        let mut mask = Self::new();
        mask.add_rect(x, y, width, height);
        mask
    }

    /// Rebuild a mask from raw rows.
    pub fn from_raw(
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        bitmap: Vec<u8>,
    ) -> Result<Self> {
        let expected = Self::stride_for(width) * height;
        if bitmap.len() != expected {
            return Err(RasterError::DataLength {
                expected,
                actual: bitmap.len(),
            });
        }
        if width == 0 || height == 0 {
            return Ok(Self {
                x,
                y,
                ..Self::default()
            });
        }
        Ok(Self {
            x,
            y,
            width,
            height,
            bitmap,
        })
    }

    #[must_use]
    pub fn stride_for(width: usize) -> usize {
        width.div_ceil(8)
    }

    /// Bytes per bitmap row.
    #[must_use]
    pub fn stride(&self) -> usize {
        Self::stride_for(self.width)
    }

    #[must_use]
    pub fn x(&self) -> usize {
        self.x
    }

    #[must_use]
    pub fn y(&self) -> usize {
        self.y
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    #[must_use]
    pub fn bitmap(&self) -> &[u8] {
        &self.bitmap
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Whether the absolute pixel (`px`, `py`) is selected.
    #[must_use]
    pub fn get(&self, px: usize, py: usize) -> bool {
        if px < self.x || py < self.y || px >= self.x + self.width || py >= self.y + self.height {
            return false;
        }
        let (u, v) = (px - self.x, py - self.y);
        self.bitmap[v * self.stride() + u / 8] & (0x80 >> (u % 8)) != 0
    }

    /// Select or deselect a pixel inside the mask bounds.
    pub fn set(&mut self, px: usize, py: usize, selected: bool) -> Result<()> {
        if px < self.x || py < self.y || px >= self.x + self.width || py >= self.y + self.height {
            return Err(RasterError::OutOfBounds {
                x: px,
                y: py,
                width: 1,
                height: 1,
                bound_width: self.x + self.width,
                bound_height: self.y + self.height,
            });
        }
        let (u, v) = (px - self.x, py - self.y);
        let idx = v * self.stride() + u / 8;
        let bit = 0x80 >> (u % 8);
        if selected {
            self.bitmap[idx] |= bit;
        } else {
            self.bitmap[idx] &= !bit;
        }
        Ok(())
    }

    /// Add a rectangle to the selection, growing the bounds as needed.
    pub fn add_rect(&mut self, x: usize, y: usize, width: usize, height: usize) {
        if width == 0 || height == 0 {
            return;
        }
        let (nx, ny, nw, nh) = if self.is_empty() {
            (x, y, width, height)
        } else {
            let nx = self.x.min(x);
            let ny = self.y.min(y);
            let right = (self.x + self.width).max(x + width);
            let bottom = (self.y + self.height).max(y + height);
            (nx, ny, right - nx, bottom - ny)
        };

        let old = std::mem::take(self);
        *self = Self {
            x: nx,
            y: ny,
            width: nw,
            height: nh,
            bitmap: vec![0; Self::stride_for(nw) * nh],
        };
        for py in old.y..old.y + old.height {
            for px in old.x..old.x + old.width {
                if old.get(px, py) {
                    self.mark(px, py);
                }
            }
        }
        for py in y..y + height {
            for px in x..x + width {
                self.mark(px, py);
            }
        }
    }

    fn mark(&mut self, px: usize, py: usize) {
        let (u, v) = (px - self.x, py - self.y);
        let stride = self.stride();
        self.bitmap[v * stride + u / 8] |= 0x80 >> (u % 8);
    }

    /// Replace this mask with a copy of `other`.
    pub fn copy_from(&mut self, other: &Mask) {
        self.clone_from(other);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rect_mask_selects_inside_only() {
        let mask = Mask::from_rect(2, 3, 10, 2);
        assert_eq!(mask.stride(), 2);
        assert!(mask.get(2, 3));
        assert!(mask.get(11, 4));
        assert!(!mask.get(12, 4));
        assert!(!mask.get(1, 3));
    }

    #[test]
    fn add_rect_grows_and_keeps_old_bits() {
        let mut mask = Mask::from_rect(0, 0, 2, 2);
        mask.add_rect(5, 5, 1, 1);
        assert_eq!((mask.width(), mask.height()), (6, 6));
        assert!(mask.get(1, 1));
        assert!(mask.get(5, 5));
        assert!(!mask.get(3, 3));
    }

    #[test]
    fn set_outside_bounds_fails() {
        let mut mask = Mask::from_rect(0, 0, 4, 4);
        mask.set(1, 1, false).unwrap();
        assert!(!mask.get(1, 1));
        assert!(mask.set(4, 0, true).is_err());
    }

    #[test]
    fn from_raw_checks_length() {
        assert!(Mask::from_raw(0, 0, 9, 2, vec![0; 3]).is_err());
        let mask = Mask::from_raw(0, 0, 9, 2, vec![0xFF, 0x80, 0, 0]).unwrap();
        assert!(mask.get(8, 0));
        assert!(!mask.get(8, 1));
    }

    #[test]
    fn empty_mask_has_no_bitmap() {
        let mask = Mask::from_raw(3, 4, 0, 0, Vec::new()).unwrap();
        assert!(mask.is_empty());
        assert!(mask.bitmap().is_empty());
    }
}
