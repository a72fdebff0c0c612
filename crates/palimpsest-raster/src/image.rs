#![forbid(unsafe_code)]

//! Pixel buffers.
//!
//! An [`Image`] is a row-major buffer whose pixel size is fixed by its
//! [`ColorMode`]. Pixel values are exchanged as `u32` and stored
//! little-endian, truncated to the pixel size.

use crate::error::{RasterError, Result};

/// Pixel format of an image or sprite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ColorMode {
    /// 4 bytes per pixel (RGBA).
    #[default]
    Rgb,
    /// 2 bytes per pixel (value + alpha).
    Grayscale,
    /// 1 byte per pixel (palette index).
    Indexed,
}

impl ColorMode {
    /// Size of one pixel in bytes.
    #[must_use]
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            Self::Rgb => 4,
            Self::Grayscale => 2,
            Self::Indexed => 1,
        }
    }

    /// Wire tag of the mode.
    #[must_use]
    pub const fn tag(self) -> u8 {
        match self {
            Self::Rgb => 0,
            Self::Grayscale => 1,
            Self::Indexed => 2,
        }
    }

    /// Decode a wire tag.
    pub fn from_tag(tag: u32) -> Result<Self> {
        match tag {
            0 => Ok(Self::Rgb),
            1 => Ok(Self::Grayscale),
            2 => Ok(Self::Indexed),
            other => Err(RasterError::UnknownColorMode(other)),
        }
    }
}

/// A rectangular pixel buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    mode: ColorMode,
    width: usize,
    height: usize,
    mask_color: u32,
    data: Vec<u8>,
}

impl Image {
    /// Create a zero-filled image.
    #[must_use]
    pub fn new(mode: ColorMode, width: usize, height: usize) -> Self {
        Self {
            mode,
            width,
            height,
            mask_color: 0,
            data: vec![0; width * height * mode.bytes_per_pixel()],
        }
    }

    /// Create an image from raw row-major pixel data.
    pub fn from_raw(mode: ColorMode, width: usize, height: usize, data: Vec<u8>) -> Result<Self> {
        let expected = width * height * mode.bytes_per_pixel();
        if data.len() != expected {
            return Err(RasterError::DataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            mode,
            width,
            height,
            mask_color: 0,
            data,
        })
    }

    #[must_use]
    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Transparent color value.
    #[must_use]
    pub fn mask_color(&self) -> u32 {
        self.mask_color
    }

    pub fn set_mask_color(&mut self, color: u32) {
        self.mask_color = color;
    }

    /// Whole pixel buffer, row-major.
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Bytes occupied by `w` pixels.
    #[must_use]
    pub fn line_size(&self, w: usize) -> usize {
        w * self.mode.bytes_per_pixel()
    }

    /// Check that a rectangle lies inside the image.
    pub fn check_region(&self, x: usize, y: usize, w: usize, h: usize) -> Result<()> {
        let fits = x
            .checked_add(w)
            .is_some_and(|right| right <= self.width)
            && y.checked_add(h).is_some_and(|bottom| bottom <= self.height);
        if fits {
            Ok(())
        } else {
            Err(RasterError::OutOfBounds {
                x,
                y,
                width: w,
                height: h,
                bound_width: self.width,
                bound_height: self.height,
            })
        }
    }

    fn offset(&self, x: usize, y: usize) -> usize {
        (y * self.width + x) * self.mode.bytes_per_pixel()
    }

    /// Borrow a horizontal run of `w` pixels starting at (`x`, `y`).
    pub fn row(&self, x: usize, y: usize, w: usize) -> Result<&[u8]> {
        self.check_region(x, y, w, 1)?;
        let start = self.offset(x, y);
        Ok(&self.data[start..start + self.line_size(w)])
    }

    /// Mutably borrow a horizontal run of `w` pixels starting at (`x`, `y`).
    pub fn row_mut(&mut self, x: usize, y: usize, w: usize) -> Result<&mut [u8]> {
        self.check_region(x, y, w, 1)?;
        let start = self.offset(x, y);
        let len = self.line_size(w);
        Ok(&mut self.data[start..start + len])
    }

    /// Read one pixel, or `None` outside the image.
    #[must_use]
    pub fn get_pixel(&self, x: usize, y: usize) -> Option<u32> {
        let run = self.row(x, y, 1).ok()?;
        let mut bytes = [0u8; 4];
        bytes[..run.len()].copy_from_slice(run);
        Some(u32::from_le_bytes(bytes))
    }

    /// Write one pixel, truncating `value` to the pixel size.
    pub fn put_pixel(&mut self, x: usize, y: usize, value: u32) -> Result<()> {
        let run = self.row_mut(x, y, 1)?;
        let len = run.len();
        run.copy_from_slice(&value.to_le_bytes()[..len]);
        Ok(())
    }

    /// Fill every pixel with `value`.
    pub fn fill(&mut self, value: u32) {
        let bpp = self.mode.bytes_per_pixel();
        let bytes = value.to_le_bytes();
        for px in self.data.chunks_exact_mut(bpp) {
            px.copy_from_slice(&bytes[..bpp]);
        }
    }

    /// Copy a rectangle out of the image, row-major.
    pub fn copy_region(&self, x: usize, y: usize, w: usize, h: usize) -> Result<Vec<u8>> {
        self.check_region(x, y, w, h)?;
        let mut out = Vec::with_capacity(self.line_size(w) * h);
        for v in 0..h {
            out.extend_from_slice(self.row(x, y + v, w)?);
        }
        Ok(out)
    }

    /// Overwrite a rectangle with row-major pixel data.
    pub fn write_region(
        &mut self,
        x: usize,
        y: usize,
        w: usize,
        h: usize,
        data: &[u8],
    ) -> Result<()> {
        self.check_region(x, y, w, h)?;
        let line = self.line_size(w);
        if data.len() != line * h {
            return Err(RasterError::DataLength {
                expected: line * h,
                actual: data.len(),
            });
        }
        for (v, src) in data.chunks_exact(line.max(1)).take(h).enumerate() {
            self.row_mut(x, y + v, w)?.copy_from_slice(src);
        }
        Ok(())
    }

    /// Mirror the inclusive rectangle (`x1`, `y1`)-(`x2`, `y2`).
    ///
    /// Horizontal flips mirror columns, vertical flips mirror rows. Flipping
    /// twice with the same arguments is the identity.
    pub fn flip(
        &mut self,
        x1: usize,
        y1: usize,
        x2: usize,
        y2: usize,
        horizontal: bool,
    ) -> Result<()> {
        if x2 < x1 || y2 < y1 {
            return Err(RasterError::OutOfBounds {
                x: x1,
                y: y1,
                width: 0,
                height: 0,
                bound_width: self.width,
                bound_height: self.height,
            });
        }
        let (w, h) = (x2 - x1 + 1, y2 - y1 + 1);
        self.check_region(x1, y1, w, h)?;
        let bpp = self.mode.bytes_per_pixel();

        if horizontal {
            for y in y1..=y2 {
                let run = self.row_mut(x1, y, w)?;
                let mut left = 0;
                let mut right = w - 1;
                while left < right {
                    for b in 0..bpp {
                        run.swap(left * bpp + b, right * bpp + b);
                    }
                    left += 1;
                    right -= 1;
                }
            }
        } else {
            let mut top = y1;
            let mut bottom = y2;
            while top < bottom {
                let upper = self.row(x1, top, w)?.to_vec();
                let lower = self.row(x1, bottom, w)?.to_vec();
                self.row_mut(x1, top, w)?.copy_from_slice(&lower);
                self.row_mut(x1, bottom, w)?.copy_from_slice(&upper);
                top += 1;
                bottom -= 1;
            }
        }
        Ok(())
    }

    /// Replace every palette index `c` with `mapping[c]`.
    pub fn remap(&mut self, mapping: &[u8; 256]) -> Result<()> {
        if self.mode != ColorMode::Indexed {
            return Err(RasterError::ModeMismatch {
                expected: ColorMode::Indexed,
                actual: self.mode,
            });
        }
        for px in &mut self.data {
            *px = mapping[usize::from(*px)];
        }
        Ok(())
    }
}
