#![forbid(unsafe_code)]

//! Color palettes.

use crate::error::{RasterError, Result};

/// A palette that takes effect from `frame` onward.
///
/// Entries are packed RGBA values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    frame: u32,
    entries: Vec<u32>,
}

impl Palette {
    /// Create a palette of `ncolors` black entries.
    #[must_use]
    pub fn new(frame: u32, ncolors: usize) -> Self {
        Self {
            frame,
            entries: vec![0; ncolors],
        }
    }

    #[must_use]
    pub fn from_entries(frame: u32, entries: Vec<u32>) -> Self {
        Self { frame, entries }
    }

    /// First frame this palette applies to.
    #[must_use]
    pub fn frame(&self) -> u32 {
        self.frame
    }

    pub fn set_frame(&mut self, frame: u32) {
        self.frame = frame;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn entries(&self) -> &[u32] {
        &self.entries
    }

    #[must_use]
    pub fn get_entry(&self, index: usize) -> Option<u32> {
        self.entries.get(index).copied()
    }

    pub fn set_entry(&mut self, index: usize, color: u32) -> Result<()> {
        let len = self.entries.len();
        let slot = self
            .entries
            .get_mut(index)
            .ok_or(RasterError::PaletteIndex { index, len })?;
        *slot = color;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_are_bounds_checked() {
        let mut pal = Palette::new(0, 4);
        pal.set_entry(3, 0xFF00_00FF).unwrap();
        assert_eq!(pal.get_entry(3), Some(0xFF00_00FF));
        assert_eq!(
            pal.set_entry(4, 1),
            Err(RasterError::PaletteIndex { index: 4, len: 4 })
        );
        assert_eq!(pal.get_entry(4), None);
    }
}
