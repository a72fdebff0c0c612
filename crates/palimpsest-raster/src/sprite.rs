#![forbid(unsafe_code)]

//! Sprites and documents.

use crate::error::{RasterError, Result};
use crate::id::ObjectId;
use crate::image::ColorMode;
use crate::mask::Mask;

/// Duration given to newly created frames, in milliseconds.
pub const DEFAULT_FRAME_DURATION: u32 = 100;

/// An animated sprite: canvas metadata plus ids of its owned parts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sprite {
    mode: ColorMode,
    width: u32,
    height: u32,
    durations: Vec<u32>,
    current_frame: u32,
    current_layer: Option<ObjectId>,
    root: ObjectId,
    stock: ObjectId,
    palettes: Vec<ObjectId>,
}

impl Sprite {
    /// Create a one-frame sprite over an existing root folder and stock.
    #[must_use]
    pub fn new(mode: ColorMode, width: u32, height: u32, root: ObjectId, stock: ObjectId) -> Self {
        Self {
            mode,
            width,
            height,
            durations: vec![DEFAULT_FRAME_DURATION],
            current_frame: 0,
            current_layer: None,
            root,
            stock,
            palettes: Vec::new(),
        }
    }

    #[must_use]
    pub fn mode(&self) -> ColorMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ColorMode) {
        self.mode = mode;
    }

    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn set_size(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    #[must_use]
    pub fn total_frames(&self) -> u32 {
        self.durations.len() as u32
    }

    /// Resize the frame list. New frames get [`DEFAULT_FRAME_DURATION`].
    pub fn set_total_frames(&mut self, frames: u32) -> Result<()> {
        if frames == 0 {
            return Err(RasterError::FrameOutOfRange {
                frame: 0,
                total: self.total_frames(),
            });
        }
        self.durations
            .resize(frames as usize, DEFAULT_FRAME_DURATION);
        Ok(())
    }

    #[must_use]
    pub fn frame_duration(&self, frame: u32) -> Option<u32> {
        self.durations.get(frame as usize).copied()
    }

    pub fn set_frame_duration(&mut self, frame: u32, duration: u32) -> Result<()> {
        let total = self.total_frames();
        let slot = self
            .durations
            .get_mut(frame as usize)
            .ok_or(RasterError::FrameOutOfRange { frame, total })?;
        *slot = duration;
        Ok(())
    }

    #[must_use]
    pub fn current_frame(&self) -> u32 {
        self.current_frame
    }

    pub fn set_current_frame(&mut self, frame: u32) {
        self.current_frame = frame;
    }

    #[must_use]
    pub fn current_layer(&self) -> Option<ObjectId> {
        self.current_layer
    }

    pub fn set_current_layer(&mut self, layer: Option<ObjectId>) {
        self.current_layer = layer;
    }

    /// Root folder of the layer tree.
    #[must_use]
    pub fn root(&self) -> ObjectId {
        self.root
    }

    #[must_use]
    pub fn stock(&self) -> ObjectId {
        self.stock
    }

    /// Palette ids, ordered by start frame.
    #[must_use]
    pub fn palettes(&self) -> &[ObjectId] {
        &self.palettes
    }

    pub(crate) fn palettes_mut(&mut self) -> &mut Vec<ObjectId> {
        &mut self.palettes
    }
}

/// An open document: a sprite plus its selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    sprite: ObjectId,
    mask: Mask,
}

impl Document {
    #[must_use]
    pub fn new(sprite: ObjectId) -> Self {
        Self {
            sprite,
            mask: Mask::new(),
        }
    }

    #[must_use]
    pub fn sprite(&self) -> ObjectId {
        self.sprite
    }

    #[must_use]
    pub fn mask(&self) -> &Mask {
        &self.mask
    }

    pub fn mask_mut(&mut self) -> &mut Mask {
        &mut self.mask
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sprite() -> Sprite {
        let id = |raw| ObjectId::new(raw).unwrap();
        Sprite::new(ColorMode::Indexed, 32, 32, id(1), id(2))
    }

    #[test]
    fn frames_resize_with_default_duration() {
        let mut spr = sprite();
        spr.set_frame_duration(0, 40).unwrap();
        spr.set_total_frames(3).unwrap();
        assert_eq!(spr.total_frames(), 3);
        assert_eq!(spr.frame_duration(0), Some(40));
        assert_eq!(spr.frame_duration(2), Some(DEFAULT_FRAME_DURATION));
        spr.set_total_frames(1).unwrap();
        assert_eq!(spr.frame_duration(1), None);
    }

    #[test]
    fn zero_frames_is_rejected() {
        let mut spr = sprite();
        assert!(spr.set_total_frames(0).is_err());
        assert_eq!(spr.total_frames(), 1);
    }

    #[test]
    fn duration_out_of_range() {
        let mut spr = sprite();
        assert_eq!(
            spr.set_frame_duration(5, 1),
            Err(RasterError::FrameOutOfRange { frame: 5, total: 1 })
        );
    }
}
