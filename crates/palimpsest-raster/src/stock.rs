#![forbid(unsafe_code)]

//! Indexed image storage shared by a sprite's cels.

use crate::id::ObjectId;

/// Slots of images addressed by index.
///
/// Cels refer to images by slot index, so removing an image leaves its
/// slot empty instead of shifting the following ones.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Stock {
    images: Vec<Option<ObjectId>>,
}

impl Stock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of slots, including empty ones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.images.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Append an image and return its slot index.
    pub fn add_image(&mut self, image: ObjectId) -> usize {
        self.images.push(Some(image));
        self.images.len() - 1
    }

    /// Image bound to a slot, if any.
    #[must_use]
    pub fn image_at(&self, index: usize) -> Option<ObjectId> {
        self.images.get(index).copied().flatten()
    }

    /// Put `image` into a slot, growing the stock if needed.
    ///
    /// Returns the image previously held by the slot.
    pub fn replace_image(&mut self, index: usize, image: Option<ObjectId>) -> Option<ObjectId> {
        if index >= self.images.len() {
            self.images.resize(index + 1, None);
        }
        std::mem::replace(&mut self.images[index], image)
    }

    /// Empty a slot, returning the image it held.
    pub fn remove_image(&mut self, index: usize) -> Option<ObjectId> {
        self.images.get_mut(index).and_then(Option::take)
    }

    /// Slot index holding `image`, if any.
    #[must_use]
    pub fn index_of(&self, image: ObjectId) -> Option<usize> {
        self.images.iter().position(|slot| *slot == Some(image))
    }
}
