#![forbid(unsafe_code)]

//! Layers and cels.

use crate::id::ObjectId;

/// Opacity of a freshly created cel.
pub const OPAQUE: u16 = 255;

/// Placement of one stock image on one frame of an image layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cel {
    pub frame: u16,
    /// Stock slot index.
    pub image: u16,
    pub x: i16,
    pub y: i16,
    pub opacity: u16,
}

impl Cel {
    #[must_use]
    pub fn new(frame: u16, image: u16) -> Self {
        Self {
            frame,
            image,
            x: 0,
            y: 0,
            opacity: OPAQUE,
        }
    }

    #[must_use]
    pub fn with_position(mut self, x: i16, y: i16) -> Self {
        self.x = x;
        self.y = y;
        self
    }
}

/// Concrete layer type, with its wire tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerType {
    Image,
    Folder,
}

impl LayerType {
    #[must_use]
    pub const fn tag(self) -> u16 {
        match self {
            Self::Image => 0,
            Self::Folder => 1,
        }
    }

    #[must_use]
    pub fn from_tag(tag: u16) -> Option<Self> {
        match tag {
            0 => Some(Self::Image),
            1 => Some(Self::Folder),
            _ => None,
        }
    }
}

/// What a layer holds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayerContent {
    /// Per-frame cels.
    Image { cels: Vec<ObjectId> },
    /// Child layers, bottom first.
    Folder { children: Vec<ObjectId> },
}

/// A node of a sprite's layer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layer {
    name: String,
    flags: u8,
    sprite: ObjectId,
    parent: Option<ObjectId>,
    content: LayerContent,
}

impl Layer {
    /// Create an empty image layer.
    #[must_use]
    pub fn new_image(sprite: ObjectId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            sprite,
            parent: None,
            content: LayerContent::Image { cels: Vec::new() },
        }
    }

    /// Create an empty folder layer.
    #[must_use]
    pub fn new_folder(sprite: ObjectId, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            flags: 0,
            sprite,
            parent: None,
            content: LayerContent::Folder {
                children: Vec::new(),
            },
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    #[must_use]
    pub fn flags(&self) -> u8 {
        self.flags
    }

    pub fn set_flags(&mut self, flags: u8) {
        self.flags = flags;
    }

    /// Owning sprite.
    #[must_use]
    pub fn sprite(&self) -> ObjectId {
        self.sprite
    }

    /// Folder this layer is attached to.
    #[must_use]
    pub fn parent(&self) -> Option<ObjectId> {
        self.parent
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ObjectId>) {
        self.parent = parent;
    }

    #[must_use]
    pub fn layer_type(&self) -> LayerType {
        match self.content {
            LayerContent::Image { .. } => LayerType::Image,
            LayerContent::Folder { .. } => LayerType::Folder,
        }
    }

    #[must_use]
    pub fn is_folder(&self) -> bool {
        self.layer_type() == LayerType::Folder
    }

    #[must_use]
    pub fn content(&self) -> &LayerContent {
        &self.content
    }

    /// Cels of an image layer; empty for folders.
    #[must_use]
    pub fn cels(&self) -> &[ObjectId] {
        match &self.content {
            LayerContent::Image { cels } => cels,
            LayerContent::Folder { .. } => &[],
        }
    }

    /// Children of a folder; empty for image layers.
    #[must_use]
    pub fn children(&self) -> &[ObjectId] {
        match &self.content {
            LayerContent::Folder { children } => children,
            LayerContent::Image { .. } => &[],
        }
    }

    pub(crate) fn children_mut(&mut self) -> Option<&mut Vec<ObjectId>> {
        match &mut self.content {
            LayerContent::Folder { children } => Some(children),
            LayerContent::Image { .. } => None,
        }
    }

    pub(crate) fn cels_mut(&mut self) -> Option<&mut Vec<ObjectId>> {
        match &mut self.content {
            LayerContent::Image { cels } => Some(cels),
            LayerContent::Folder { .. } => None,
        }
    }
}
