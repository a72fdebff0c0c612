#![forbid(unsafe_code)]

//! Document object model for the palimpsest sprite editor.
//!
//! Every object (images, stocks, cels, layers, palettes, sprites and
//! documents) lives in a [`Registry`] under a stable [`ObjectId`]. Objects
//! link to each other by id, never by reference, so an object can be
//! released and later rebuilt under the same identity.
//!
//! # Example
//!
//! ```
//! use palimpsest_raster::{ColorMode, Layer, Registry, Sprite};
//!
//! let mut reg = Registry::new();
//! let sprite = reg.create_sprite(ColorMode::Indexed, 32, 32);
//! let root = reg.resolve_typed::<Sprite>(sprite).unwrap().root();
//! let layer = reg.add_layer(root, Layer::new_image(sprite, "ink")).unwrap();
//! assert_eq!(reg.prev_sibling(layer), None);
//! ```

pub mod dirty;
pub mod error;
pub mod fields;
pub mod graph;
pub mod id;
pub mod image;
pub mod layer;
pub mod mask;
pub mod object;
pub mod palette;
pub mod registry;
pub mod sprite;
pub mod stock;

pub use dirty::{Dirty, DirtyCol, DirtyRow};
pub use error::{RasterError, RegistryError, Result};
pub use fields::FieldBlock;
pub use graph::DEFAULT_PALETTE_SIZE;
pub use id::ObjectId;
pub use image::{ColorMode, Image};
pub use layer::{Cel, Layer, LayerContent, LayerType, OPAQUE};
pub use mask::Mask;
pub use object::{Kinded, Object, ObjectKind};
pub use palette::Palette;
pub use registry::Registry;
pub use sprite::{DEFAULT_FRAME_DURATION, Document, Sprite};
pub use stock::Stock;
