#![forbid(unsafe_code)]

//! Error types for document object operations.

use thiserror::Error;

use crate::id::ObjectId;
use crate::image::ColorMode;
use crate::object::ObjectKind;

/// Result alias for raster operations.
pub type Result<T> = std::result::Result<T, RasterError>;

/// Errors raised by the registry when resolving an id.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Nothing is bound to the id.
    #[error("object {0} is not bound")]
    NotFound(ObjectId),
    /// The id is bound to an object of a different concrete kind.
    #[error("object {id} is a {actual}, expected {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },
}

/// Errors raised by document object operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RasterError {
    #[error(
        "region at ({x}, {y}) size {width}x{height} exceeds {bound_width}x{bound_height} bounds"
    )]
    OutOfBounds {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
        bound_width: usize,
        bound_height: usize,
    },

    #[error("pixel data length {actual} does not match expected {expected}")]
    DataLength { expected: usize, actual: usize },

    #[error("operation requires {expected:?} pixels, found {actual:?}")]
    ModeMismatch {
        expected: ColorMode,
        actual: ColorMode,
    },

    #[error("unknown color mode tag {0}")]
    UnknownColorMode(u32),

    #[error("field range {offset}..{end} exceeds {block}-byte field block", end = .offset + .len)]
    FieldOutOfRange {
        offset: usize,
        len: usize,
        block: usize,
    },

    #[error("{0} objects have no patchable fields")]
    NoFieldBlock(ObjectKind),

    #[error("frame {frame} out of range ({total} frames)")]
    FrameOutOfRange { frame: u32, total: u32 },

    #[error("palette entry {index} out of range ({len} entries)")]
    PaletteIndex { index: usize, len: usize },

    #[error("layer {layer} is not a child of folder {folder}")]
    NotAChild { layer: ObjectId, folder: ObjectId },

    #[error("layer {0} is not a folder")]
    NotAFolder(ObjectId),

    #[error("layer {0} is not an image layer")]
    NotAnImageLayer(ObjectId),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}
