#![forbid(unsafe_code)]

//! Error types for the edit journal.

use palimpsest_raster::{ColorMode, ObjectId, ObjectKind, RasterError, RegistryError};
use thiserror::Error;

/// Result alias for journal operations.
pub type Result<T> = std::result::Result<T, JournalError>;

/// Failures while encoding or decoding a record payload.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("payload truncated: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },

    #[error("{field} value {value} does not fit its wire field")]
    FieldOverflow { field: &'static str, value: u64 },

    #[error("{field} must name an object")]
    NullId { field: &'static str },

    #[error("unknown color mode tag {0}")]
    UnknownColorMode(u32),

    #[error("unknown record kind tag {0}")]
    UnknownRecordKind(u16),

    #[error("unknown layer type tag {0}")]
    UnknownLayerType(u16),

    #[error("layer name is not valid UTF-8")]
    InvalidUtf8,

    #[error("{0} unread bytes after payload")]
    TrailingBytes(usize),
}

/// Errors surfaced by capture, undo and redo.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JournalError {
    /// The id resolved to an object of another kind.
    #[error("object {id} is a {actual}, record expects {expected}")]
    KindMismatch {
        id: ObjectId,
        expected: ObjectKind,
        actual: ObjectKind,
    },

    /// A recorded region was captured in another color mode than the live
    /// image has now.
    #[error("image {id} is {actual:?}, record holds {expected:?} pixels")]
    ColorModeMismatch {
        id: ObjectId,
        expected: ColorMode,
        actual: ColorMode,
    },

    /// A required subject no longer resolves.
    #[error("required {kind} {id} is missing")]
    MissingReferent { id: ObjectId, kind: ObjectKind },

    /// Capture arguments do not describe the live object.
    #[error("invalid capture: {0}")]
    InvalidCapture(String),

    #[error(transparent)]
    Codec(#[from] CodecError),

    #[error(transparent)]
    Raster(#[from] RasterError),

    #[error(transparent)]
    Registry(RegistryError),
}

impl From<RegistryError> for JournalError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::KindMismatch {
                id,
                expected,
                actual,
            } => Self::KindMismatch {
                id,
                expected,
                actual,
            },
            other => Self::Registry(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_mismatch_lifts_to_kind_mismatch() {
        let id = ObjectId::new(4).unwrap();
        let err: JournalError = RegistryError::KindMismatch {
            id,
            expected: ObjectKind::Image,
            actual: ObjectKind::Layer,
        }
        .into();
        assert!(matches!(err, JournalError::KindMismatch { .. }));
        assert_eq!(err.to_string(), "object #4 is a layer, record expects image");
    }

    #[test]
    fn not_found_stays_a_registry_error() {
        let id = ObjectId::new(9).unwrap();
        let err: JournalError = RegistryError::NotFound(id).into();
        assert_eq!(err, JournalError::Registry(RegistryError::NotFound(id)));
    }
}
