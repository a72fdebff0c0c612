#![forbid(unsafe_code)]

//! Stable object identities.

use std::fmt;
use std::num::NonZeroU32;

/// Opaque identity of a document object.
///
/// An id names the logical entity, not a particular instance: when an
/// object is destroyed and later rebuilt from a journal payload, the
/// rebuilt instance is rebound under the same id. The wire value `0` is
/// reserved for "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(NonZeroU32);

impl ObjectId {
    /// Create an id from a raw value. Returns `None` for `0`.
    #[must_use]
    pub const fn new(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }

    /// Get the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0.get()
    }

    /// Encode an optional id, using `0` for `None`.
    #[must_use]
    pub fn to_wire(id: Option<Self>) -> u32 {
        id.map_or(0, Self::raw)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_is_not_an_id() {
        assert!(ObjectId::new(0).is_none());
        assert_eq!(ObjectId::new(7).map(ObjectId::raw), Some(7));
    }

    #[test]
    fn wire_encoding_uses_zero_for_none() {
        assert_eq!(ObjectId::to_wire(None), 0);
        assert_eq!(ObjectId::to_wire(ObjectId::new(42)), 42);
    }

    #[test]
    fn display_is_prefixed() {
        let id = ObjectId::new(3).unwrap();
        assert_eq!(id.to_string(), "#3");
    }
}
