#![forbid(unsafe_code)]

//! Stable-id object table.
//!
//! The [`Registry`] owns every document object and hands out [`ObjectId`]s
//! for them. Anything that must outlive a particular instance (journal
//! records, in particular) stores the id and resolves it on use. When an
//! object is rebuilt from a serialized form, [`Registry::rebind`] puts the
//! new instance under its old id.

use std::collections::HashMap;

use crate::error::RegistryError;
use crate::id::ObjectId;
use crate::object::{Kinded, Object, ObjectKind};

/// Arena of document objects keyed by stable id.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    objects: HashMap<ObjectId, Object>,
    last_id: u32,
}

impl Registry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound objects.
    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Allocate a fresh id without binding anything to it.
    ///
    /// # Panics
    ///
    /// Panics if the 32-bit id space is exhausted.
    pub fn reserve(&mut self) -> ObjectId {
        self.last_id = self
            .last_id
            .checked_add(1)
            .expect("object id space exhausted");
        ObjectId::new(self.last_id).expect("ids start at 1")
    }

    /// Bind a new object and return its id.
    pub fn bind(&mut self, object: impl Into<Object>) -> ObjectId {
        let id = self.reserve();
        self.objects.insert(id, object.into());
        id
    }

    /// Bind `object` under a previously issued id.
    ///
    /// Returns the instance the id was bound to before, if any.
    pub fn rebind(&mut self, id: ObjectId, object: impl Into<Object>) -> Option<Object> {
        self.last_id = self.last_id.max(id.raw());
        self.objects.insert(id, object.into())
    }

    /// Drop a binding, returning the object.
    pub fn release(&mut self, id: ObjectId) -> Option<Object> {
        self.objects.remove(&id)
    }

    #[must_use]
    pub fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id)
    }

    #[must_use]
    pub fn kind_of(&self, id: ObjectId) -> Option<ObjectKind> {
        self.objects.get(&id).map(Object::kind)
    }

    #[must_use]
    pub fn resolve(&self, id: ObjectId) -> Option<&Object> {
        self.objects.get(&id)
    }

    pub fn resolve_mut(&mut self, id: ObjectId) -> Option<&mut Object> {
        self.objects.get_mut(&id)
    }

    /// Resolve an id to a concrete kind.
    ///
    /// Fails with [`RegistryError::NotFound`] when nothing is bound and with
    /// [`RegistryError::KindMismatch`] when another kind is.
    pub fn resolve_typed<T: Kinded>(&self, id: ObjectId) -> Result<&T, RegistryError> {
        let object = self.objects.get(&id).ok_or(RegistryError::NotFound(id))?;
        let actual = object.kind();
        T::from_object(object).ok_or(RegistryError::KindMismatch {
            id,
            expected: T::KIND,
            actual,
        })
    }

    pub fn resolve_typed_mut<T: Kinded>(&mut self, id: ObjectId) -> Result<&mut T, RegistryError> {
        let object = self
            .objects
            .get_mut(&id)
            .ok_or(RegistryError::NotFound(id))?;
        let actual = object.kind();
        T::from_object_mut(object).ok_or(RegistryError::KindMismatch {
            id,
            expected: T::KIND,
            actual,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::image::{ColorMode, Image};
    use crate::palette::Palette;

    #[test]
    fn bind_hands_out_distinct_ids() {
        let mut reg = Registry::new();
        let a = reg.bind(Palette::new(0, 4));
        let b = reg.bind(Palette::new(1, 4));
        assert_ne!(a, b);
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn typed_lookup_distinguishes_missing_from_mismatch() {
        let mut reg = Registry::new();
        let pal = reg.bind(Palette::new(0, 4));
        let ghost = ObjectId::new(99).unwrap();

        assert_eq!(
            reg.resolve_typed::<Image>(ghost),
            Err(RegistryError::NotFound(ghost))
        );
        assert_eq!(
            reg.resolve_typed::<Image>(pal),
            Err(RegistryError::KindMismatch {
                id: pal,
                expected: ObjectKind::Image,
                actual: ObjectKind::Palette,
            })
        );
        assert_eq!(reg.resolve_typed::<Palette>(pal).unwrap().len(), 4);
    }

    #[test]
    fn rebind_restores_identity() {
        let mut reg = Registry::new();
        let id = reg.bind(Image::new(ColorMode::Indexed, 2, 2));
        let released = reg.release(id);
        assert!(released.is_some());
        assert!(!reg.contains(id));

        reg.rebind(id, Image::new(ColorMode::Indexed, 3, 3));
        assert_eq!(reg.resolve_typed::<Image>(id).unwrap().width(), 3);
    }

    #[test]
    fn rebind_past_counter_keeps_fresh_ids_unique() {
        let mut reg = Registry::new();
        let high = ObjectId::new(50).unwrap();
        reg.rebind(high, Palette::new(0, 1));
        let next = reg.bind(Palette::new(0, 1));
        assert!(next.raw() > 50);
    }
}
