//! A storage is the data structure where components of the same type for all entities are stored.
//!
//! Storages are keyed by [`EntityHandle`] and remember the version each component was stored for,
//! so a handle to a destroyed entity never reads the component of a newer entity in the same slot.

use crate::entity::EntityHandle;

mod vec;
pub use vec::VecStorage as Vec;

mod tree;
pub use tree::Tree;

#[cfg(test)]
mod tests;

/// Iterator over the components of a storage.
pub type Iter<'t, C> = Box<dyn Iterator<Item = (EntityHandle, &'t C)> + 't>;

/// Mutable iterator over the components of a storage.
pub type IterMut<'t, C> = Box<dyn Iterator<Item = (EntityHandle, &'t mut C)> + 't>;

/// A storage for storing component data.
pub trait Storage: Default + 'static {
    /// The component type stored.
    type Comp: 'static;

    /// Gets a shared reference to the component for a specific entity if it is present.
    fn get(&self, entity: EntityHandle) -> Option<&Self::Comp>;

    /// Gets a mutable reference to the component for a specific entity if it is present.
    fn get_mut(&mut self, entity: EntityHandle) -> Option<&mut Self::Comp>;

    /// Whether a component is present for a specific entity.
    fn contains(&self, entity: EntityHandle) -> bool { self.get(entity).is_some() }

    /// Sets or removes the component for a specific entity,
    /// returning the original value if it was present.
    ///
    /// A component left behind by an older version of the same slot is dropped
    /// and never returned.
    fn set(&mut self, entity: EntityHandle, value: Option<Self::Comp>) -> Option<Self::Comp>;

    /// Returns the number of components that exist in this storage.
    fn cardinality(&self) -> usize;

    /// Returns an immutable iterator over the storage, ordered by entity identifier.
    fn iter(&self) -> Iter<'_, Self::Comp>;

    /// Returns a mutable iterator over the storage, ordered by entity identifier.
    fn iter_mut(&mut self) -> IterMut<'_, Self::Comp>;
}
