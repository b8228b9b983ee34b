use std::any::{self, Any};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

use super::{Component, ComponentSystem};
use crate::entity::EntityHandle;
use crate::storage::{self, Storage};

/// All components of type `C`.
pub struct Pool<C: Component> {
    storage: C::Storage,
}

impl<C: Component> Default for Pool<C> {
    fn default() -> Self { Self { storage: C::Storage::default() } }
}

impl<C: Component> Pool<C> {
    /// Gets the component of `entity`.
    pub fn get(&self, entity: EntityHandle) -> Option<&C> { self.storage.get(entity) }

    /// Gets the component of `entity` mutably.
    pub fn get_mut(&mut self, entity: EntityHandle) -> Option<&mut C> { self.storage.get_mut(entity) }

    /// Whether `entity` has a component in this pool.
    pub fn contains(&self, entity: EntityHandle) -> bool { self.storage.contains(entity) }

    /// Stores `value` for `entity` unless it already has a component.
    ///
    /// Returns the stored component, or `None` if one was already present.
    /// The component is not initialized by this call.
    pub fn create(&mut self, entity: EntityHandle, value: C) -> Option<&mut C> {
        if self.storage.contains(entity) {
            return None;
        }

        self.storage.set(entity, Some(value));
        self.storage.get_mut(entity)
    }

    /// Removes and returns the component of `entity`.
    pub fn destroy(&mut self, entity: EntityHandle) -> Option<C> { self.storage.set(entity, None) }

    /// Iterates over all components in entity identifier order.
    pub fn iter(&self) -> storage::Iter<'_, C> { self.storage.iter() }

    /// Iterates mutably over all components in entity identifier order.
    pub fn iter_mut(&mut self) -> storage::IterMut<'_, C> { self.storage.iter_mut() }

    /// The number of components.
    pub fn len(&self) -> usize { self.storage.cardinality() }

    /// Whether the pool holds no components.
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

impl<'t, C: Component> IntoIterator for &'t Pool<C> {
    type Item = (EntityHandle, &'t C);
    type IntoIter = storage::Iter<'t, C>;

    fn into_iter(self) -> Self::IntoIter { self.iter() }
}

impl<C: Component> fmt::Debug for Pool<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pool")
            .field("component", &any::type_name::<C>())
            .field("len", &self.len())
            .finish()
    }
}

/// A shared reference to a [`Pool`] owned by a [`ComponentSystem`].
pub struct PoolHandle<C: Component> {
    pub(super) pool: Rc<RefCell<Pool<C>>>,
}

impl<C: Component> PoolHandle<C> {
    /// Locks the pool for reading.
    ///
    /// # Panics
    /// Panics if the pool is currently locked for writing,
    /// e.g. when called from [`Component::on_initialize`] of the same type.
    pub fn read(&self) -> Ref<'_, Pool<C>> {
        match self.pool.try_borrow() {
            Ok(pool) => pool,
            Err(_) => panic!(
                "Component pool of {} is already locked mutably",
                any::type_name::<C>()
            ),
        }
    }

    /// Locks the pool for writing.
    ///
    /// # Panics
    /// Panics if the pool is currently locked.
    pub fn write(&self) -> RefMut<'_, Pool<C>> {
        match self.pool.try_borrow_mut() {
            Ok(pool) => pool,
            Err(_) => panic!("Component pool of {} is already locked", any::type_name::<C>()),
        }
    }
}

impl<C: Component> Clone for PoolHandle<C> {
    fn clone(&self) -> Self { Self { pool: Rc::clone(&self.pool) } }
}

/// Type-erased operations on a pool.
pub(crate) trait AnyPool {
    fn type_name(&self) -> &'static str;

    /// Initializes the component of `entity` if it has one.
    fn initialize_component(&self, components: &ComponentSystem, entity: EntityHandle) -> bool;

    /// Drops the component of `entity` if it has one.
    fn destroy_component(&self, entity: EntityHandle);

    fn contains(&self, entity: EntityHandle) -> bool;

    fn as_any(self: Rc<Self>) -> Rc<dyn Any>;
}

impl<C: Component> AnyPool for RefCell<Pool<C>> {
    fn type_name(&self) -> &'static str { any::type_name::<C>() }

    fn initialize_component(&self, components: &ComponentSystem, entity: EntityHandle) -> bool {
        let mut pool = match self.try_borrow_mut() {
            Ok(pool) => pool,
            Err(_) => panic!("Component pool of {} is already locked", any::type_name::<C>()),
        };

        match pool.get_mut(entity) {
            Some(component) => component.on_initialize(components, entity),
            None => true,
        }
    }

    fn destroy_component(&self, entity: EntityHandle) {
        let removed = match self.try_borrow_mut() {
            Ok(mut pool) => pool.destroy(entity),
            Err(_) => panic!("Component pool of {} is already locked", any::type_name::<C>()),
        };
        drop(removed);
    }

    fn contains(&self, entity: EntityHandle) -> bool {
        self.try_borrow().map_or(false, |pool| pool.contains(entity))
    }

    fn as_any(self: Rc<Self>) -> Rc<dyn Any> { self }
}
