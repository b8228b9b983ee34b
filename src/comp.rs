//! Components are per-entity data stored in one [`Pool`] per component type.
//!
//! Pools are owned by the [`ComponentSystem`],
//! which listens to the entity lifecycle events of the
//! [`EntityRegistry`](crate::entity::EntityRegistry):
//! when an entity is created, every component attached to it is initialized,
//! and when it is destroyed, every component is dropped.

use crate::entity::EntityHandle;
use crate::storage::Storage;

mod pool;
pub use pool::{Pool, PoolHandle};
pub(crate) use pool::AnyPool;

mod system;
pub use system::ComponentSystem;

#[cfg(test)]
mod tests;

/// Per-entity data.
///
/// # Example
/// ```
/// use entwine::comp::{Component, ComponentSystem};
/// use entwine::entity::EntityHandle;
/// use entwine::storage;
///
/// struct Velocity([f32; 2]);
///
/// impl Component for Velocity {
///     type Storage = storage::Vec<Self>;
///
///     fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool {
///         self.0.iter().all(|axis| axis.is_finite())
///     }
/// }
/// ```
pub trait Component: Sized + 'static {
    /// The storage backing the pool of this component type.
    type Storage: Storage<Comp = Self>;

    /// Called once when the owning entity is created,
    /// or immediately when the component is added to an already created entity.
    ///
    /// Returning `false` rejects the creation of the entity.
    /// The entity is not valid yet during its creation,
    /// but its components are accessible through `components`,
    /// except those of this component type, whose pool is locked mutably during the call.
    fn on_initialize(&mut self, components: &ComponentSystem, entity: EntityHandle) -> bool {
        let _ = (components, entity);
        true
    }
}
