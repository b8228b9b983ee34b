//! Game systems and the registry that wires them together.
//!
//! A game system is a long-lived service such as the [`EntityRegistry`](crate::entity::EntityRegistry)
//! or the [`ComponentSystem`](crate::comp::ComponentSystem).
//! Systems are declared on a [`Builder`], created together,
//! then attached to each other in declaration order by [`Systems::finalize`].
//! During attachment a system locates the siblings it depends on by type
//! and subscribes to their events.
//! After that, [`Systems::tick`] ticks every system in declaration order.

use std::any::{Any, TypeId};
use std::cell::Cell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::{AttachError, StartupError};
use crate::util::{invariant, DbgTypeId};

#[cfg(test)]
mod tests;

/// A long-lived service owned by a [`Systems`] registry.
///
/// Systems are shared through [`Rc`] and only receive `&self` after creation,
/// so mutable state lives in cells.
/// A system that subscribes to events should capture a [`Weak`](std::rc::Weak) reference to itself
/// in its receivers to avoid reference cycles.
pub trait GameSystem: 'static {
    /// Creates the system with its default configuration.
    fn create() -> Rc<Self>
    where
        Self: Sized;

    /// Locates sibling systems and subscribes to their events.
    ///
    /// Called once, in declaration order, after every system has been created.
    /// Returning an error aborts the startup of the registry.
    fn on_attach(self: Rc<Self>, systems: &Systems) -> Result<(), AttachError> {
        let _ = systems;
        Ok(())
    }

    /// Advances the system by `time_delta` seconds.
    fn on_tick(&self, time_delta: f32) { let _ = time_delta; }

    /// Called in reverse declaration order when the registry is destroyed,
    /// while all siblings are still alive.
    fn on_destroy(&self) {}
}

/// The lifecycle of a [`Systems`] registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum Lifecycle {
    /// Systems are being declared on a [`Builder`].
    Uninitialized,
    /// All systems have been created but not attached.
    Created,
    /// All systems have been attached.
    Finalized,
    /// The systems have been ticked at least once.
    Ticking,
    /// The systems have been destroyed.
    Destroyed,
}

struct Entry {
    system: Rc<dyn GameSystem>,
    any:    Rc<dyn Any>,
}

impl Entry {
    fn new<S: GameSystem>(system: Rc<S>) -> Self {
        Self { system: Rc::clone(&system) as Rc<dyn GameSystem>, any: system }
    }
}

type Factory = Box<dyn FnOnce() -> Entry>;

/// Declares the systems of a [`Systems`] registry.
#[derive(Default)]
pub struct Builder {
    factories: Vec<(DbgTypeId, Factory)>,
}

impl Builder {
    /// Declares a system created by [`GameSystem::create`].
    pub fn with<S: GameSystem>(mut self) -> Self {
        self.factories.push((DbgTypeId::of::<S>(), Box::new(|| Entry::new(S::create()))));
        self
    }

    /// Declares an already created system.
    pub fn insert<S: GameSystem>(mut self, system: Rc<S>) -> Self {
        self.factories.push((DbgTypeId::of::<S>(), Box::new(move || Entry::new(system))));
        self
    }

    /// Appends the declarations of `other` after those of `self`.
    pub fn extend(mut self, other: Self) -> Self {
        self.factories.extend(other.factories);
        self
    }

    /// Whether the system type `S` has been declared.
    pub fn contains<S: GameSystem>(&self) -> bool {
        self.factories.iter().any(|(ty, _)| ty.id == TypeId::of::<S>())
    }

    /// Creates all declared systems in declaration order.
    ///
    /// The returned registry is in the [`Lifecycle::Created`] state.
    pub fn create(self) -> Result<Systems, StartupError> {
        let mut entries = IndexMap::with_capacity(self.factories.len());

        for (ty, factory) in self.factories {
            if entries.contains_key(&ty) {
                return Err(StartupError::DuplicateSystem(ty.name));
            }

            log::trace!("Creating game system {ty}");
            entries.insert(ty, factory());
        }

        Ok(Systems { entries, state: Cell::new(Lifecycle::Created) })
    }
}

/// Owns a set of game systems keyed by type.
pub struct Systems {
    entries: IndexMap<DbgTypeId, Entry>,
    state:   Cell<Lifecycle>,
}

impl Systems {
    /// Starts declaring a registry.
    pub fn builder() -> Builder { Builder::default() }

    /// The current lifecycle state.
    pub fn state(&self) -> Lifecycle { self.state.get() }

    /// The number of systems.
    pub fn len(&self) -> usize { self.entries.len() }

    /// Whether there are no systems.
    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    /// The type names of all systems in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.keys().map(|ty| ty.name)
    }

    /// Locates the system of type `S`.
    pub fn locate<S: GameSystem>(&self) -> Option<Rc<S>> {
        let entry = self.entries.get(&TypeId::of::<S>())?;
        Some(Rc::clone(&entry.any).downcast::<S>().ok().expect("TypeId mismatch"))
    }

    /// Locates the system of type `S`, failing attachment if it is missing.
    pub fn require<S: GameSystem>(&self) -> Result<Rc<S>, AttachError> {
        self.locate::<S>().ok_or_else(|| AttachError::MissingDependency(std::any::type_name::<S>()))
    }

    /// Attaches every system in declaration order.
    ///
    /// The first attachment error aborts finalization
    /// and leaves the registry in the [`Lifecycle::Created`] state.
    pub fn finalize(&self) -> Result<(), StartupError> {
        let state = self.state.get();
        if state != Lifecycle::Created {
            return Err(StartupError::InvalidTransition { action: "finalize", state });
        }

        for (ty, entry) in &self.entries {
            Rc::clone(&entry.system)
                .on_attach(self)
                .map_err(|source| StartupError::Attach { system: ty.name, source })?;
            log::trace!("Attached game system {ty}");
        }

        self.state.set(Lifecycle::Finalized);
        log::debug!("Finalized game systems: {}", self.names().join(", "));
        Ok(())
    }

    /// Ticks every system in declaration order.
    pub fn tick(&self, time_delta: f32) {
        let state = self.state.get();
        invariant!(
            matches!(state, Lifecycle::Finalized | Lifecycle::Ticking),
            "cannot tick game systems in the {state} state"
        );
        if !matches!(state, Lifecycle::Finalized | Lifecycle::Ticking) {
            return;
        }

        self.state.set(Lifecycle::Ticking);
        for entry in self.entries.values() {
            entry.system.on_tick(time_delta);
        }
    }

    /// Calls [`GameSystem::on_destroy`] on every system in reverse declaration order.
    ///
    /// Destroying an already destroyed registry has no effect.
    pub fn destroy(&self) {
        if self.state.get() == Lifecycle::Destroyed {
            return;
        }

        for (ty, entry) in self.entries.iter().rev() {
            log::trace!("Destroying game system {ty}");
            entry.system.on_destroy();
        }

        self.state.set(Lifecycle::Destroyed);
    }
}

impl Drop for Systems {
    fn drop(&mut self) {
        self.destroy();

        // dependents hold their dependencies, so release them first
        while self.entries.pop().is_some() {}
    }
}

impl fmt::Debug for Systems {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Systems")
            .field("state", &self.state.get())
            .field("systems", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}
