//! Entities are identified by versioned handles into a slot table.
//!
//! Creation and destruction are deferred:
//! [`EntityRegistry::create_entity`] and [`EntityRegistry::destroy_entity`] only queue a
//! [`Command`], and [`EntityRegistry::process_commands`] applies queued commands in batches,
//! dispatching the `entity_create` and `entity_destroy` events of [`Events`].
//!
//! A handle is valid from the batch that processes its creation
//! until the batch that processes its destruction.
//! Slots are recycled with a bumped version,
//! so a handle to a destroyed entity never becomes valid again.

use std::fmt;
use std::ops;

mod slots;
pub use slots::{Recycler, Slots};

mod registry;
pub use registry::{EntityRegistry, Events};

#[cfg(test)]
mod tests;

/// A versioned reference to an entity slot.
///
/// The default handle is the invalid handle,
/// which never refers to any entity.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityHandle {
    identifier: u32,
    version:    u32,
}

impl EntityHandle {
    /// The handle that never refers to an entity.
    pub const INVALID: Self = Self { identifier: 0, version: 0 };

    pub(crate) const fn new(identifier: u32, version: u32) -> Self { Self { identifier, version } }

    /// The slot this handle refers to. Identifiers start from 1.
    pub fn identifier(self) -> u32 { self.identifier }

    /// The version of the slot at the time this handle was issued.
    pub fn version(self) -> u32 { self.version }

    /// Whether this handle could refer to an entity at all.
    ///
    /// This does not check whether the entity is alive;
    /// use [`EntityRegistry::is_entity_valid`] for that.
    pub fn is_nonnull(self) -> bool { self.identifier != 0 }
}

impl fmt::Debug for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({}v{})", self.identifier, self.version)
    }
}

impl fmt::Display for EntityHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Debug::fmt(self, f) }
}

static_assertions::assert_eq_size!(EntityHandle, u64);

/// The lifecycle state of an entity slot.
///
/// The empty set means the slot is unused.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct Flags(u8);

impl Flags {
    /// The slot is free.
    pub const UNUSED: Self = Self(0);
    /// The slot has been allocated for an entity.
    pub const EXISTS: Self = Self(1 << 0);
    /// The entity has been created and its handle is valid.
    pub const CREATED: Self = Self(1 << 1);
    /// The entity has been scheduled for destruction.
    pub const DESTROY: Self = Self(1 << 2);

    /// Whether every flag of `other` is set.
    pub fn contains(self, other: Self) -> bool { self.0 & other.0 == other.0 }

    /// Whether no flag is set.
    pub fn is_unused(self) -> bool { self.0 == 0 }
}

impl ops::BitOr for Flags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self { Self(self.0 | rhs.0) }
}

impl ops::BitOrAssign for Flags {
    fn bitor_assign(&mut self, rhs: Self) { self.0 |= rhs.0; }
}

impl fmt::Debug for Flags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_unused() {
            return f.write_str("Unused");
        }

        let mut set = f.debug_set();
        for (flag, name) in
            [(Self::EXISTS, "Exists"), (Self::CREATED, "Created"), (Self::DESTROY, "Destroy")]
        {
            if self.contains(flag) {
                set.entry(&format_args!("{name}"));
            }
        }
        set.finish()
    }
}

/// The state of an entity slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    /// The lifecycle state of the slot.
    pub flags:   Flags,
    /// The current version of the slot.
    pub version: u32,
}

/// Whether a [`Command`] creates or destroys its entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Dispatch `entity_create` and mark the entity as created if no receiver rejects it.
    Create,
    /// Dispatch `entity_destroy` and free the slot.
    Destroy,
}

/// A queued entity lifecycle change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Command {
    /// The kind of change.
    pub kind:   CommandKind,
    /// The entity the change applies to.
    pub handle: EntityHandle,
}

/// Configuration of an [`EntityRegistry`].
#[derive(Debug, Clone)]
pub struct Config {
    /// The maximum number of batches a single [`EntityRegistry::process_commands`] call drains.
    ///
    /// Event handlers that keep queueing commands beyond this limit
    /// violate a runtime invariant.
    pub max_command_passes: usize,
    /// The number of entity slots to reserve up front.
    pub initial_capacity:   usize,
}

impl Default for Config {
    fn default() -> Self { Self { max_command_passes: 100, initial_capacity: 0 } }
}
