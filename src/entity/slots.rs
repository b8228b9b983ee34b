use std::collections::VecDeque;

use xias::Xias;

use super::{EntityHandle, Entry, Flags};
use crate::util::invariant;

mod recycler;
pub use recycler::Recycler;

#[cfg(test)]
mod tests;

/// A table of entity slots indexed by identifier.
///
/// Freed identifiers are handed back through the recycler `R`,
/// which decides the order in which slots are reused.
/// The default FIFO recycler delays the reuse of a slot as long as possible.
pub struct Slots<R: Recycler = VecDeque<u32>> {
    entries:  Vec<Entry>,
    recycler: R,
    used:     usize,
}

impl<R: Recycler> Default for Slots<R> {
    fn default() -> Self { Self::with_capacity(0) }
}

impl<R: Recycler> Slots<R> {
    /// Creates a slot table with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Self { entries: Vec::with_capacity(capacity), recycler: R::default(), used: 0 }
    }

    /// Allocates a slot and returns a handle to it.
    ///
    /// The slot is flagged as [`Flags::EXISTS`].
    pub fn allocate(&mut self) -> EntityHandle {
        let identifier = match self.recycler.poll() {
            Some(identifier) => identifier,
            None => {
                self.entries.push(Entry { flags: Flags::UNUSED, version: 0 });
                self.entries.len().small_int::<u32>()
            }
        };

        let entry = self.entry_mut(identifier).expect("recycled identifiers are in range");
        invariant!(entry.flags.is_unused(), "recycled slot {identifier} is still in use");

        entry.version = entry.version.wrapping_add(1).max(1);
        entry.flags = Flags::EXISTS;
        let version = entry.version;
        self.used += 1;

        EntityHandle::new(identifier, version)
    }

    /// Frees the slot referenced by `handle`.
    ///
    /// Returns `false` if `handle` does not refer to a used slot.
    pub fn free(&mut self, handle: EntityHandle) -> bool {
        let Some(entry) = self.lookup_mut(handle) else { return false };

        entry.flags = Flags::UNUSED;
        self.used -= 1;
        self.recycler.extend([handle.identifier()]);
        true
    }

    /// Gets the entry referenced by `handle` if the slot is used by the same version.
    pub fn lookup(&self, handle: EntityHandle) -> Option<&Entry> {
        let entry = self.entry(handle.identifier())?;
        (!entry.flags.is_unused() && entry.version == handle.version()).then_some(entry)
    }

    /// Gets the entry referenced by `handle` mutably if the slot is used by the same version.
    pub fn lookup_mut(&mut self, handle: EntityHandle) -> Option<&mut Entry> {
        let entry = self.entry_mut(handle.identifier())?;
        (!entry.flags.is_unused() && entry.version == handle.version()).then_some(entry)
    }

    /// The number of used slots.
    pub fn len(&self) -> usize { self.used }

    /// Whether no slot is used.
    pub fn is_empty(&self) -> bool { self.used == 0 }

    /// The total number of slots ever allocated, including free ones.
    pub fn capacity(&self) -> usize { self.entries.len() }

    /// Iterates over the handles and entries of all used slots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityHandle, &Entry)> + '_ {
        self.entries.iter().enumerate().filter(|(_, entry)| !entry.flags.is_unused()).map(
            |(index, entry)| (EntityHandle::new((index + 1).small_int(), entry.version), entry),
        )
    }

    fn entry(&self, identifier: u32) -> Option<&Entry> {
        let index = identifier.checked_sub(1)?;
        self.entries.get(index.small_int::<usize>())
    }

    fn entry_mut(&mut self, identifier: u32) -> Option<&mut Entry> {
        let index = identifier.checked_sub(1)?;
        self.entries.get_mut(index.small_int::<usize>())
    }
}
