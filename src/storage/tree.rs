use std::collections::BTreeMap;

use super::{Iter, IterMut, Storage};
use crate::entity::EntityHandle;

/// A storage based on [`BTreeMap`].
///
/// Suitable for components that only a few entities have.
pub struct Tree<C> {
    data: BTreeMap<u32, Slot<C>>,
}

struct Slot<C> {
    version: u32,
    value:   C,
}

impl<C> Default for Tree<C> {
    fn default() -> Self { Self { data: BTreeMap::new() } }
}

impl<C: 'static> Storage for Tree<C> {
    type Comp = C;

    fn get(&self, entity: EntityHandle) -> Option<&C> {
        let slot = self.data.get(&entity.identifier())?;
        (slot.version == entity.version()).then_some(&slot.value)
    }

    fn get_mut(&mut self, entity: EntityHandle) -> Option<&mut C> {
        let slot = self.data.get_mut(&entity.identifier())?;
        (slot.version == entity.version()).then_some(&mut slot.value)
    }

    fn set(&mut self, entity: EntityHandle, new: Option<C>) -> Option<C> {
        let identifier = entity.identifier();
        let old = match new {
            Some(value) => self.data.insert(identifier, Slot { version: entity.version(), value }),
            None => match self.data.get(&identifier) {
                Some(slot) if slot.version == entity.version() => self.data.remove(&identifier),
                _ => None,
            },
        };

        old.filter(|slot| slot.version == entity.version()).map(|slot| slot.value)
    }

    fn cardinality(&self) -> usize { self.data.len() }

    fn iter(&self) -> Iter<'_, C> {
        Box::new(
            self.data
                .iter()
                .map(|(&identifier, slot)| (EntityHandle::new(identifier, slot.version), &slot.value)),
        )
    }

    fn iter_mut(&mut self) -> IterMut<'_, C> {
        Box::new(self.data.iter_mut().map(|(&identifier, slot)| {
            (EntityHandle::new(identifier, slot.version), &mut slot.value)
        }))
    }
}
