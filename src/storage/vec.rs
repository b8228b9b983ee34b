use std::mem::MaybeUninit;

use bitvec::prelude::BitVec;
use xias::Xias;

use super::{Iter, IterMut, Storage};
use crate::entity::EntityHandle;

/// The basic storage indexed by entity identifiers directly.
///
/// Suitable for components that most entities have.
pub struct VecStorage<C> {
    cardinality: usize,
    bits:        BitVec,
    versions:    Vec<u32>,
    data:        Vec<MaybeUninit<C>>,
}

impl<C> VecStorage<C> {
    fn bit(&self, index: usize) -> bool {
        match self.bits.get(index) {
            Some(bit) => *bit,
            None => false,
        }
    }

    fn set_bit(&mut self, index: usize, bit: bool) {
        if self.bits.len() <= index {
            self.bits.resize(index + 1, false);
        }

        let delta_old = match *self.bits.get(index).expect("resized len >= index+1") {
            false => 0,
            true => 1,
        };
        let delta_new = match bit {
            false => 0,
            true => 1,
        };
        self.bits.set(index, bit);

        // split into two separate statements to avoid integer underflow
        self.cardinality -= delta_old;
        self.cardinality += delta_new;
    }

    /// The index of `entity` if a component of the same version is stored there.
    fn occupied(&self, entity: EntityHandle) -> Option<usize> {
        let index = entity.identifier().small_int::<usize>();
        (self.bit(index) && self.versions[index] == entity.version()).then_some(index)
    }

    /// Moves the component at `index` out and clears its bit.
    fn take(&mut self, index: usize) -> C {
        let value = self.data.get(index).expect("bits mismatch");
        // Safety: the bit at `index` is set, and it is cleared right after the value is moved out.
        let value = unsafe { value.assume_init_read() };
        self.set_bit(index, false);
        value
    }
}

impl<C> Default for VecStorage<C> {
    fn default() -> Self {
        Self { cardinality: 0, bits: BitVec::new(), versions: Vec::new(), data: Vec::new() }
    }
}

impl<C: 'static> Storage for VecStorage<C> {
    type Comp = C;

    fn get(&self, entity: EntityHandle) -> Option<&C> {
        let index = self.occupied(entity)?;
        let value = self.data.get(index).expect("bits mismatch");
        // Safety: `occupied` checked the bit.
        Some(unsafe { value.assume_init_ref() })
    }

    fn get_mut(&mut self, entity: EntityHandle) -> Option<&mut C> {
        let index = self.occupied(entity)?;
        let value = self.data.get_mut(index).expect("bits mismatch");
        // Safety: `occupied` checked the bit.
        Some(unsafe { value.assume_init_mut() })
    }

    fn set(&mut self, entity: EntityHandle, new: Option<C>) -> Option<C> {
        let index = entity.identifier().small_int::<usize>();

        let old = if self.bit(index) {
            let current = self.versions[index] == entity.version();
            if !current && new.is_none() {
                // the slot belongs to another version of the entity
                return None;
            }
            let old = self.take(index);
            current.then_some(old)
        } else {
            None
        };

        // the original value was already moved out, now we can overwrite the data or leave it unmarked
        if let Some(new) = new {
            if self.data.len() <= index {
                self.data.resize_with(index + 1, MaybeUninit::uninit);
                self.versions.resize(index + 1, 0);
            }
            *self.data.get_mut(index).expect("just resized") = MaybeUninit::new(new);
            *self.versions.get_mut(index).expect("just resized") = entity.version();
            self.set_bit(index, true);
        }

        old
    }

    fn cardinality(&self) -> usize { self.cardinality }

    fn iter(&self) -> Iter<'_, C> {
        let versions = &self.versions;
        let data = &self.data;

        Box::new(self.bits.iter_ones().map(move |index| {
            let entity = EntityHandle::new(index.small_int(), versions[index]);
            let value = data.get(index).expect("bits mismatch");
            // Safety: the bit at `index` is set.
            (entity, unsafe { value.assume_init_ref() })
        }))
    }

    fn iter_mut(&mut self) -> IterMut<'_, C> {
        let bits = &self.bits;

        Box::new(self.data.iter_mut().zip(&self.versions).enumerate().filter_map(
            move |(index, (value, &version))| {
                if !bits.get(index).map_or(false, |bit| *bit) {
                    return None;
                }
                let entity = EntityHandle::new(index.small_int(), version);
                // Safety: the bit at `index` is set.
                Some((entity, unsafe { value.assume_init_mut() }))
            },
        ))
    }
}

impl<C> Drop for VecStorage<C> {
    fn drop(&mut self) {
        for index in self.bits.iter_ones() {
            if let Some(value) = self.data.get_mut(index) {
                // Safety: the bit at `index` is set, and the storage is never used again.
                unsafe { value.assume_init_drop() };
            }
        }
    }
}
