use std::collections::{BTreeSet, VecDeque};

use super::{Recycler, Slots};
use crate::entity::{EntityHandle, Flags};
use crate::test_util;

fn reuse_order<R: Recycler>() -> Vec<u32> {
    let mut slots = Slots::<R>::default();
    let handles: Vec<_> = (0..5).map(|_| slots.allocate()).collect();

    for index in [3, 0, 4] {
        assert!(slots.free(handles[index]));
    }

    (0..3).map(|_| slots.allocate().identifier()).collect()
}

#[test]
fn test_identifiers_start_from_one() {
    test_util::init();

    let mut slots = Slots::<VecDeque<u32>>::default();
    let first = slots.allocate();
    let second = slots.allocate();

    assert_eq!((first.identifier(), first.version()), (1, 1));
    assert_eq!((second.identifier(), second.version()), (2, 1));
    assert_eq!(slots.len(), 2);
    assert_eq!(slots.lookup(first).map(|entry| entry.flags), Some(Flags::EXISTS));
}

#[test]
fn test_fifo_reuse() {
    test_util::init();

    assert_eq!(reuse_order::<VecDeque<u32>>(), vec![4, 1, 5]);
}

#[test]
fn test_lifo_reuse() {
    test_util::init();

    assert_eq!(reuse_order::<Vec<u32>>(), vec![5, 1, 4]);
}

#[test]
fn test_lowest_first_reuse() {
    test_util::init();

    assert_eq!(reuse_order::<BTreeSet<u32>>(), vec![1, 4, 5]);
}

#[test]
fn test_reuse_bumps_version() {
    test_util::init();

    let mut slots = Slots::<Vec<u32>>::default();
    let old = slots.allocate();
    assert!(slots.free(old));
    assert!(!slots.free(old));

    let new = slots.allocate();
    assert_eq!(new.identifier(), old.identifier());
    assert_eq!(new.version(), old.version() + 1);
    assert!(slots.lookup(old).is_none());
    assert!(slots.lookup(new).is_some());
}

#[test]
fn test_version_skips_zero_on_wrap() {
    test_util::init();

    let mut slots = Slots::<Vec<u32>>::default();
    let handle = slots.allocate();
    slots.entries[0].version = u32::MAX;
    assert!(slots.free(EntityHandle::new(handle.identifier(), u32::MAX)));

    let wrapped = slots.allocate();
    assert_eq!(wrapped.version(), 1);
}

#[test]
fn test_invalid_handles() {
    test_util::init();

    let mut slots = Slots::<VecDeque<u32>>::default();
    slots.allocate();

    assert!(slots.lookup(EntityHandle::INVALID).is_none());
    assert!(slots.lookup(EntityHandle::new(7, 1)).is_none());
    assert!(!slots.free(EntityHandle::new(7, 1)));
}

#[test]
fn test_iter_skips_free_slots() {
    test_util::init();

    let mut slots = Slots::<VecDeque<u32>>::with_capacity(4);
    let handles: Vec<_> = (0..4).map(|_| slots.allocate()).collect();
    slots.free(handles[1]);

    let live: Vec<_> = slots.iter().map(|(handle, _)| handle).collect();
    assert_eq!(live, vec![handles[0], handles[2], handles[3]]);
    assert_eq!(slots.capacity(), 4);
    assert_eq!(slots.len(), 3);
}
