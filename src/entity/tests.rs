use std::collections::HashSet;

use super::{EntityHandle, Flags};
use crate::test_util;

static_assertions::assert_impl_all!(EntityHandle: Copy, Ord, std::hash::Hash, Send, Sync);
static_assertions::assert_not_impl_any!(super::EntityRegistry: Send, Sync);

#[test]
fn test_invalid_handle() {
    test_util::init();

    assert_eq!(EntityHandle::default(), EntityHandle::INVALID);
    assert!(!EntityHandle::INVALID.is_nonnull());
    assert!(EntityHandle::new(1, 1).is_nonnull());
}

#[test]
fn test_handles_differ_by_version() {
    test_util::init();

    let old = EntityHandle::new(3, 1);
    let new = EntityHandle::new(3, 2);

    assert_ne!(old, new);
    assert_eq!(old.identifier(), new.identifier());
    assert!(old < new);
    assert_eq!(HashSet::from([old, new, old]).len(), 2);
    assert_eq!(format!("{new}"), "Entity(3v2)");
}

#[test]
fn test_flags() {
    test_util::init();

    let mut flags = Flags::EXISTS;
    assert!(!flags.is_unused());
    assert!(!flags.contains(Flags::CREATED));

    flags |= Flags::CREATED;
    assert!(flags.contains(Flags::EXISTS | Flags::CREATED));
    assert!(!flags.contains(Flags::DESTROY));
    assert!(flags.contains(Flags::UNUSED));

    assert_eq!(format!("{flags:?}"), "{Exists, Created}");
    assert_eq!(format!("{:?}", Flags::default()), "Unused");
}
