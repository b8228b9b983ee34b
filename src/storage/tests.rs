use std::rc::Rc;

use crate::entity::EntityHandle;
use crate::Storage;

macro_rules! test_storage {
    ($module:ident => $storage:ident) => {
        mod $module {
            use std::rc::Rc;

            use crate::storage::$storage as Backend;

            crate::storage::tests::test_storage! { @Backend<i64> =>
                test_single_small_hole
                test_single_big_hole_with_reinsertion
                test_stale_version_is_invisible
                test_newer_version_replaces_stale
                test_iter_mut_updates_in_place
            }

            #[test]
            fn test_drop_releases_components() {
                crate::test_util::init();
                crate::storage::tests::test_drop_releases_components::<Backend<Rc<()>>>();
            }
        }
    };
    (@$storage:ty => $($(#[$meta:meta])* $tests:ident)*) => {
        $(
            $(#[$meta])*
            #[test]
            fn $tests() {
                crate::test_util::init();
                crate::storage::tests::$tests::<$storage>();
            }
        )*
    };
}

pub(crate) use test_storage;

test_storage!(vec => Vec);
test_storage!(tree => Tree);

fn entity(identifier: u32) -> EntityHandle { EntityHandle::new(identifier, 1) }

fn items<S: Storage<Comp = i64>>(storage: &mut S) -> Vec<(u32, i64)> {
    let items: Vec<_> =
        storage.iter().map(|(entity, value)| (entity.identifier(), *value)).collect();
    let items_mut: Vec<_> =
        storage.iter_mut().map(|(entity, value)| (entity.identifier(), *value)).collect();
    assert_eq!(items, items_mut);
    items
}

pub(super) fn test_single_small_hole<S: Storage<Comp = i64>>() {
    let mut storage = S::default();
    for i in 1..=10 {
        assert_eq!(storage.set(entity(i), Some(i64::from(i))), None);
    }

    for i in 1..=10 {
        assert_eq!(storage.get(entity(i)), Some(&i64::from(i)));
    }

    assert_eq!(storage.set(entity(3), None), Some(3));
    assert!(!storage.contains(entity(3)));
    for i in (1..3).chain(4..=10) {
        assert_eq!(storage.get(entity(i)), Some(&i64::from(i)));
    }

    assert_eq!(storage.cardinality(), 9);
    assert_eq!(
        items(&mut storage),
        vec![(1, 1), (2, 2), (4, 4), (5, 5), (6, 6), (7, 7), (8, 8), (9, 9), (10, 10)]
    );
}

pub(super) fn test_single_big_hole_with_reinsertion<S: Storage<Comp = i64>>() {
    let mut storage = S::default();
    for i in 1..=10 {
        storage.set(entity(i), Some(i64::from(i)));
    }

    for i in 3..6 {
        storage.set(entity(i), None);
    }
    assert_eq!(storage.set(entity(4), Some(40)), None);
    assert_eq!(storage.set(entity(4), Some(4)), Some(40));

    for i in (1..3).chain(6..=10) {
        assert_eq!(storage.get(entity(i)), Some(&i64::from(i)));
    }

    assert_eq!(storage.cardinality(), 8);
    assert_eq!(
        items(&mut storage),
        vec![(1, 1), (2, 2), (4, 4), (6, 6), (7, 7), (8, 8), (9, 9), (10, 10)]
    );
}

pub(super) fn test_stale_version_is_invisible<S: Storage<Comp = i64>>() {
    let mut storage = S::default();
    let current = EntityHandle::new(2, 3);
    let stale = EntityHandle::new(2, 2);
    storage.set(current, Some(7));

    assert_eq!(storage.get(stale), None);
    assert_eq!(storage.get_mut(stale), None);
    assert!(!storage.contains(stale));
    assert_eq!(storage.set(stale, None), None);
    assert_eq!(storage.get(current), Some(&7));
    assert_eq!(storage.cardinality(), 1);
}

pub(super) fn test_newer_version_replaces_stale<S: Storage<Comp = i64>>() {
    let mut storage = S::default();
    let stale = EntityHandle::new(5, 1);
    let current = EntityHandle::new(5, 2);
    storage.set(stale, Some(1));

    assert_eq!(storage.set(current, Some(2)), None);
    assert_eq!(storage.get(current), Some(&2));
    assert_eq!(storage.get(stale), None);
    assert_eq!(storage.cardinality(), 1);

    let handles: Vec<_> = storage.iter().map(|(entity, _)| entity).collect();
    assert_eq!(handles, vec![current]);
}

pub(super) fn test_iter_mut_updates_in_place<S: Storage<Comp = i64>>() {
    let mut storage = S::default();
    for i in [2, 3, 5, 8] {
        storage.set(entity(i), Some(i64::from(i)));
    }

    for (_, value) in storage.iter_mut() {
        *value *= 10;
    }
    if let Some(value) = storage.get_mut(entity(3)) {
        *value += 1;
    }

    assert_eq!(items(&mut storage), vec![(2, 20), (3, 31), (5, 50), (8, 80)]);
}

pub(super) fn test_drop_releases_components<S: Storage<Comp = Rc<()>>>() {
    let counter = Rc::new(());
    let mut storage = S::default();
    for i in 1..=4 {
        storage.set(entity(i), Some(Rc::clone(&counter)));
    }
    storage.set(EntityHandle::new(2, 2), Some(Rc::clone(&counter)));
    drop(storage.set(entity(3), None));
    assert_eq!(Rc::strong_count(&counter), 4);

    drop(storage);
    assert_eq!(Rc::strong_count(&counter), 1);
}
