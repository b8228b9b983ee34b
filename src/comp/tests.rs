use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::{Component, ComponentSystem};
use crate::entity::{EntityHandle, EntityRegistry};
use crate::error::ComponentError;
use crate::event::{PriorityPolicy, Receiver, SubscriptionPolicy};
use crate::storage;
use crate::system::Systems;
use crate::test_util::{self, Health, Position, Probe};

fn systems() -> (Systems, Rc<EntityRegistry>, Rc<ComponentSystem>) {
    let systems = test_util::entity_world();
    let entities = systems.locate::<EntityRegistry>().expect("entity registry is declared");
    let components = systems.locate::<ComponentSystem>().expect("component system is declared");
    (systems, entities, components)
}

#[test]
fn test_components_are_initialized_on_entity_creation() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let entity = entities.create_entity();
    let (probe, initialized, dropped) = Probe::new();
    components.create(entity, probe).expect("entity is pending creation");
    components.create(entity, Position(1.0, 2.0)).expect("entity is pending creation");

    assert_eq!(initialized.get(), 0);
    assert_eq!(components.with::<Position, _>(entity, |&pos| pos), None, "entity is not valid yet");

    entities.process_commands();

    assert_eq!(initialized.get(), 1);
    assert_eq!(dropped.get(), 0);
    assert_eq!(components.with::<Position, _>(entity, |&pos| pos), Some(Position(1.0, 2.0)));
    assert_eq!(components.component_count(entity), 2);
}

#[test]
fn test_rejected_initialization_rolls_back_entity() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let destroyed = Rc::new(RefCell::new(Vec::new()));
    let receiver = {
        let destroyed = Rc::clone(&destroyed);
        Receiver::new(move |entity: EntityHandle| destroyed.borrow_mut().push(entity))
    };
    assert!(receiver.subscribe(
        &entities.events.entity_destroy,
        SubscriptionPolicy::default(),
        PriorityPolicy::default()
    ));

    let entity = entities.create_entity();
    let (probe, initialized, dropped) = Probe::new();
    components.create(entity, probe).expect("entity is pending creation");
    components.create(entity, Health(-5)).expect("entity is pending creation");
    components.create(entity, Position(0.0, 0.0)).expect("entity is pending creation");
    entities.process_commands();

    assert!(!entities.is_entity_valid(entity));
    assert_eq!(entities.entity_entry(entity), None);
    assert_eq!(entities.entity_count(), 0);
    assert_eq!(*destroyed.borrow(), vec![entity]);
    assert_eq!(initialized.get(), 1);
    assert_eq!(dropped.get(), 1);
    assert_eq!(components.component_count(entity), 0);
    assert!(components.pool::<Health>().read().is_empty());
    assert!(components.pool::<Position>().read().is_empty());
}

#[test]
fn test_destroyed_entity_releases_components() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let [a, b] = [(); 2].map(|()| entities.create_entity());
    let (probe, _, dropped) = Probe::new();
    components.create(a, probe).expect("entity is pending creation");
    components.create(a, Health(3)).expect("entity is pending creation");
    components.create(b, Health(4)).expect("entity is pending creation");
    entities.process_commands();

    entities.destroy_entity(a);
    assert_eq!(
        components.with::<Health, _>(a, |health| health.0),
        Some(3),
        "destruction has not been processed yet"
    );
    entities.process_commands();

    assert_eq!(dropped.get(), 1);
    assert_eq!(components.component_count(a), 0);
    assert_eq!(components.with::<Health, _>(b, |health| health.0), Some(4));
    let remaining: Vec<_> =
        components.pool::<Health>().read().iter().map(|(entity, health)| (entity, *health)).collect();
    assert_eq!(remaining, vec![(b, Health(4))]);
}

#[test]
fn test_create_on_created_entity_initializes_immediately() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let entity = entities.create_entity();
    entities.process_commands();

    let (probe, initialized, _) = Probe::new();
    components.create(entity, probe).expect("entity is created");
    assert_eq!(initialized.get(), 1);

    assert_eq!(
        components.create(entity, Health(-1)),
        Err(ComponentError::InitializationFailed {
            entity,
            component: std::any::type_name::<Health>(),
        })
    );
    assert!(!components.pool::<Health>().read().contains(entity));
    assert!(entities.is_entity_valid(entity), "a failed component does not reject the entity");
}

#[test]
fn test_create_errors() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let entity = entities.create_entity();
    entities.process_commands();

    components.create(entity, Health(1)).expect("entity is created");
    assert_eq!(
        components.create(entity, Health(2)),
        Err(ComponentError::AlreadyPresent { entity, component: std::any::type_name::<Health>() })
    );
    assert_eq!(components.with::<Health, _>(entity, |health| health.0), Some(1));

    entities.destroy_entity(entity);
    assert_eq!(
        components.create(entity, Position(0.0, 0.0)),
        Err(ComponentError::EntityDestroyed(entity))
    );

    entities.process_commands();
    assert_eq!(
        components.create(entity, Position(0.0, 0.0)),
        Err(ComponentError::InvalidEntity(entity))
    );
    assert_eq!(
        components.create(EntityHandle::INVALID, Position(0.0, 0.0)),
        Err(ComponentError::InvalidEntity(EntityHandle::INVALID))
    );
}

#[test]
fn test_destroy_component_and_mutate() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let entity = entities.create_entity();
    components.create(entity, Position(1.0, 1.0)).expect("entity is pending creation");
    entities.process_commands();

    assert_eq!(components.with_mut::<Position, _>(entity, |pos| pos.0 += 2.0), Some(()));
    assert_eq!(components.destroy::<Position>(entity), Some(Position(3.0, 1.0)));
    assert_eq!(components.destroy::<Position>(entity), None);
    assert_eq!(components.with_mut::<Position, _>(entity, |pos| pos.0), None);
}

#[test]
fn test_pools_are_registered_on_demand() {
    test_util::init();

    let (_systems, _, components) = systems();
    assert_eq!(components.pool_count(), 0);

    let first = components.register::<Position>();
    let second = components.pool::<Position>();
    components.pool::<Health>();
    assert_eq!(components.pool_count(), 2);

    assert!(Rc::ptr_eq(&first.pool, &second.pool));
}

/// Copies the position of the same entity during initialization.
struct Anchor(Option<Position>);

impl Component for Anchor {
    type Storage = storage::Tree<Self>;

    fn on_initialize(&mut self, components: &ComponentSystem, entity: EntityHandle) -> bool {
        self.0 = components.with::<Position, _>(entity, |&pos| pos);
        self.0.is_some()
    }
}

#[test]
fn test_initialization_reads_sibling_pools() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let [with_position, without_position] = [(); 2].map(|()| entities.create_entity());
    components.create(with_position, Position(4.0, 5.0)).expect("entity is pending creation");
    components.create(with_position, Anchor(None)).expect("entity is pending creation");
    components.create(without_position, Anchor(None)).expect("entity is pending creation");
    entities.process_commands();

    assert_eq!(
        components.with::<Anchor, _>(with_position, |anchor| anchor.0),
        Some(Some(Position(4.0, 5.0)))
    );
    assert!(!entities.is_entity_valid(without_position));
}

#[test]
#[should_panic = "is already locked mutably"]
fn test_read_while_writing_panics() {
    test_util::init();

    let (_systems, _, components) = systems();
    let pool = components.pool::<Position>();
    let _write = pool.write();
    let _read = pool.read();
}

#[test]
fn test_components_are_dropped_with_systems() {
    test_util::init();

    let dropped = {
        let (systems, entities, components) = systems();
        let entity = entities.create_entity();
        let (probe, _, dropped) = Probe::new();
        components.create(entity, probe).expect("entity is pending creation");
        entities.process_commands();

        drop((entities, components));
        drop(systems);
        dropped
    };

    assert_eq!(dropped.get(), 1);
}

#[test]
fn test_initialization_runs_in_registration_order() {
    test_util::init();

    thread_local! {
        static ORDER: RefCell<Vec<&'static str>> = RefCell::new(Vec::new());
    }

    struct First;
    impl Component for First {
        type Storage = storage::Vec<Self>;

        fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool {
            ORDER.with(|order| order.borrow_mut().push("first"));
            true
        }
    }

    struct Second(Rc<Cell<bool>>);
    impl Component for Second {
        type Storage = storage::Vec<Self>;

        fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool {
            ORDER.with(|order| order.borrow_mut().push("second"));
            self.0.set(true);
            true
        }
    }

    let (_systems, entities, components) = systems();
    components.register::<First>();
    components.register::<Second>();

    let entity = entities.create_entity();
    let initialized = Rc::new(Cell::new(false));
    components.create(entity, Second(Rc::clone(&initialized))).expect("entity is pending creation");
    components.create(entity, First).expect("entity is pending creation");
    entities.process_commands();

    assert!(initialized.get());
    ORDER.with(|order| assert_eq!(*order.borrow(), vec!["first", "second"]));
}

/// Adds a [`Spawned`] component to its entity during initialization.
struct Spawner(Rc<Cell<usize>>);

impl Component for Spawner {
    type Storage = storage::Vec<Self>;

    fn on_initialize(&mut self, components: &ComponentSystem, entity: EntityHandle) -> bool {
        components.create(entity, Spawned(Rc::clone(&self.0))).is_ok()
    }
}

/// Counts its initializations.
struct Spawned(Rc<Cell<usize>>);

impl Component for Spawned {
    type Storage = storage::Tree<Self>;

    fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool {
        self.0.set(self.0.get() + 1);
        true
    }
}

#[test]
fn test_sibling_added_during_initialization_is_initialized_once() {
    test_util::init();

    let registrations: [fn(&ComponentSystem); 3] = [
        |components| {
            components.register::<Spawner>();
            components.register::<Spawned>();
        },
        |components| {
            components.register::<Spawned>();
            components.register::<Spawner>();
        },
        |components| {
            components.register::<Spawner>();
        },
    ];

    for (case, register) in registrations.into_iter().enumerate() {
        let (_systems, entities, components) = systems();
        register(&components);

        let entity = entities.create_entity();
        let calls = Rc::new(Cell::new(0));
        components.create(entity, Spawner(Rc::clone(&calls))).expect("entity is pending creation");
        entities.process_commands();

        assert!(entities.is_entity_valid(entity), "case {case}");
        assert_eq!(calls.get(), 1, "case {case}");
        assert_eq!(components.pool_count(), 2, "case {case}");
        assert_eq!(components.component_count(entity), 2, "case {case}");
    }
}

#[test]
fn test_entity_is_not_valid_during_initialization() {
    test_util::init();

    struct Observer {
        entities: Rc<EntityRegistry>,
        observed: Rc<RefCell<Vec<(bool, usize)>>>,
    }
    impl Component for Observer {
        type Storage = storage::Tree<Self>;

        fn on_initialize(&mut self, _: &ComponentSystem, entity: EntityHandle) -> bool {
            let valid = self.entities.is_entity_valid(entity);
            self.observed.borrow_mut().push((valid, self.entities.entity_count()));
            false
        }
    }

    let (_systems, entities, components) = systems();
    let observed = Rc::new(RefCell::new(Vec::new()));
    let entity = entities.create_entity();
    let observer = Observer { entities: Rc::clone(&entities), observed: Rc::clone(&observed) };
    components.create(entity, observer).expect("entity is pending creation");
    entities.process_commands();

    assert_eq!(*observed.borrow(), vec![(false, 0)]);
    assert!(!entities.is_entity_valid(entity));
    assert_eq!(entities.entity_count(), 0);
}

#[test]
fn test_queries_do_not_register_pools() {
    test_util::init();

    let (_systems, entities, components) = systems();
    let entity = entities.create_entity();
    components.create(entity, Position(1.0, 0.0)).expect("entity is pending creation");
    entities.process_commands();
    assert_eq!(components.pool_count(), 1);

    assert_eq!(components.with::<Health, _>(entity, |health| health.0), None);
    assert_eq!(components.with_mut::<Health, _>(entity, |health| health.0), None);
    assert_eq!(components.destroy::<Health>(entity), None);
    assert!(components.find_pool::<Health>().is_none());
    assert_eq!(components.pool_count(), 1);

    assert!(components.find_pool::<Position>().is_some());
}
