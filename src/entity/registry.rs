use std::cell::{Cell, RefCell};
use std::mem;
use std::rc::Rc;

use super::{Command, CommandKind, Config, EntityHandle, Entry, Flags, Slots};
use crate::event::Dispatcher;
use crate::system::GameSystem;
use crate::util::invariant;


/// Entity lifecycle events of an [`EntityRegistry`].
#[derive(Default)]
pub struct Events {
    /// Dispatched when a queued creation is processed.
    ///
    /// The entity is not valid yet during the dispatch.
    /// It becomes valid once every receiver has returned `true`.
    /// If any receiver returns `false`, the creation is rolled back:
    /// `entity_destroy` is dispatched for the handle and its slot is freed.
    pub entity_create:  Dispatcher<EntityHandle, bool>,
    /// Dispatched when a queued destruction is processed,
    /// or when a creation is rolled back.
    ///
    /// A destroyed entity is still valid during the dispatch,
    /// while a rolled back entity never becomes valid.
    pub entity_destroy: Dispatcher<EntityHandle>,
}

/// Owns all entity slots and the queue of pending lifecycle commands.
pub struct EntityRegistry {
    config:   Config,
    slots:    RefCell<Slots>,
    commands: RefCell<Vec<Command>>,
    created:  Cell<usize>,
    /// Lifecycle events dispatched by [`process_commands`](Self::process_commands).
    pub events: Events,
}

impl Default for EntityRegistry {
    fn default() -> Self { Self::new(Config::default()) }
}

impl EntityRegistry {
    /// Creates an empty registry.
    pub fn new(config: Config) -> Self {
        let slots = Slots::with_capacity(config.initial_capacity);
        Self {
            config,
            slots: RefCell::new(slots),
            commands: RefCell::default(),
            created: Cell::new(0),
            events: Events::default(),
        }
    }

    /// The configuration of this registry.
    pub fn config(&self) -> &Config { &self.config }

    /// Allocates a slot and queues the creation of an entity in it.
    ///
    /// The returned handle is not valid until the creation is processed.
    pub fn create_entity(&self) -> EntityHandle {
        let handle = self.slots.borrow_mut().allocate();
        self.commands.borrow_mut().push(Command { kind: CommandKind::Create, handle });
        log::trace!("Queued creation of {handle}");
        handle
    }

    /// Queues the destruction of an entity.
    ///
    /// Stale handles and entities already scheduled for destruction are ignored,
    /// so at most one `entity_destroy` event is dispatched per entity.
    pub fn destroy_entity(&self, handle: EntityHandle) {
        {
            let mut slots = self.slots.borrow_mut();
            let Some(entry) = slots.lookup_mut(handle) else {
                log::trace!("Ignoring destruction of stale {handle}");
                return;
            };

            if entry.flags.contains(Flags::DESTROY) {
                return;
            }
            entry.flags |= Flags::DESTROY;
        }

        self.commands.borrow_mut().push(Command { kind: CommandKind::Destroy, handle });
        log::trace!("Queued destruction of {handle}");
    }

    /// Processes queued commands until the queue is empty.
    ///
    /// Commands queued by event handlers during a batch are processed in the next batch.
    pub fn process_commands(&self) {
        let mut passes = 0;

        loop {
            let batch = mem::take(&mut *self.commands.borrow_mut());
            if batch.is_empty() {
                break;
            }

            invariant!(
                passes < self.config.max_command_passes,
                "Entity commands are still being queued after {passes} passes"
            );
            if passes >= self.config.max_command_passes {
                let mut commands = self.commands.borrow_mut();
                let queued = mem::replace(&mut *commands, batch);
                commands.extend(queued);
                break;
            }
            passes += 1;

            log::trace!("Processing {} entity commands (pass {passes})", batch.len());
            for command in batch {
                match command.kind {
                    CommandKind::Create => self.process_create(command.handle),
                    CommandKind::Destroy => self.process_destroy(command.handle),
                }
            }
        }
    }

    fn process_create(&self, handle: EntityHandle) {
        let Some(entry) = self.entity_entry(handle) else { return };
        invariant!(!entry.flags.contains(Flags::CREATED), "{handle} is created twice");

        if !self.events.entity_create.dispatch(handle) {
            log::debug!("Creation of {handle} was rejected, rolling back");
            self.events.entity_destroy.dispatch(handle);
            self.free(handle);
            return;
        }

        let mut slots = self.slots.borrow_mut();
        let Some(entry) = slots.lookup_mut(handle) else { return };
        entry.flags |= Flags::CREATED;
        self.created.set(self.created.get() + 1);
    }

    fn process_destroy(&self, handle: EntityHandle) {
        let Some(entry) = self.entity_entry(handle) else { return };
        invariant!(
            entry.flags.contains(Flags::DESTROY),
            "{handle} is destroyed without being scheduled for destruction"
        );

        self.events.entity_destroy.dispatch(handle);
        self.free(handle);
    }

    fn free(&self, handle: EntityHandle) {
        let was_created = self.is_entity_valid(handle);
        if self.slots.borrow_mut().free(handle) && was_created {
            self.created.set(self.created.get() - 1);
        }
    }

    /// Whether `handle` refers to a created entity whose destruction has not been processed yet.
    pub fn is_entity_valid(&self, handle: EntityHandle) -> bool {
        self.entity_entry(handle).map_or(false, |entry| entry.flags.contains(Flags::CREATED))
    }

    /// The entry of the slot referenced by `handle`, if the handle is current.
    pub fn entity_entry(&self, handle: EntityHandle) -> Option<Entry> {
        self.slots.borrow().lookup(handle).copied()
    }

    /// The number of valid entities.
    pub fn entity_count(&self) -> usize { self.created.get() }

    /// The number of commands waiting for the next [`process_commands`](Self::process_commands).
    pub fn pending_commands(&self) -> usize { self.commands.borrow().len() }

    /// Collects the handles of all valid entities in identifier order.
    pub fn valid_entities(&self) -> Vec<EntityHandle> {
        self.slots
            .borrow()
            .iter()
            .filter(|(_, entry)| entry.flags.contains(Flags::CREATED))
            .map(|(handle, _)| handle)
            .collect()
    }

    /// Destroys every entity and processes all resulting commands.
    ///
    /// Handlers must not create new entities in response.
    pub fn destroy_all_entities(&self) {
        self.process_commands();

        let handles: Vec<_> = self.slots.borrow().iter().map(|(handle, _)| handle).collect();
        log::debug!("Destroying all {} entities", handles.len());
        for handle in handles {
            self.destroy_entity(handle);
        }
        self.process_commands();

        invariant!(
            self.entity_count() == 0 && self.slots.borrow().is_empty(),
            "{} entities remain after destroying all entities",
            self.slots.borrow().len()
        );
    }
}

impl GameSystem for EntityRegistry {
    fn create() -> Rc<Self> { Rc::new(Self::default()) }

    fn on_tick(&self, _time_delta: f32) { self.process_commands(); }

    fn on_destroy(&self) { self.destroy_all_entities(); }
}
