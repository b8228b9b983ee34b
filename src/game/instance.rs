use std::cell::RefCell;
use std::fmt;
use std::mem;
use std::rc::Rc;

use super::{IdentitySystem, InterpolationSystem};
use crate::comp::ComponentSystem;
use crate::entity::{self, EntityRegistry};
use crate::error::StartupError;
use crate::event::{Broker, Queue};
use crate::system::{self, GameSystem, Systems};

/// Configures an [`Instance`] before creating it.
pub struct InstanceBuilder {
    config:  entity::Config,
    systems: system::Builder,
    broker:  Broker,
}

impl InstanceBuilder {
    /// Sets the configuration of the entity registry.
    pub fn config(mut self, config: entity::Config) -> Self {
        self.config = config;
        self
    }

    /// Declares a gameplay system after the default systems.
    pub fn with_system<S: GameSystem>(mut self) -> Self {
        self.systems = self.systems.with::<S>();
        self
    }

    /// Declares an already created gameplay system after the default systems.
    pub fn insert_system<S: GameSystem>(mut self, system: Rc<S>) -> Self {
        self.systems = self.systems.insert(system);
        self
    }

    /// Registers an event type that can be posted to the instance.
    pub fn with_event<E: Clone + 'static>(mut self) -> Self {
        self.broker.register::<E>();
        self
    }

    /// Creates and finalizes all systems.
    pub fn create(self) -> Result<Instance, StartupError> {
        let systems = Systems::builder()
            .insert(Rc::new(EntityRegistry::new(self.config)))
            .with::<ComponentSystem>()
            .with::<IdentitySystem>()
            .with::<InterpolationSystem>()
            .extend(self.systems)
            .create()?;
        systems.finalize()?;

        log::info!("Created game instance with {} systems", systems.len());
        Ok(Instance { systems, queue: RefCell::default(), broker: self.broker })
    }
}

/// A running game world: its systems and its event broker.
///
/// The default systems are, in tick order,
/// [`EntityRegistry`], [`ComponentSystem`], [`IdentitySystem`] and [`InterpolationSystem`],
/// followed by the gameplay systems declared on the [`InstanceBuilder`].
pub struct Instance {
    systems: Systems,
    queue:   RefCell<Queue>,
    broker:  Broker,
}

impl Instance {
    /// Creates an instance with only the default systems.
    pub fn create() -> Result<Self, StartupError> { Self::builder().create() }

    /// Configures a new instance.
    pub fn builder() -> InstanceBuilder {
        InstanceBuilder {
            config:  entity::Config::default(),
            systems: Systems::builder(),
            broker:  Broker::new(),
        }
    }

    /// Ticks every system, then delivers the events posted so far.
    ///
    /// Events posted during delivery are delivered on the next tick.
    pub fn tick(&self, time_delta: f32) {
        self.systems.tick(time_delta);

        let mut queue = mem::take(&mut *self.queue.borrow_mut());
        let undelivered = self.broker.flush(&mut queue);
        if undelivered > 0 {
            log::warn!("{undelivered} posted events had no registered event type");
        }
    }

    /// Queues an event for delivery at the end of the next tick.
    pub fn post<E: 'static>(&self, event: E) { self.queue.borrow_mut().push(event); }

    /// The number of events waiting for delivery.
    pub fn pending_events(&self) -> usize { self.queue.borrow().len() }

    /// The event types registered on the [`InstanceBuilder`].
    pub fn events(&self) -> &Broker { &self.broker }

    /// All systems of this instance.
    pub fn systems(&self) -> &Systems { &self.systems }

    /// Locates a system by type.
    pub fn locate<S: GameSystem>(&self) -> Option<Rc<S>> { self.systems.locate::<S>() }

    fn default_system<S: GameSystem>(&self) -> Rc<S> {
        self.systems.locate::<S>().expect("default systems are registered on creation")
    }

    /// The entity registry.
    pub fn entities(&self) -> Rc<EntityRegistry> { self.default_system() }

    /// The component system.
    pub fn components(&self) -> Rc<ComponentSystem> { self.default_system() }

    /// The identity system.
    pub fn identity(&self) -> Rc<IdentitySystem> { self.default_system() }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("systems", &self.systems)
            .field("events", &self.broker)
            .field("pending_events", &self.pending_events())
            .finish()
    }
}
