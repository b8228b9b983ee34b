use std::any::{self, TypeId};
use std::cell::{Cell, OnceCell, RefCell};
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use super::{AnyPool, Component, Pool, PoolHandle};
use crate::entity::{EntityHandle, EntityRegistry, Flags};
use crate::error::{AttachError, ComponentError};
use crate::event::{PriorityPolicy, Receiver, SubscriptionPolicy};
use crate::system::{GameSystem, Systems};
use crate::util::DbgTypeId;

/// Owns one [`Pool`] per component type and ties components to entity lifecycles.
pub struct ComponentSystem {
    entities:       OnceCell<Rc<EntityRegistry>>,
    pools:          RefCell<IndexMap<DbgTypeId, Rc<dyn AnyPool>>>,
    /// The entity whose creation is being processed,
    /// and the index of the pool currently initializing it.
    initializing:   Cell<Option<(EntityHandle, usize)>>,
    entity_create:  Receiver<EntityHandle, bool>,
    entity_destroy: Receiver<EntityHandle>,
}

impl ComponentSystem {
    /// Creates a component system without any pools.
    ///
    /// It has to be attached to an [`EntityRegistry`] through a [`Systems`] registry
    /// before components can be added.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let on_create = this.clone();
            let on_destroy = this.clone();

            Self {
                entities:       OnceCell::new(),
                pools:          RefCell::default(),
                initializing:   Cell::new(None),
                entity_create:  Receiver::new(move |entity| {
                    on_create.upgrade().map_or(true, |system| system.on_entity_create(entity))
                }),
                entity_destroy: Receiver::new(move |entity| {
                    if let Some(system) = on_destroy.upgrade() {
                        system.on_entity_destroy(entity);
                    }
                }),
            }
        })
    }

    fn entities(&self) -> &EntityRegistry {
        self.entities.get().expect("component system is used before being attached")
    }

    fn erased_pools(&self) -> Vec<Rc<dyn AnyPool>> { self.pools.borrow().values().cloned().collect() }

    fn erased_pool_at(&self, index: usize) -> Option<Rc<dyn AnyPool>> {
        self.pools.borrow().get_index(index).map(|(_, pool)| Rc::clone(pool))
    }

    fn downcast<C: Component>(erased: Rc<dyn AnyPool>) -> PoolHandle<C> {
        let pool = erased.as_any().downcast::<RefCell<Pool<C>>>().ok().expect("TypeId mismatch");
        PoolHandle { pool }
    }

    /// Registers the pool for `C` if it does not exist yet, and returns it.
    pub fn register<C: Component>(&self) -> PoolHandle<C> {
        let erased = {
            let mut pools = self.pools.borrow_mut();
            let erased = pools.entry(DbgTypeId::of::<C>()).or_insert_with(|| {
                log::trace!("Registering component pool of {}", any::type_name::<C>());
                Rc::new(RefCell::new(Pool::<C>::default()))
            });
            Rc::clone(erased)
        };

        Self::downcast(erased)
    }

    /// The pool of `C`, created on demand.
    pub fn pool<C: Component>(&self) -> PoolHandle<C> { self.register::<C>() }

    /// The pool of `C` if it has been registered.
    pub fn find_pool<C: Component>(&self) -> Option<PoolHandle<C>> {
        let erased = Rc::clone(self.pools.borrow().get(&TypeId::of::<C>())?);
        Some(Self::downcast(erased))
    }

    /// The number of registered pools.
    pub fn pool_count(&self) -> usize { self.pools.borrow().len() }

    /// Whether components of `entity` can be accessed:
    /// the entity is valid or its creation is being processed.
    fn is_accessible(&self, entity: EntityHandle) -> bool {
        self.entities().is_entity_valid(entity)
            || self.initializing.get().map_or(false, |(initializing, _)| initializing == entity)
    }

    /// Whether the pool of `C` has already been visited by the initialization of `entity`.
    fn is_initialization_past<C: Component>(&self, entity: EntityHandle) -> bool {
        match self.initializing.get() {
            Some((initializing, cursor)) if initializing == entity => self
                .pools
                .borrow()
                .get_index_of(&TypeId::of::<C>())
                .map_or(false, |index| index <= cursor),
            _ => false,
        }
    }

    /// Adds a component to an entity.
    ///
    /// A component added to an entity whose creation is still pending
    /// is initialized when the creation is processed.
    /// A component added to an already created entity is initialized immediately,
    /// and removed again if it fails to initialize.
    /// The same applies to a component added during the initialization of its entity
    /// if the pool of `C` has already been initialized for that entity.
    pub fn create<C: Component>(&self, entity: EntityHandle, value: C) -> Result<(), ComponentError> {
        let entry = self.entities().entity_entry(entity).ok_or(ComponentError::InvalidEntity(entity))?;
        if entry.flags.contains(Flags::DESTROY) {
            return Err(ComponentError::EntityDestroyed(entity));
        }

        let pool = self.pool::<C>();
        if pool.write().create(entity, value).is_none() {
            return Err(ComponentError::AlreadyPresent { entity, component: any::type_name::<C>() });
        }

        if entry.flags.contains(Flags::CREATED) || self.is_initialization_past::<C>(entity) {
            let initialized = {
                let mut pool = pool.write();
                let component = pool.get_mut(entity).expect("component was just created");
                component.on_initialize(self, entity)
            };

            if !initialized {
                let removed = pool.write().destroy(entity);
                drop(removed);
                return Err(ComponentError::InitializationFailed {
                    entity,
                    component: any::type_name::<C>(),
                });
            }
        }

        Ok(())
    }

    /// Removes the component `C` of `entity`.
    pub fn destroy<C: Component>(&self, entity: EntityHandle) -> Option<C> {
        let pool = self.find_pool::<C>()?;
        let removed = pool.write().destroy(entity);
        removed
    }

    /// Calls `f` with the component `C` of a valid entity.
    ///
    /// Components of an entity are also accessible while it is being initialized.
    pub fn with<C: Component, R>(&self, entity: EntityHandle, f: impl FnOnce(&C) -> R) -> Option<R> {
        if !self.is_accessible(entity) {
            return None;
        }

        let pool = self.find_pool::<C>()?;
        let pool = pool.read();
        let result = pool.get(entity).map(f);
        result
    }

    /// Calls `f` with the component `C` of a valid entity mutably.
    pub fn with_mut<C: Component, R>(
        &self,
        entity: EntityHandle,
        f: impl FnOnce(&mut C) -> R,
    ) -> Option<R> {
        if !self.is_accessible(entity) {
            return None;
        }

        let pool = self.find_pool::<C>()?;
        let mut pool = pool.write();
        let result = pool.get_mut(entity).map(f);
        result
    }

    /// Counts the pools holding a component of `entity`.
    pub fn component_count(&self, entity: EntityHandle) -> usize {
        self.erased_pools().iter().filter(|pool| pool.contains(entity)).count()
    }

    /// Initializes every component of a newly created entity in pool registration order.
    ///
    /// Returns `false` as soon as a component rejects the entity.
    /// Pools registered during the initialization are visited too.
    pub fn on_entity_create(&self, entity: EntityHandle) -> bool {
        let outer = self.initializing.get();

        let mut index = 0;
        let accepted = loop {
            let Some(pool) = self.erased_pool_at(index) else { break true };

            self.initializing.set(Some((entity, index)));
            if !pool.initialize_component(self, entity) {
                log::debug!("{} rejected the creation of {entity}", pool.type_name());
                break false;
            }
            index += 1;
        };

        self.initializing.set(outer);
        accepted
    }

    /// Drops every component of a destroyed entity.
    pub fn on_entity_destroy(&self, entity: EntityHandle) {
        for pool in self.erased_pools() {
            pool.destroy_component(entity);
        }
    }
}

impl GameSystem for ComponentSystem {
    fn create() -> Rc<Self> { Self::new() }

    fn on_attach(self: Rc<Self>, systems: &Systems) -> Result<(), AttachError> {
        let entities = systems.require::<EntityRegistry>()?;

        if !self.entity_create.subscribe(
            &entities.events.entity_create,
            SubscriptionPolicy::RejectIfSubscribed,
            PriorityPolicy::InsertBack,
        ) {
            return Err(AttachError::Subscription("entity_create"));
        }
        if !self.entity_destroy.subscribe(
            &entities.events.entity_destroy,
            SubscriptionPolicy::RejectIfSubscribed,
            PriorityPolicy::InsertBack,
        ) {
            return Err(AttachError::Subscription("entity_destroy"));
        }

        self.entities.set(entities).map_err(|_| AttachError::AlreadyAttached)
    }
}
