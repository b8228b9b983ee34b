use std::cell::{OnceCell, RefCell};
use std::collections::{BTreeSet, HashMap};
use std::iter;
use std::rc::{Rc, Weak};

use itertools::Itertools;

use crate::entity::{EntityHandle, EntityRegistry};
use crate::error::{AttachError, GroupingError, LookupError, NamingError};
use crate::event::{PriorityPolicy, Receiver, SubscriptionPolicy};
use crate::system::{GameSystem, Systems};


#[derive(Default)]
struct Lookups {
    entity_names:   HashMap<EntityHandle, String>,
    name_entities:  HashMap<String, EntityHandle>,
    entity_groups:  HashMap<EntityHandle, BTreeSet<String>>,
    group_entities: HashMap<String, BTreeSet<EntityHandle>>,
}

impl Lookups {
    fn unregister_name(&mut self, entity: EntityHandle) -> Option<String> {
        let name = self.entity_names.remove(&entity)?;
        self.name_entities.remove(&name);
        Some(name)
    }

    fn unregister_group(&mut self, entity: EntityHandle, group: &str) -> bool {
        let Some(groups) = self.entity_groups.get_mut(&entity) else { return false };
        if !groups.remove(group) {
            return false;
        }
        if groups.is_empty() {
            self.entity_groups.remove(&entity);
        }

        if let Some(members) = self.group_entities.get_mut(group) {
            members.remove(&entity);
            if members.is_empty() {
                self.group_entities.remove(group);
            }
        }

        true
    }

    fn unregister_groups(&mut self, entity: EntityHandle) {
        let groups = self.entity_groups.remove(&entity).unwrap_or_default();
        for group in &groups {
            if let Some(members) = self.group_entities.get_mut(group) {
                members.remove(&entity);
                if members.is_empty() {
                    self.group_entities.remove(group);
                }
            }
        }
    }
}

#[auto_enums::auto_enum(Iterator)]
fn groups_of<'t>(lookups: &'t Lookups, entity: EntityHandle) -> impl Iterator<Item = &'t str> + 't {
    match lookups.entity_groups.get(&entity) {
        Some(groups) => groups.iter().map(String::as_str),
        None => iter::empty(),
    }
}

/// Manages entity names and groups and allows entities to be looked up by them.
///
/// Names are unique across entities, while an entity may belong to any number of groups.
/// Both are released when the entity is destroyed.
pub struct IdentitySystem {
    entities:       OnceCell<Rc<EntityRegistry>>,
    lookups:        RefCell<Lookups>,
    entity_destroy: Receiver<EntityHandle>,
}

impl IdentitySystem {
    /// Creates an identity system that is not attached yet.
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|this: &Weak<Self>| {
            let this = this.clone();
            Self {
                entities:       OnceCell::new(),
                lookups:        RefCell::default(),
                entity_destroy: Receiver::new(move |entity| {
                    if let Some(system) = this.upgrade() {
                        system.on_entity_destroy(entity);
                    }
                }),
            }
        })
    }

    fn is_entity_valid(&self, entity: EntityHandle) -> bool {
        self.entities
            .get()
            .expect("identity system is used before being attached")
            .is_entity_valid(entity)
    }

    /// Names `entity`, replacing its previous name.
    ///
    /// If another entity already uses `name`, the call fails unless `force` is set,
    /// in which case the other entity loses its name.
    /// An empty name removes the name of the entity.
    pub fn set_entity_name(
        &self,
        entity: EntityHandle,
        name: impl Into<String>,
        force: bool,
    ) -> Result<(), NamingError> {
        if !self.is_entity_valid(entity) {
            return Err(NamingError::InvalidEntity(entity));
        }

        let name = name.into();
        let mut lookups = self.lookups.borrow_mut();

        if name.is_empty() {
            lookups.unregister_name(entity);
            return Ok(());
        }

        match lookups.name_entities.get(&name) {
            Some(&owner) if owner == entity => return Ok(()),
            Some(&owner) if !force => return Err(NamingError::ReservedName { name, owner }),
            Some(&owner) => {
                log::debug!("Name {name:?} is taken over from {owner} by {entity}");
                lookups.unregister_name(owner);
            }
            None => {}
        }

        lookups.unregister_name(entity);
        lookups.name_entities.insert(name.clone(), entity);
        lookups.entity_names.insert(entity, name);
        Ok(())
    }

    /// Finds the entity named `name`.
    pub fn entity_by_name(&self, name: &str) -> Result<EntityHandle, LookupError> {
        self.lookups
            .borrow()
            .name_entities
            .get(name)
            .copied()
            .ok_or_else(|| LookupError::NameNotFound(name.to_owned()))
    }

    /// The name of `entity`.
    pub fn entity_name(&self, entity: EntityHandle) -> Result<String, LookupError> {
        if !self.is_entity_valid(entity) {
            return Err(LookupError::InvalidEntity(entity));
        }

        self.lookups
            .borrow()
            .entity_names
            .get(&entity)
            .cloned()
            .ok_or(LookupError::EntityNotFound(entity))
    }

    /// The number of named entities.
    pub fn named_entity_count(&self) -> usize { self.lookups.borrow().entity_names.len() }

    /// Adds `entity` to `group`.
    ///
    /// Adding an entity to a group it already belongs to has no effect.
    pub fn set_entity_group(&self, entity: EntityHandle, group: &str) -> Result<(), GroupingError> {
        if !self.is_entity_valid(entity) {
            return Err(GroupingError::InvalidEntity(entity));
        }
        if group.is_empty() {
            return Err(GroupingError::InvalidGroup);
        }

        let mut lookups = self.lookups.borrow_mut();
        lookups.entity_groups.entry(entity).or_default().insert(group.to_owned());
        lookups.group_entities.entry(group.to_owned()).or_default().insert(entity);
        Ok(())
    }

    /// Removes `entity` from `group`.
    ///
    /// Removing an entity from a group it does not belong to has no effect.
    pub fn clear_entity_group(&self, entity: EntityHandle, group: &str) -> Result<(), GroupingError> {
        if !self.is_entity_valid(entity) {
            return Err(GroupingError::InvalidEntity(entity));
        }
        if group.is_empty() {
            return Err(GroupingError::InvalidGroup);
        }

        self.lookups.borrow_mut().unregister_group(entity, group);
        Ok(())
    }

    /// The members of `group` in handle order.
    pub fn entities_by_group(&self, group: &str) -> Result<Vec<EntityHandle>, LookupError> {
        let lookups = self.lookups.borrow();
        let members = lookups
            .group_entities
            .get(group)
            .ok_or_else(|| LookupError::GroupNotFound(group.to_owned()))?;
        Ok(members.iter().copied().collect())
    }

    /// The groups of `entity` in lexicographic order.
    pub fn entity_groups(&self, entity: EntityHandle) -> Result<Vec<String>, LookupError> {
        if !self.is_entity_valid(entity) {
            return Err(LookupError::InvalidEntity(entity));
        }

        let lookups = self.lookups.borrow();
        let groups: Vec<_> = groups_of(&lookups, entity).map(str::to_owned).collect();
        if groups.is_empty() {
            return Err(LookupError::EntityNotFound(entity));
        }
        Ok(groups)
    }

    /// Whether `entity` belongs to `group`.
    pub fn is_entity_in_group(&self, entity: EntityHandle, group: &str) -> bool {
        let lookups = self.lookups.borrow();
        let found = groups_of(&lookups, entity).any(|other| other == group);
        found
    }

    /// The number of groups `entity` belongs to.
    pub fn entity_group_count(&self, entity: EntityHandle) -> usize {
        let lookups = self.lookups.borrow();
        let count = groups_of(&lookups, entity).count();
        count
    }

    /// The number of entities belonging to at least one group.
    pub fn grouped_entity_count(&self) -> usize { self.lookups.borrow().entity_groups.len() }

    /// The number of non-empty groups.
    pub fn group_count(&self) -> usize { self.lookups.borrow().group_entities.len() }

    fn on_entity_destroy(&self, entity: EntityHandle) {
        let mut lookups = self.lookups.borrow_mut();
        if let Some(name) = lookups.unregister_name(entity) {
            log::trace!("Released name {name:?} of {entity}");
        }
        if lookups.entity_groups.contains_key(&entity) {
            log::trace!(
                "Released groups {} of {entity}",
                groups_of(&lookups, entity).join(", ")
            );
            lookups.unregister_groups(entity);
        }
    }
}

impl GameSystem for IdentitySystem {
    fn create() -> Rc<Self> { Self::new() }

    fn on_attach(self: Rc<Self>, systems: &Systems) -> Result<(), AttachError> {
        let entities = systems.require::<EntityRegistry>()?;

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
