//! Recoverable errors reported by the runtime.

use thiserror::Error;

use crate::entity::EntityHandle;
use crate::system::Lifecycle;

/// Errors that abort the startup of a [`Systems`](crate::system::Systems) registry.
#[derive(Error, Debug)]
pub enum StartupError {
    /// The same system type was declared twice.
    #[error("game system {0} is declared more than once")]
    DuplicateSystem(&'static str),

    /// A system failed to attach to its siblings.
    #[error("game system {system} failed to attach")]
    Attach {
        /// The system that failed.
        system: &'static str,
        /// Why it failed.
        #[source]
        source: AttachError,
    },

    /// The registry is not in a state that allows the operation.
    #[error("cannot {action} game systems in the {state} state")]
    InvalidTransition {
        /// The attempted operation.
        action: &'static str,
        /// The state of the registry.
        state:  Lifecycle,
    },
}

/// Errors returned by [`GameSystem::on_attach`](crate::system::GameSystem::on_attach).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttachError {
    /// A system this one depends on is not registered.
    #[error("required game system {0} is not registered")]
    MissingDependency(&'static str),

    /// The system has already been attached once.
    #[error("game system is already attached")]
    AlreadyAttached,

    /// Subscribing to an event failed.
    #[error("failed to subscribe to {0}")]
    Subscription(&'static str),
}

/// Errors returned when adding components through a
/// [`ComponentSystem`](crate::comp::ComponentSystem).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ComponentError {
    /// The handle does not refer to an allocated entity.
    #[error("{0} does not refer to an existing entity")]
    InvalidEntity(EntityHandle),

    /// The entity is scheduled for destruction.
    #[error("{0} is scheduled for destruction")]
    EntityDestroyed(EntityHandle),

    /// The entity already has a component of this type.
    #[error("{entity} already has a {component} component")]
    AlreadyPresent {
        /// The entity.
        entity:    EntityHandle,
        /// The component type name.
        component: &'static str,
    },

    /// The component refused to initialize for an already created entity.
    #[error("{component} failed to initialize for {entity}")]
    InitializationFailed {
        /// The entity.
        entity:    EntityHandle,
        /// The component type name.
        component: &'static str,
    },
}

/// Errors returned when naming an entity through the
/// [`IdentitySystem`](crate::game::IdentitySystem).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NamingError {
    /// The entity is not valid.
    #[error("cannot name {0} because it is not a valid entity")]
    InvalidEntity(EntityHandle),

    /// The name is already used by another entity.
    #[error("the name {name:?} is already used by {owner}")]
    ReservedName {
        /// The requested name.
        name:  String,
        /// The entity currently using the name.
        owner: EntityHandle,
    },
}

/// Errors returned when changing the groups of an entity through the
/// [`IdentitySystem`](crate::game::IdentitySystem).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GroupingError {
    /// The entity is not valid.
    #[error("cannot group {0} because it is not a valid entity")]
    InvalidEntity(EntityHandle),

    /// The group name is empty.
    #[error("group names must not be empty")]
    InvalidGroup,
}

/// Errors returned by identity lookups.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    /// The queried entity is not valid.
    #[error("{0} is not a valid entity")]
    InvalidEntity(EntityHandle),

    /// The entity has no name or belongs to no group.
    #[error("{0} has no identity of the requested kind")]
    EntityNotFound(EntityHandle),

    /// No entity has the name.
    #[error("no entity is named {0:?}")]
    NameNotFound(String),

    /// No entity belongs to the group.
    #[error("no entity belongs to the group {0:?}")]
    GroupNotFound(String),
}
