//! A single-threaded entity/component runtime for games.
//!
//! # Entities
//! Entities are versioned handles allocated by the [`EntityRegistry`].
//! Creating and destroying an entity only queues a command;
//! commands are applied in batches when the registry is ticked,
//! so that the rest of a tick always observes a stable set of entities.
//! A handle to a destroyed entity never becomes valid again,
//! even when its slot is reused.
//!
//! # Components
//! Components are plain data stored in one pool per type,
//! backed by a [`Storage`] of the component's choice.
//! The [`ComponentSystem`](comp::ComponentSystem) initializes the components of an entity
//! when its creation is processed,
//! and any component may reject the creation, which rolls the entity back.
//!
//! # Events
//! Systems communicate through [`event::Dispatcher`]s.
//! A [`event::Receiver`] is an intrusive node that unlinks itself when dropped,
//! and subscribers may subscribe or unsubscribe anything, themselves included,
//! from inside a handler without disturbing the dispatch in progress.
//!
//! # Systems
//! [`GameSystem`]s are long-lived services created and attached together by a [`Systems`]
//! registry, then ticked in declaration order.
//! [`game::Instance`] bundles the default systems with gameplay systems,
//! and [`game::Framework`] drives an instance at a fixed timestep.
//!
//! # Runtime checks
//! Violated runtime invariants, such as an event handler that keeps queueing entity commands,
//! panic when the `debug-checks` feature (default) is enabled in debug builds
//! or the `release-checks` feature is enabled in release builds,
//! and are only logged otherwise.

#![cfg_attr(not(debug_assertions), deny(missing_docs))]
#![cfg_attr(doc, warn(missing_docs))]

pub mod comp;

pub mod entity;
pub use entity::{EntityHandle, EntityRegistry};

pub mod error;

pub mod event;

pub mod game;

pub mod storage;
pub use storage::Storage;

pub mod system;
pub use system::{GameSystem, Systems};

#[cfg(any(test, feature = "internal-bench"))]
pub mod test_util;

pub mod util;
