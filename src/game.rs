//! The game runtime built on top of the entity and component layers.
//!
//! An [`Instance`] owns the default systems and any gameplay systems,
//! and a [`Framework`] drives an instance frame by frame.
//!
//! ```
//! use entwine::game::{Instance, Transform};
//!
//! let instance = Instance::create().unwrap();
//! let entity = instance.entities().create_entity();
//! instance.components().create(entity, Transform::default()).unwrap();
//!
//! instance.tick(0.1);
//! assert!(instance.entities().is_entity_valid(entity));
//! instance.identity().set_entity_name(entity, "player", false).unwrap();
//! assert_eq!(instance.identity().entity_by_name("player"), Ok(entity));
//! ```

mod identity;
pub use identity::IdentitySystem;

mod instance;
pub use instance::{Instance, InstanceBuilder};

mod interpolation;
pub use interpolation::{InterpolationSystem, Pose, Transform};

mod timer;
pub use timer::TickTimer;

mod framework;
pub use framework::{FrameEvents, Framework};
