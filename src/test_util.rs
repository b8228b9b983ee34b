#![allow(missing_docs)]

use parking_lot::Once;

use crate::comp::ComponentSystem;
use crate::entity::EntityRegistry;
use crate::system::Systems;

mod event_tracer;
pub use event_tracer::EventTracer;

mod comps;
pub use comps::{Health, Position, Probe};

pub(crate) fn init() {
    static SET_LOGGER_ONCE: Once = Once::new();
    SET_LOGGER_ONCE.call_once(env_logger::init);
}

/// Creates and finalizes a registry holding only the entity registry and the component system.
pub fn entity_world() -> Systems {
    let systems = Systems::builder()
        .with::<EntityRegistry>()
        .with::<ComponentSystem>()
        .create()
        .expect("default systems are not duplicated");
    systems.finalize().expect("default systems have no unmet dependencies");
    systems
}
