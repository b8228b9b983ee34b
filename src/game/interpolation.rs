use std::cell::OnceCell;
use std::rc::Rc;

use crate::comp::{Component, ComponentSystem};
use crate::entity::EntityHandle;
use crate::error::AttachError;
use crate::storage;
use crate::system::{GameSystem, Systems};

/// The placement of an entity in a 2D scene.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Translation in world units.
    pub position: [f32; 2],
    /// Rotation in radians.
    pub rotation: f32,
    /// Scale along each axis.
    pub scale:    [f32; 2],
}

impl Default for Pose {
    fn default() -> Self { Self { position: [0.0; 2], rotation: 0.0, scale: [1.0; 2] } }
}

impl Pose {
    /// Linearly blends `self` towards `other` by `alpha`.
    pub fn lerp(&self, other: &Self, alpha: f32) -> Self {
        let mix = |from: f32, to: f32| from + (to - from) * alpha;

        Self {
            position: [mix(self.position[0], other.position[0]), mix(self.position[1], other.position[1])],
            rotation: mix(self.rotation, other.rotation),
            scale:    [mix(self.scale[0], other.scale[0]), mix(self.scale[1], other.scale[1])],
        }
    }
}

/// A pose that remembers its value at the start of the current tick,
/// so that frames drawn between ticks can be interpolated.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Transform {
    /// The pose at the end of the current tick.
    pub pose: Pose,
    previous: Pose,
}

impl Transform {
    /// Creates a transform whose previous pose equals `pose`.
    pub fn new(pose: Pose) -> Self { Self { pose, previous: pose } }

    /// The pose at the start of the current tick.
    pub fn previous(&self) -> Pose { self.previous }

    /// Starts a new tick from the current pose.
    pub fn reset_interpolation(&mut self) { self.previous = self.pose; }

    /// The pose `alpha` of the way between the previous and the current pose.
    pub fn interpolate(&self, alpha: f32) -> Pose { self.previous.lerp(&self.pose, alpha) }
}

impl Component for Transform {
    type Storage = storage::Vec<Self>;

    fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool {
        self.reset_interpolation();
        true
    }
}

/// Resets the interpolation snapshot of every [`Transform`] at the start of each tick.
///
/// Gameplay systems declared after this one move transforms during the tick,
/// and renderers blend between the snapshot and the result.
#[derive(Default)]
pub struct InterpolationSystem {
    components: OnceCell<Rc<ComponentSystem>>,
}

impl GameSystem for InterpolationSystem {
    fn create() -> Rc<Self> { Rc::default() }

    fn on_attach(self: Rc<Self>, systems: &Systems) -> Result<(), AttachError> {
        let components = systems.require::<ComponentSystem>()?;
        components.register::<Transform>();
        self.components.set(components).map_err(|_| AttachError::AlreadyAttached)
    }

    fn on_tick(&self, _time_delta: f32) {
        let Some(components) = self.components.get() else { return };

        let transforms = components.pool::<Transform>();
        for (_, transform) in transforms.write().iter_mut() {
            transform.reset_interpolation();
        }
    }
}
