use std::cell::Cell;
use std::rc::Rc;

use crate::comp::{Component, ComponentSystem};
use crate::entity::EntityHandle;
use crate::storage;

/// A vec-backed component without initialization logic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position(pub f32, pub f32);

impl Component for Position {
    type Storage = storage::Vec<Self>;
}

/// A tree-backed component that rejects negative values on initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Health(pub i32);

impl Component for Health {
    type Storage = storage::Tree<Self>;

    fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool { self.0 >= 0 }
}

/// Counts its initializations and drops through shared counters.
pub struct Probe {
    pub initialized: Rc<Cell<usize>>,
    pub dropped:     Rc<Cell<usize>>,
}

impl Probe {
    /// Creates a probe along with its `(initialized, dropped)` counters.
    pub fn new() -> (Self, Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let initialized = Rc::new(Cell::new(0));
        let dropped = Rc::new(Cell::new(0));
        let probe = Self { initialized: Rc::clone(&initialized), dropped: Rc::clone(&dropped) };
        (probe, initialized, dropped)
    }
}

impl Component for Probe {
    type Storage = storage::Vec<Self>;

    fn on_initialize(&mut self, _: &ComponentSystem, _: EntityHandle) -> bool {
        self.initialized.set(self.initialized.get() + 1);
        true
    }
}

impl Drop for Probe {
    fn drop(&mut self) { self.dropped.set(self.dropped.get() + 1); }
}
