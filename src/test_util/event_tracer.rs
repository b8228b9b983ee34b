use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use indexmap::IndexSet;

/// Records handler invocations and asserts that they happen in the declared order.
pub struct EventTracer<T: fmt::Debug + Eq + Hash> {
    predecessors: HashMap<T, Vec<T>>,
    seen:         RefCell<IndexSet<T>>,
}

impl<T: fmt::Debug + Eq + Hash> EventTracer<T> {
    /// Creates a tracer that requires `before` to be traced ahead of `after`
    /// for each `(before, after)` pair.
    pub fn new(orders: impl IntoIterator<Item = (T, T)>) -> Self {
        let mut predecessors: HashMap<T, Vec<T>> = HashMap::new();
        for (before, after) in orders {
            predecessors.entry(after).or_default().push(before);
        }

        Self { predecessors, seen: RefCell::default() }
    }

    /// Records that `event` happened.
    ///
    /// # Panics
    /// Panics if `event` was already traced or one of its predecessors was not.
    pub fn trace(&self, event: T) {
        let mut seen = self.seen.borrow_mut();

        for before in self.predecessors.get(&event).into_iter().flatten() {
            assert!(seen.contains(before), "{event:?} should happen after {before:?}");
        }

        assert!(!seen.contains(&event), "{event:?} is traced twice");
        seen.insert(event);
    }

    /// The number of events traced so far.
    pub fn len(&self) -> usize { self.seen.borrow().len() }

    /// Consumes the tracer and returns the events in the order they were traced.
    pub fn get_events(self) -> Vec<T> { self.seen.into_inner().into_iter().collect() }
}
