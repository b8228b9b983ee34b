use std::collections::{BTreeSet, VecDeque};

/// A data structure that provides the ability to recycle entity identifiers.
pub trait Recycler: Default + Extend<u32> + 'static {
    /// Returns the number of identifiers available for reuse.
    fn len(&self) -> usize;

    /// Returns whether the recycler is empty.
    fn is_empty(&self) -> bool { self.len() == 0 }

    /// Polls an identifier to reuse.
    fn poll(&mut self) -> Option<u32>;
}

/// Reuses the least recently freed identifier first.
impl Recycler for VecDeque<u32> {
    fn len(&self) -> usize { VecDeque::len(self) }

    fn poll(&mut self) -> Option<u32> { self.pop_front() }
}

/// Reuses the most recently freed identifier first.
impl Recycler for Vec<u32> {
    fn len(&self) -> usize { Vec::len(self) }

    fn poll(&mut self) -> Option<u32> { self.pop() }
}

/// Reuses the lowest free identifier first, keeping used slots compact.
impl Recycler for BTreeSet<u32> {
    fn len(&self) -> usize { BTreeSet::len(self) }

    fn poll(&mut self) -> Option<u32> { self.pop_first() }
}
