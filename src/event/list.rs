//! An intrusive circular doubly-linked list.
//!
//! Every [`ListNode`] is either *free*, linking to itself in both directions,
//! or a member of exactly one ring.
//! A ring is usually owned through a designated head node,
//! which [`ListNode::for_each`] never yields to its callback.
//!
//! Nodes are reference counted and link each other weakly.
//! A node dropped while linked removes itself from its ring first,
//! so the remaining nodes never observe a dangling link.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::util::invariant;


/// A node of an intrusive ring carrying a `reference` payload.
pub struct ListNode<T> {
    reference: T,
    this:      Weak<ListNode<T>>,
    previous:  RefCell<Weak<ListNode<T>>>,
    next:      RefCell<Weak<ListNode<T>>>,
}

impl<T> ListNode<T> {
    /// Creates a free node.
    pub fn new(reference: T) -> Rc<Self> { Self::new_cyclic(|_| reference) }

    /// Creates a free node whose payload can refer back to the node.
    pub fn new_cyclic(reference: impl FnOnce(&Weak<Self>) -> T) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            reference: reference(this),
            this:      this.clone(),
            previous:  RefCell::new(this.clone()),
            next:      RefCell::new(this.clone()),
        })
    }

    /// The payload of this node.
    pub fn reference(&self) -> &T { &self.reference }

    /// Whether this node is linked to itself only.
    pub fn is_free(&self) -> bool {
        let free = Weak::ptr_eq(&self.previous.borrow(), &self.this);
        invariant!(
            free == Weak::ptr_eq(&self.next.borrow(), &self.this),
            "ring node links disagree on whether the node is free"
        );
        free
    }

    /// The node following this one, or this node itself if it is free.
    pub fn next(&self) -> Rc<Self> {
        self.next.borrow().upgrade().expect("linked nodes unlink themselves before being dropped")
    }

    /// The node preceding this one, or this node itself if it is free.
    pub fn previous(&self) -> Rc<Self> {
        self.previous
            .borrow()
            .upgrade()
            .expect("linked nodes unlink themselves before being dropped")
    }

    /// Links this free node directly after `other`.
    ///
    /// Returns `false` without changing anything
    /// if this node is not free or `other` is this node.
    pub fn insert_after(self: &Rc<Self>, other: &Rc<Self>) -> bool {
        if !self.is_free() || Rc::ptr_eq(self, other) {
            return false;
        }

        let next = other.next();
        *self.previous.borrow_mut() = Rc::downgrade(other);
        *self.next.borrow_mut() = Rc::downgrade(&next);
        *other.next.borrow_mut() = Rc::downgrade(self);
        *next.previous.borrow_mut() = Rc::downgrade(self);
        true
    }

    /// Links this free node directly before `other`.
    ///
    /// Returns `false` without changing anything
    /// if this node is not free or `other` is this node.
    pub fn insert_before(self: &Rc<Self>, other: &Rc<Self>) -> bool {
        if !self.is_free() || Rc::ptr_eq(self, other) {
            return false;
        }

        let previous = other.previous();
        *self.previous.borrow_mut() = Rc::downgrade(&previous);
        *self.next.borrow_mut() = Rc::downgrade(other);
        *previous.next.borrow_mut() = Rc::downgrade(self);
        *other.previous.borrow_mut() = Rc::downgrade(self);
        true
    }

    /// Unlinks this node from its ring, leaving it free.
    ///
    /// Removing a free node has no effect.
    pub fn remove(&self) {
        if self.is_free() {
            return;
        }

        let previous = self.previous();
        let next = self.next();
        *previous.next.borrow_mut() = Rc::downgrade(&next);
        *next.previous.borrow_mut() = Rc::downgrade(&previous);
        *self.previous.borrow_mut() = self.this.clone();
        *self.next.borrow_mut() = self.this.clone();
    }

    /// Counts the other nodes in the ring of this node.
    pub fn len(self: &Rc<Self>) -> usize {
        let mut count = 0;
        self.for_each(|_| {
            count += 1;
            true
        });
        count
    }

    /// Whether the ring of this node contains no other node.
    pub fn is_empty(&self) -> bool { self.is_free() }

    /// Calls `f` on every other node of the ring, starting after this node.
    ///
    /// Iteration stops early when `f` returns `false`,
    /// in which case `for_each` returns `false` too.
    ///
    /// `f` may link and unlink nodes of the same ring, including the node it was called on.
    /// The successor of a visited node is resolved after `f` returns:
    ///
    /// - If the successor read before the call is this node (the end of the ring),
    ///   iteration continues from the visited node if it is still linked,
    ///   otherwise from its predecessor read before the call.
    ///   Nodes appended behind the visited node are therefore still visited.
    /// - If the successor read before the call is still linked, it is visited next.
    /// - If that successor was unlinked during the call,
    ///   the successor is re-read from the visited node or its predecessor as above.
    ///
    /// A node unlinked during iteration is never passed to `f` afterwards.
    /// If the visited node, its successor and its predecessor were all unlinked,
    /// iteration ends early.
    pub fn for_each(self: &Rc<Self>, mut f: impl FnMut(&Rc<Self>) -> bool) -> bool {
        let mut current = self.next();

        while !Rc::ptr_eq(&current, self) {
            let previous = current.previous();
            let next = current.next();

            if !f(&current) {
                return false;
            }

            let successor = if Rc::ptr_eq(&next, self) || next.is_free() {
                if current.is_free() {
                    previous.next()
                } else {
                    current.next()
                }
            } else {
                next
            };

            if !Rc::ptr_eq(&successor, self) && successor.is_free() {
                log::trace!("Ring iteration lost its position after concurrent removals");
                break;
            }

            current = successor;
        }

        true
    }
}

impl<T> Drop for ListNode<T> {
    fn drop(&mut self) {
        // Links to this node no longer upgrade, so a free node finds no neighbours here.
        let previous = self.previous.get_mut().upgrade();
        let next = self.next.get_mut().upgrade();

        if let (Some(previous), Some(next)) = (previous, next) {
            *previous.next.borrow_mut() = Rc::downgrade(&next);
            *next.previous.borrow_mut() = Rc::downgrade(&previous);
        }
    }
}
