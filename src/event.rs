//! Event dispatch between loosely coupled systems.
//!
//! A [`Dispatcher`] owns the head of an intrusive ring of [`Receiver`] nodes.
//! Subscribing links a receiver into the ring and unsubscribing unlinks it,
//! both in constant time and both safe to perform from inside a handler
//! while the same dispatcher is dispatching.
//!
//! Receivers are invoked in ring order.
//! [`PriorityPolicy::InsertFront`] places a receiver before every existing subscriber,
//! [`PriorityPolicy::InsertBack`] after them.
//! Handlers that return [`bool`] (or [`Result`]) can stop a dispatch early,
//! see [`Outcome`].
//!
//! ```
//! use entwine::event::{Dispatcher, PriorityPolicy, Receiver, SubscriptionPolicy};
//!
//! let dispatcher = Dispatcher::<u32, bool>::new();
//! let even = Receiver::new(|value: u32| value % 2 == 0);
//! even.subscribe(&dispatcher, SubscriptionPolicy::default(), PriorityPolicy::default());
//!
//! assert!(dispatcher.dispatch(4));
//! assert!(!dispatcher.dispatch(5));
//! ```

pub mod list;
pub use list::ListNode;

mod dispatcher;
pub use dispatcher::Dispatcher;

mod receiver;
pub use receiver::{Receiver, WeakReceiver};

mod queue;
pub use queue::{Broker, Queue};

static_assertions::assert_not_impl_any!(Dispatcher<()>: Send, Sync);


/// What to do when subscribing a receiver that is already subscribed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SubscriptionPolicy {
    /// Unsubscribe from the current dispatcher first.
    #[default]
    ReplaceSubscription,
    /// Fail the subscription and leave the existing one untouched.
    RejectIfSubscribed,
}

/// Where to link a newly subscribed receiver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PriorityPolicy {
    /// Invoke before all current subscribers.
    InsertFront,
    /// Invoke after all current subscribers.
    #[default]
    InsertBack,
}

/// The return type of an event handler.
///
/// A dispatch stops at the first handler whose outcome does not [`proceed`](Outcome::proceed)
/// and returns that outcome.
/// If every handler proceeds, the dispatch returns [`completed`](Outcome::completed).
pub trait Outcome: Sized {
    /// Whether the dispatch should continue with the next receiver.
    fn proceed(&self) -> bool;

    /// The result of a dispatch that reached the end of the ring.
    fn completed() -> Self;
}

impl Outcome for () {
    fn proceed(&self) -> bool { true }

    fn completed() -> Self {}
}

impl Outcome for bool {
    fn proceed(&self) -> bool { *self }

    fn completed() -> Self { true }
}

impl<E> Outcome for Result<(), E> {
    fn proceed(&self) -> bool { self.is_ok() }

    fn completed() -> Self { Ok(()) }
}
