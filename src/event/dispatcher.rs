use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::{ListNode, Outcome, PriorityPolicy, Receiver, SubscriptionPolicy};
use crate::util::invariant;

pub(super) type Handler<A, R> = Box<dyn Fn(A) -> R>;

/// The payload of a ring node.
///
/// The dispatcher head carries no handler.
pub(super) struct Subscriber<A, R> {
    pub(super) handler:    Option<Handler<A, R>>,
    pub(super) dispatcher: RefCell<Weak<Node<A, R>>>,
}

pub(super) type Node<A, R> = ListNode<Subscriber<A, R>>;

impl<A, R> Subscriber<A, R> {
    pub(super) fn head() -> Self { Self { handler: None, dispatcher: RefCell::default() } }

    pub(super) fn receiver(handler: Handler<A, R>) -> Self {
        Self { handler: Some(handler), dispatcher: RefCell::default() }
    }

    pub(super) fn is_linked_to(&self, head: &Rc<Node<A, R>>) -> bool {
        Weak::ptr_eq(&self.dispatcher.borrow(), &Rc::downgrade(head))
    }
}

/// Links `node` into the ring of `head` according to the policies.
pub(super) fn link<A, R>(
    head: &Rc<Node<A, R>>,
    node: &Rc<Node<A, R>>,
    subscription: SubscriptionPolicy,
    priority: PriorityPolicy,
) -> bool {
    if !node.is_free() {
        match subscription {
            SubscriptionPolicy::RejectIfSubscribed => {
                log::warn!("Rejected subscription of a receiver that is already subscribed");
                return false;
            }
            SubscriptionPolicy::ReplaceSubscription => {
                unlink(node);
            }
        }
    }

    let linked = match priority {
        PriorityPolicy::InsertFront => node.insert_after(head),
        PriorityPolicy::InsertBack => node.insert_before(head),
    };
    invariant!(linked, "a free receiver node must be linkable");

    *node.reference().dispatcher.borrow_mut() = Rc::downgrade(head);
    linked
}

/// Unlinks `node` from its ring, returning whether it was linked.
pub(super) fn unlink<A, R>(node: &Node<A, R>) -> bool {
    if node.is_free() {
        return false;
    }

    node.remove();
    *node.reference().dispatcher.borrow_mut() = Weak::new();
    true
}

/// Invokes subscribed [`Receiver`]s with the dispatched arguments.
///
/// `A` is cloned once per invoked receiver.
/// `R` decides whether a dispatch may stop early, see [`Outcome`].
pub struct Dispatcher<A, R = ()> {
    head: Rc<Node<A, R>>,
}

impl<A, R> Dispatcher<A, R> {
    /// Creates a dispatcher without subscribers.
    pub fn new() -> Self { Self { head: ListNode::new(Subscriber::head()) } }

    pub(super) fn head(&self) -> &Rc<Node<A, R>> { &self.head }

    /// Subscribes `receiver` to this dispatcher.
    ///
    /// Equivalent to [`Receiver::subscribe`].
    pub fn subscribe(
        &self,
        receiver: &Receiver<A, R>,
        subscription: SubscriptionPolicy,
        priority: PriorityPolicy,
    ) -> bool {
        receiver.subscribe(self, subscription, priority)
    }

    /// Unsubscribes `receiver` if it is subscribed to this dispatcher.
    ///
    /// Returns `false` if `receiver` is not subscribed here,
    /// including when it is subscribed to another dispatcher.
    pub fn unsubscribe(&self, receiver: &Receiver<A, R>) -> bool {
        if !receiver.is_subscribed_to(self) {
            return false;
        }

        unlink(receiver.node())
    }

    /// Unsubscribes every receiver.
    pub fn unsubscribe_all(&self) {
        loop {
            let next = self.head.next();
            if Rc::ptr_eq(&next, &self.head) {
                break;
            }
            unlink(&next);
        }
    }

    /// Whether any receiver is subscribed.
    pub fn has_subscribers(&self) -> bool { !self.head.is_empty() }

    /// Counts the subscribed receivers.
    pub fn subscriber_count(&self) -> usize { self.head.len() }
}

impl<A: Clone, R: Outcome> Dispatcher<A, R> {
    /// Invokes each subscribed receiver in order with a clone of `arguments`.
    ///
    /// Returns the first outcome that does not proceed,
    /// or [`Outcome::completed`] if every receiver proceeded.
    ///
    /// Receivers may subscribe and unsubscribe (themselves or others)
    /// while being invoked; see [`ListNode::for_each`] for the visiting rules.
    pub fn dispatch(&self, arguments: A) -> R {
        let mut stopped = None;

        self.head.for_each(|node| {
            let handler =
                node.reference().handler.as_ref().expect("only the ring head has no handler");
            let outcome = handler(arguments.clone());
            if outcome.proceed() {
                true
            } else {
                stopped = Some(outcome);
                false
            }
        });

        stopped.unwrap_or_else(R::completed)
    }
}

impl<A, R> Default for Dispatcher<A, R> {
    fn default() -> Self { Self::new() }
}

impl<A, R> Drop for Dispatcher<A, R> {
    fn drop(&mut self) { self.unsubscribe_all(); }
}

impl<A, R> fmt::Debug for Dispatcher<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dispatcher").field("subscribers", &self.subscriber_count()).finish()
    }
}
