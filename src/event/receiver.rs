use std::fmt;
use std::rc::{Rc, Weak};

use super::dispatcher::{self, Node, Subscriber};
use super::{Dispatcher, ListNode, PriorityPolicy, SubscriptionPolicy};

/// A handler that can be subscribed to at most one [`Dispatcher`] at a time.
///
/// Dropping a receiver unsubscribes it.
pub struct Receiver<A, R = ()> {
    node: Rc<Node<A, R>>,
}

impl<A, R> Receiver<A, R> {
    /// Creates an unsubscribed receiver invoking `handler`.
    pub fn new(handler: impl Fn(A) -> R + 'static) -> Self {
        Self { node: ListNode::new(Subscriber::receiver(Box::new(handler))) }
    }

    /// Creates an unsubscribed receiver whose handler holds a [`WeakReceiver`] to itself,
    /// e.g. to unsubscribe from inside the handler.
    pub fn new_cyclic<F>(handler: impl FnOnce(WeakReceiver<A, R>) -> F) -> Self
    where
        F: Fn(A) -> R + 'static,
    {
        let node = ListNode::new_cyclic(|this| {
            let handler = handler(WeakReceiver { node: this.clone() });
            Subscriber::receiver(Box::new(handler))
        });
        Self { node }
    }

    pub(super) fn node(&self) -> &Rc<Node<A, R>> { &self.node }

    /// Subscribes to `dispatcher`.
    ///
    /// If this receiver is already subscribed (to any dispatcher),
    /// [`SubscriptionPolicy::ReplaceSubscription`] moves it
    /// and [`SubscriptionPolicy::RejectIfSubscribed`] fails with `false`.
    pub fn subscribe(
        &self,
        dispatcher: &Dispatcher<A, R>,
        subscription: SubscriptionPolicy,
        priority: PriorityPolicy,
    ) -> bool {
        dispatcher::link(dispatcher.head(), &self.node, subscription, priority)
    }

    /// Unsubscribes from the current dispatcher.
    ///
    /// Returns `false` if the receiver was not subscribed.
    pub fn unsubscribe(&self) -> bool { dispatcher::unlink(&self.node) }

    /// Whether the receiver is subscribed to any dispatcher.
    pub fn is_subscribed(&self) -> bool { !self.node.is_free() }

    /// Whether the receiver is subscribed to `dispatcher`.
    pub fn is_subscribed_to(&self, dispatcher: &Dispatcher<A, R>) -> bool {
        self.is_subscribed() && self.node.reference().is_linked_to(dispatcher.head())
    }

    /// Invokes the handler directly, without going through a dispatcher.
    pub fn invoke(&self, arguments: A) -> R {
        let handler = self.node.reference().handler.as_ref().expect("receivers always have a handler");
        handler(arguments)
    }

    /// Creates a weak handle to this receiver.
    pub fn downgrade(&self) -> WeakReceiver<A, R> { WeakReceiver { node: Rc::downgrade(&self.node) } }
}

impl<A, R> Drop for Receiver<A, R> {
    fn drop(&mut self) { dispatcher::unlink(&self.node); }
}

impl<A, R> fmt::Debug for Receiver<A, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Receiver").field("subscribed", &self.is_subscribed()).finish()
    }
}

/// A non-owning handle to a [`Receiver`].
///
/// All operations are no-ops once the receiver has been dropped.
pub struct WeakReceiver<A, R = ()> {
    node: Weak<Node<A, R>>,
}

impl<A, R> WeakReceiver<A, R> {
    /// Unsubscribes the receiver, returning whether it was subscribed.
    pub fn unsubscribe(&self) -> bool {
        match self.node.upgrade() {
            Some(node) => dispatcher::unlink(&node),
            None => false,
        }
    }

    /// Whether the receiver is alive and subscribed.
    pub fn is_subscribed(&self) -> bool {
        self.node.upgrade().map_or(false, |node| !node.is_free())
    }
}

impl<A, R> Clone for WeakReceiver<A, R> {
    fn clone(&self) -> Self { Self { node: self.node.clone() } }
}
