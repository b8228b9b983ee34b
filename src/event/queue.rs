use std::any::{Any, TypeId};
use std::collections::{HashMap, VecDeque};
use std::fmt;

use super::{Dispatcher, PriorityPolicy, Receiver, SubscriptionPolicy};
use crate::util::DbgTypeId;

/// A first-in-first-out queue of events of arbitrary types.
///
/// Events are delivered later through a [`Broker`].
#[derive(Default)]
pub struct Queue {
    events: VecDeque<(DbgTypeId, Box<dyn Any>)>,
}

impl Queue {
    /// Creates an empty queue.
    pub fn new() -> Self { Self::default() }

    /// Appends an event to the back of the queue.
    pub fn push<E: 'static>(&mut self, event: E) {
        self.events.push_back((DbgTypeId::of::<E>(), Box::new(event)));
    }

    /// Removes the event at the front of the queue.
    pub fn pop(&mut self) -> Option<Box<dyn Any>> { self.events.pop_front().map(|(_, event)| event) }

    /// The number of queued events.
    pub fn len(&self) -> usize { self.events.len() }

    /// Whether no events are queued.
    pub fn is_empty(&self) -> bool { self.events.is_empty() }
}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.events.iter().map(|(ty, _)| ty)).finish()
    }
}

trait AnyDispatcher {
    fn as_any(&self) -> &dyn Any;

    /// Dispatches a type-erased event, handing it back if its type does not match.
    fn dispatch_any(&self, event: Box<dyn Any>) -> Result<(), Box<dyn Any>>;
}

impl<E: Clone + 'static> AnyDispatcher for Dispatcher<E> {
    fn as_any(&self) -> &dyn Any { self }

    fn dispatch_any(&self, event: Box<dyn Any>) -> Result<(), Box<dyn Any>> {
        let event = event.downcast::<E>()?;
        self.dispatch(*event);
        Ok(())
    }
}

/// A table of one [`Dispatcher`] per registered event type.
#[derive(Default)]
pub struct Broker {
    dispatchers: HashMap<DbgTypeId, Box<dyn AnyDispatcher>>,
}

impl Broker {
    /// Creates a broker without any event types.
    pub fn new() -> Self { Self::default() }

    /// Registers the event type `E`.
    ///
    /// Registering the same type again keeps the existing dispatcher and its subscribers.
    pub fn register<E: Clone + 'static>(&mut self) -> &Dispatcher<E> {
        let dispatcher = self
            .dispatchers
            .entry(DbgTypeId::of::<E>())
            .or_insert_with(|| Box::new(Dispatcher::<E>::new()));
        dispatcher.as_any().downcast_ref().expect("TypeId mismatch")
    }

    /// Whether the event type `E` is registered.
    pub fn is_registered<E: 'static>(&self) -> bool {
        self.dispatchers.contains_key(&TypeId::of::<E>())
    }

    /// The dispatcher for `E`, if registered.
    pub fn dispatcher<E: Clone + 'static>(&self) -> Option<&Dispatcher<E>> {
        let dispatcher = self.dispatchers.get(&TypeId::of::<E>())?;
        Some(dispatcher.as_any().downcast_ref().expect("TypeId mismatch"))
    }

    /// Subscribes `receiver` to the dispatcher for `E`.
    ///
    /// Returns `false` if `E` is not registered or the subscription was rejected.
    pub fn subscribe<E: Clone + 'static>(
        &self,
        receiver: &Receiver<E>,
        subscription: SubscriptionPolicy,
        priority: PriorityPolicy,
    ) -> bool {
        match self.dispatcher::<E>() {
            Some(dispatcher) => receiver.subscribe(dispatcher, subscription, priority),
            None => false,
        }
    }

    /// Dispatches `event` immediately.
    ///
    /// Returns `false` if `E` is not registered.
    pub fn dispatch<E: Clone + 'static>(&self, event: E) -> bool {
        match self.dispatcher::<E>() {
            Some(dispatcher) => {
                dispatcher.dispatch(event);
                true
            }
            None => false,
        }
    }

    /// Dispatches every event in `queue` in order, leaving it empty.
    ///
    /// Events of unregistered types are dropped.
    /// Returns the number of dropped events.
    pub fn flush(&self, queue: &mut Queue) -> usize {
        let mut undelivered = 0;

        while let Some((ty, event)) = queue.events.pop_front() {
            let Some(dispatcher) = self.dispatchers.get(&ty) else {
                log::warn!("Dropping event of unregistered type {ty}");
                undelivered += 1;
                continue;
            };

            if dispatcher.dispatch_any(event).is_err() {
                panic!("Queued event does not match its recorded type {ty}");
            }
        }

        undelivered
    }
}

impl fmt::Debug for Broker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.dispatchers.keys()).finish()
    }
}
