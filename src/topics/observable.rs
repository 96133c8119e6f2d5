//! Subscribable stream over one topic.

use crate::subscriptions::types::{Detach, SubscriptionState};
use crate::subscriptions::{Observer, Subscription, SubscriptionRegistry};
use crate::topics::topic::{ListenerSlot, Operator, Topic};
use crate::types::EventName;
use std::fmt;
use std::sync::{Arc, Weak};
use tracing::debug;

/// A stream of payloads for one event name.
///
/// Returned by `observe`, `latest_stream` and `change_stream`. Every
/// subscription made through [`Observable::subscribe`] is registered with the
/// owning manager, so `off`/`off_all` cancel it even if the caller drops the
/// handle. Operators (`take`, `distinct_until_changed`) return a new stream
/// over the same topic; their state is created per subscription.
///
/// Operators apply in the order they are chained:
/// `take(2).distinct_until_changed()` over `1, 1, 2` yields `1` only, while
/// `distinct_until_changed().take(2)` yields `1, 2`.
pub struct Observable<T> {
    topic: Arc<Topic<T>>,
    registry: Arc<SubscriptionRegistry>,
    operators: Vec<Operator<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            topic: Arc::clone(&self.topic),
            registry: Arc::clone(&self.registry),
            operators: self.operators.clone(),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub(crate) fn new(topic: Arc<Topic<T>>, registry: Arc<SubscriptionRegistry>) -> Self {
        Self {
            topic,
            registry,
            operators: Vec::new(),
        }
    }

    pub fn event_name(&self) -> &EventName {
        self.topic.name()
    }

    /// Whether both streams are views of the same cached topic.
    pub fn same_topic(&self, other: &Observable<T>) -> bool {
        Arc::ptr_eq(&self.topic, &other.topic)
    }

    /// Listeners currently attached to the underlying topic.
    pub fn listener_count(&self) -> usize {
        self.topic.listener_count()
    }

    /// Pass at most `count` payloads per subscription, then complete.
    pub fn take(mut self, count: usize) -> Self {
        self.operators.push(Operator::Take(count));
        self
    }

    /// Suppress a payload equal to the previous one delivered.
    pub fn distinct_until_changed(self) -> Self
    where
        T: PartialEq,
    {
        self.distinct_until_changed_by(|a: &T, b: &T| a == b)
    }

    /// Like [`Observable::distinct_until_changed`] with a custom comparer
    /// that returns true when two payloads count as equal.
    pub fn distinct_until_changed_by<F>(mut self, comparer: F) -> Self
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        self.operators.push(Operator::Distinct(Arc::new(comparer)));
        self
    }

    /// Attach a listener and register it with the manager.
    pub fn subscribe(&self, observer: impl Into<Observer<T>>) -> Subscription {
        self.attach(observer.into()).0
    }

    /// Attach a listener, returning the slot as well for replay.
    pub(crate) fn attach(&self, observer: Observer<T>) -> (Subscription, Arc<ListenerSlot<T>>) {
        let id = self.topic.counters().next_listener_id();
        let weak = Arc::downgrade(&self.topic);
        let source: Weak<dyn Detach> = weak;
        let state = Arc::new(SubscriptionState::new(
            id,
            self.topic.name().clone(),
            source,
        ));
        let slot = Arc::new(ListenerSlot::new(
            Arc::clone(&state),
            observer,
            &self.operators,
            Arc::clone(self.topic.counters()),
        ));
        let subscription = Subscription::from_state(state);

        if self.operators.iter().any(|op| matches!(op, Operator::Take(0))) {
            subscription.unsubscribe();
            slot.finish();
            return (subscription, slot);
        }

        self.topic.attach(Arc::clone(&slot));
        self.registry
            .register(self.topic.name().clone(), subscription.clone());
        debug!(event = %self.topic.name(), listener = %id, "listener subscribed");
        (subscription, slot)
    }
}

impl<T> fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Observable")
            .field("event", self.topic.name())
            .field("operators", &self.operators)
            .finish()
    }
}
