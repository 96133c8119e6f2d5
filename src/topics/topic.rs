//! Per-name topic view and its listener slots.

use crate::error::ListenerError;
use crate::subscriptions::types::{Detach, SubscriptionState};
use crate::subscriptions::Observer;
use crate::types::{Counters, EventName, ListenerId};
use parking_lot::Mutex;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::{trace, warn};

/// Equality test used by change detection. Returns true when two payloads
/// count as "the same".
pub type Comparer<T> = Arc<dyn Fn(&T, &T) -> bool + Send + Sync>;

/// An operator applied to a subscription. Operators run in the order they
/// were chained.
pub(crate) enum Operator<T> {
    Take(usize),
    Distinct(Comparer<T>),
}

impl<T> Clone for Operator<T> {
    fn clone(&self) -> Self {
        match self {
            Operator::Take(count) => Operator::Take(*count),
            Operator::Distinct(comparer) => Operator::Distinct(Arc::clone(comparer)),
        }
    }
}

impl<T> fmt::Debug for Operator<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operator::Take(count) => write!(f, "take({count})"),
            Operator::Distinct(_) => f.write_str("distinct"),
        }
    }
}

/// Suppresses a payload equal to the last one let through.
///
/// State is per listener, so two change listeners on one topic do not
/// interfere with each other.
struct ChangeGate<T> {
    comparer: Comparer<T>,
    previous: Mutex<Previous<T>>,
}

/// Last admitted payload, plus a generation bumped on every admit.
struct Previous<T> {
    generation: u64,
    value: Option<T>,
}

impl<T> ChangeGate<T> {
    fn new(comparer: Comparer<T>) -> Self {
        Self {
            comparer,
            previous: Mutex::new(Previous {
                generation: 0,
                value: None,
            }),
        }
    }
}

impl<T: Clone> ChangeGate<T> {
    /// The comparer runs outside the lock so it may call back into the bus.
    ///
    /// The verdict only stands if no other payload was admitted meanwhile;
    /// otherwise the comparison is redone against the newer value.
    fn admit(&self, payload: &T) -> Result<bool, ListenerError> {
        loop {
            let (generation, previous) = {
                let previous = self.previous.lock();
                (previous.generation, previous.value.clone())
            };

            let same = match &previous {
                Some(previous) => {
                    catch_unwind(AssertUnwindSafe(|| (self.comparer)(previous, payload)))
                        .map_err(ListenerError::from_panic)?
                }
                None => false,
            };

            let mut current = self.previous.lock();
            if current.generation != generation {
                continue;
            }
            if same {
                return Ok(false);
            }
            current.generation += 1;
            current.value = Some(payload.clone());
            return Ok(true);
        }
    }
}

/// Runtime state of one operator.
enum Stage<T> {
    Limit(AtomicUsize),
    Gate(ChangeGate<T>),
}

/// One listener attached to a topic.
pub(crate) struct ListenerSlot<T> {
    state: Arc<SubscriptionState>,
    observer: Observer<T>,
    stages: Vec<Stage<T>>,
    counters: Arc<Counters>,
}

impl<T> ListenerSlot<T> {
    pub fn new(
        state: Arc<SubscriptionState>,
        observer: Observer<T>,
        operators: &[Operator<T>],
        counters: Arc<Counters>,
    ) -> Self {
        let stages = operators
            .iter()
            .map(|op| match op {
                Operator::Take(count) => Stage::Limit(AtomicUsize::new(*count)),
                Operator::Distinct(comparer) => Stage::Gate(ChangeGate::new(Arc::clone(comparer))),
            })
            .collect();
        Self {
            state,
            observer,
            stages,
            counters,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.state.id()
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Signal completion to the observer.
    pub fn finish(&self) {
        if let Err(err) = self.observer.complete() {
            self.report(&err);
        }
    }

    fn report(&self, err: &ListenerError) {
        Counters::bump(&self.counters.listener_errors);
        if !self.observer.error(err) {
            warn!(
                event = %self.state.name(),
                listener = %self.id(),
                error = %err,
                "listener error not handled"
            );
        }
    }
}

impl<T: Clone> ListenerSlot<T> {
    /// Run one payload through the operators in chain order, then the
    /// callbacks.
    ///
    /// A limit that reaches its last payload cancels the listener right away,
    /// before any later operator or the callback runs, so a re-entrant fire
    /// cannot reach it again. The listener completes even when a later
    /// operator drops that last payload.
    pub fn deliver(&self, payload: &T) {
        if !self.state.is_active() {
            return;
        }

        let mut last = false;
        for stage in &self.stages {
            match stage {
                Stage::Limit(remaining) => {
                    match remaining.fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                        n.checked_sub(1)
                    }) {
                        Ok(1) => {
                            last = true;
                            self.state.cancel();
                        }
                        Ok(_) => {}
                        Err(_) => return,
                    }
                }
                Stage::Gate(gate) => {
                    let admitted = match gate.admit(payload) {
                        Ok(admitted) => admitted,
                        Err(err) => {
                            self.report(&err);
                            false
                        }
                    };
                    if !admitted {
                        trace!(
                            event = %self.state.name(),
                            listener = %self.id(),
                            "payload dropped by change filter"
                        );
                        if last {
                            self.finish();
                        }
                        return;
                    }
                }
            }
        }

        Counters::bump(&self.counters.deliveries);
        trace!(event = %self.state.name(), listener = %self.id(), "delivering payload");
        if let Err(err) = self.observer.next(payload) {
            self.report(&err);
        }

        if last {
            self.finish();
        }
    }
}

/// Listeners for one event name, in subscription order.
pub(crate) struct Topic<T> {
    name: EventName,
    listeners: Mutex<Vec<Arc<ListenerSlot<T>>>>,
    counters: Arc<Counters>,
}

impl<T> Topic<T> {
    pub fn new(name: EventName, counters: Arc<Counters>) -> Self {
        Self {
            name,
            listeners: Mutex::new(Vec::new()),
            counters,
        }
    }

    pub fn name(&self) -> &EventName {
        &self.name
    }

    pub fn counters(&self) -> &Arc<Counters> {
        &self.counters
    }

    pub fn attach(&self, slot: Arc<ListenerSlot<T>>) {
        self.listeners.lock().push(slot);
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl<T: Clone> Topic<T> {
    /// Deliver to every listener attached when delivery starts.
    ///
    /// The list is snapshotted so callbacks run without the lock held and
    /// may subscribe, unsubscribe or fire again.
    pub fn deliver(&self, payload: &T) {
        let listeners: Vec<Arc<ListenerSlot<T>>> = self.listeners.lock().clone();
        for slot in &listeners {
            slot.deliver(payload);
        }
    }
}

impl<T: Send + Sync> Detach for Topic<T> {
    fn detach(&self, id: ListenerId) {
        self.listeners.lock().retain(|slot| slot.state.id() != id);
    }
}
