//! Core types for the event bus.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Validated, non-empty event name.
///
/// Matching is exact string equality; a name containing spaces is a single
/// name, not a list.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EventName(String);

impl EventName {
    /// Validate and wrap an event name.
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        let name = name.into();
        if name.is_empty() {
            return Err(ValidationError::EmptyName);
        }
        Ok(EventName(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EventName({:?})", self.0)
    }
}

impl fmt::Display for EventName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for EventName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for EventName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for EventName {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        EventName::new(value)
    }
}

impl TryFrom<&str> for EventName {
    type Error = ValidationError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        EventName::new(value)
    }
}

impl From<EventName> for String {
    fn from(name: EventName) -> Self {
        name.0
    }
}

/// The unit flowing through the broadcast core: one per `fire` call.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub name: EventName,
    pub payload: T,
}

/// Unique identifier for a listener registration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ListenerId(pub u64);

impl fmt::Debug for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ListenerId({})", self.0)
    }
}

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener-{}", self.0)
    }
}

/// Point-in-time bus statistics.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusStats {
    pub events_fired: u64,
    pub deliveries: u64,
    pub listener_errors: u64,
    pub replays_scheduled: u64,
    pub active_subscriptions: usize,
    pub topics: usize,
    pub latest_values: usize,
}

/// Monotonic counters shared by every component of one manager.
#[derive(Debug, Default)]
pub(crate) struct Counters {
    pub events_fired: AtomicU64,
    pub deliveries: AtomicU64,
    pub listener_errors: AtomicU64,
    pub replays_scheduled: AtomicU64,
    next_listener_id: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn next_listener_id(&self) -> ListenerId {
        ListenerId(self.next_listener_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Fill in the counter half of a stats snapshot.
    pub fn snapshot(&self) -> BusStats {
        BusStats {
            events_fired: self.events_fired.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            listener_errors: self.listener_errors.load(Ordering::Relaxed),
            replays_scheduled: self.replays_scheduled.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}
