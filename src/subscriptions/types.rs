//! Listener handle types.

use crate::types::{EventName, ListenerId};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};

/// Something a live listener can be detached from.
pub(crate) trait Detach: Send + Sync {
    fn detach(&self, id: ListenerId);
}

/// Shared liveness state of one registration.
///
/// The topic-side listener slot and every clone of the caller's
/// [`Subscription`] point at the same state.
pub(crate) struct SubscriptionState {
    id: ListenerId,
    name: EventName,
    active: AtomicBool,
    source: Weak<dyn Detach>,
}

impl SubscriptionState {
    pub fn new(id: ListenerId, name: EventName, source: Weak<dyn Detach>) -> Self {
        Self {
            id,
            name,
            active: AtomicBool::new(true),
            source,
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn name(&self) -> &EventName {
        &self.name
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Deactivate and detach. Returns false if already cancelled.
    pub fn cancel(&self) -> bool {
        if !self.active.swap(false, Ordering::AcqRel) {
            return false;
        }
        if let Some(source) = self.source.upgrade() {
            source.detach(self.id);
        }
        true
    }
}

/// Handle to a live listener registration.
///
/// Dropping a handle does not cancel the listener; call
/// [`Subscription::unsubscribe`] or use `off`/`off_all` on the manager.
#[derive(Clone)]
pub struct Subscription {
    state: Arc<SubscriptionState>,
}

impl Subscription {
    pub(crate) fn from_state(state: Arc<SubscriptionState>) -> Self {
        Self { state }
    }

    pub fn id(&self) -> ListenerId {
        self.state.id()
    }

    /// The event this listener is registered on.
    pub fn event_name(&self) -> &EventName {
        self.state.name()
    }

    /// False once cancelled, or once a `once` listener has been delivered.
    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    /// Cancel the listener. Idempotent; returns true only for the call that
    /// actually cancelled it.
    pub fn unsubscribe(&self) -> bool {
        self.state.cancel()
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("id", &self.state.id())
            .field("event", &self.state.name())
            .field("active", &self.state.is_active())
            .finish()
    }
}
