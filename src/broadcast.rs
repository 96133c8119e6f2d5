//! Broadcast core.
//!
//! Every fired envelope passes through one `Broadcast`. Downstream views
//! attach a tap and do their own filtering.

use crate::types::Envelope;
use parking_lot::RwLock;
use std::sync::Arc;

/// Receiver side of the broadcast core.
pub(crate) type Tap<T> = Arc<dyn Fn(&Envelope<T>) + Send + Sync>;

/// Multicast channel of envelopes.
pub(crate) struct Broadcast<T> {
    taps: RwLock<Vec<Tap<T>>>,
}

impl<T> Broadcast<T> {
    pub fn new() -> Self {
        Self {
            taps: RwLock::new(Vec::new()),
        }
    }

    /// Attach a tap. Taps see every envelope emitted after this call.
    pub fn attach(&self, tap: Tap<T>) {
        self.taps.write().push(tap);
    }

    /// Push an envelope to every tap, in attach order.
    ///
    /// The tap list is snapshotted first so a tap may attach new taps (a
    /// listener creating a topic) without deadlocking.
    pub fn emit(&self, envelope: &Envelope<T>) {
        let taps: Vec<Tap<T>> = self.taps.read().clone();
        for tap in &taps {
            tap(envelope);
        }
    }

    #[cfg(test)]
    pub fn tap_count(&self) -> usize {
        self.taps.read().len()
    }
}
