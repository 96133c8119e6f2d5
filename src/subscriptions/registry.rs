//! Subscription registry for bulk teardown.

use crate::subscriptions::Subscription;
use crate::types::EventName;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::debug;

/// Authoritative list of cancelable handles per event name.
///
/// Lets `off`/`off_all` tear listeners down without callers keeping their
/// handles around.
pub(crate) struct SubscriptionRegistry {
    entries: Mutex<HashMap<EventName, Vec<Subscription>>>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Append a handle to the list for `name`.
    ///
    /// No de-duplication. Handles that were already cancelled (a delivered
    /// `once`, a direct `unsubscribe`) are pruned; survivors keep their order.
    pub fn register(&self, name: EventName, handle: Subscription) {
        let mut entries = self.entries.lock();
        let list = entries.entry(name).or_default();
        list.retain(Subscription::is_active);
        list.push(handle);
    }

    /// Cancel every handle registered under `name` and drop the list.
    ///
    /// Returns how many handles were still live. The list is taken out under
    /// the lock and cancelled outside it.
    pub fn cancel_all(&self, name: &str) -> usize {
        let handles = match self.entries.lock().remove(name) {
            Some(handles) => handles,
            None => return 0,
        };

        let cancelled = handles.iter().filter(|h| h.unsubscribe()).count();
        debug!(event = name, cancelled, "cancelled registered listeners");
        cancelled
    }

    /// `cancel_all` for every name with a live handle when the call starts.
    ///
    /// Registrations made while tearing down (by a side effect of a
    /// cancellation) survive. Returns each torn-down name with its count of
    /// live handles cancelled.
    pub fn cancel_everything(&self) -> Vec<(EventName, usize)> {
        self.names()
            .into_iter()
            .map(|name| {
                let cancelled = self.cancel_all(name.as_str());
                (name, cancelled)
            })
            .collect()
    }

    /// Names that currently have a live handle.
    ///
    /// Handles cancelled directly by their owner are pruned here, and a name
    /// left with no live handle is dropped.
    pub fn names(&self) -> Vec<EventName> {
        let mut entries = self.entries.lock();
        entries.retain(|_, list| {
            list.retain(Subscription::is_active);
            !list.is_empty()
        });
        entries.keys().cloned().collect()
    }

    /// Number of handles held for `name`, live or not.
    #[cfg(test)]
    pub fn len(&self, name: &str) -> usize {
        self.entries.lock().get(name).map_or(0, Vec::len)
    }

    /// Live handles across all names.
    pub fn active_count(&self) -> usize {
        self.entries
            .lock()
            .values()
            .flat_map(|list| list.iter())
            .filter(|h| h.is_active())
            .count()
    }
}

impl Default for SubscriptionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
