//! Latest-value store for replay to late subscribers.

use crate::types::EventName;
use parking_lot::RwLock;
use std::collections::HashMap;

/// Most recent payload per event name.
///
/// Presence of an entry is the "has fired" flag; `clear` restores the
/// never-fired state.
pub(crate) struct LatestValueStore<T> {
    values: RwLock<HashMap<EventName, T>>,
}

impl<T: Clone> LatestValueStore<T> {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    pub fn record(&self, name: &EventName, payload: T) {
        let mut values = self.values.write();
        match values.get_mut(name.as_str()) {
            Some(slot) => *slot = payload,
            None => {
                values.insert(name.clone(), payload);
            }
        }
    }

    pub fn peek(&self, name: &str) -> Option<T> {
        self.values.read().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.read().contains_key(name)
    }

    /// Forget the value for `name`. Returns whether there was one.
    pub fn clear(&self, name: &str) -> bool {
        self.values.write().remove(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.values.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> EventName {
        EventName::new(s).unwrap()
    }

    #[test]
    fn test_record_and_peek() {
        let store = LatestValueStore::new();
        assert_eq!(store.peek("temp"), None);

        store.record(&name("temp"), 20);
        store.record(&name("temp"), 25);
        assert_eq!(store.peek("temp"), Some(25));
        assert!(store.contains("temp"));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_clear_restores_never_fired() {
        let store = LatestValueStore::new();
        store.record(&name("temp"), 20);

        assert!(store.clear("temp"));
        assert!(!store.clear("temp"));
        assert_eq!(store.peek("temp"), None);
        assert!(!store.contains("temp"));
    }

    #[test]
    fn test_names_are_independent() {
        let store = LatestValueStore::new();
        store.record(&name("a"), "x".to_string());
        assert_eq!(store.peek("b"), None);
    }
}
