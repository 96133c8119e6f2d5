//! Event router: one cached, filtered view of the broadcast core per name.

use crate::broadcast::Broadcast;
use crate::topics::topic::Topic;
use crate::types::{Counters, Envelope, EventName};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

pub(crate) struct Router<T> {
    core: Arc<Broadcast<T>>,
    topics: Mutex<HashMap<EventName, Arc<Topic<T>>>>,
    counters: Arc<Counters>,
}

impl<T: Clone + Send + Sync + 'static> Router<T> {
    pub fn new(core: Arc<Broadcast<T>>, counters: Arc<Counters>) -> Self {
        Self {
            core,
            topics: Mutex::new(HashMap::new()),
            counters,
        }
    }

    /// The view for `name`, built on first use.
    ///
    /// Building installs a tap on the broadcast core that keeps envelopes
    /// whose name is exactly `name` and forwards their payload. Later calls
    /// return the same `Arc`.
    pub fn topic(&self, name: &EventName) -> Arc<Topic<T>> {
        let mut topics = self.topics.lock();
        if let Some(topic) = topics.get(name.as_str()) {
            return Arc::clone(topic);
        }

        let topic = Arc::new(Topic::new(name.clone(), Arc::clone(&self.counters)));
        let view = Arc::clone(&topic);
        self.core.attach(Arc::new(move |envelope: &Envelope<T>| {
            if envelope.name == *view.name() {
                view.deliver(&envelope.payload);
            }
        }));
        topics.insert(name.clone(), Arc::clone(&topic));
        debug!(event = %name, "created topic view");
        topic
    }

    /// The view for `name` if one was ever built.
    pub fn get(&self, name: &str) -> Option<Arc<Topic<T>>> {
        self.topics.lock().get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.topics.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router() -> (Arc<Broadcast<i32>>, Router<i32>) {
        let core = Arc::new(Broadcast::new());
        let router = Router::new(Arc::clone(&core), Arc::new(Counters::default()));
        (core, router)
    }

    fn name(s: &str) -> EventName {
        EventName::new(s).unwrap()
    }

    #[test]
    fn test_topic_is_cached() {
        let (core, router) = router();
        let a1 = router.topic(&name("a"));
        let a2 = router.topic(&name("a"));
        let b = router.topic(&name("b"));

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
        assert_eq!(router.len(), 2);
        assert_eq!(core.tap_count(), 2);
    }

    #[test]
    fn test_get_does_not_build() {
        let (_core, router) = router();
        assert!(router.get("a").is_none());
        router.topic(&name("a"));
        assert!(router.get("a").is_some());
        assert_eq!(router.len(), 1);
    }
}
