//! Property tests for delivery semantics.

use herald::{EventManager, Observer};
use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;

fn recorder() -> (Arc<Mutex<Vec<u8>>>, Observer<u8>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    (seen, Observer::new(move |v: &u8| sink.lock().push(*v)))
}

fn name_strategy() -> impl Strategy<Value = String> {
    "[a-z.]{1,8}"
}

proptest! {
    #[test]
    fn prop_on_sees_every_fire_in_order(values in prop::collection::vec(any::<u8>(), 0..64)) {
        let bus: EventManager<u8> = EventManager::new();
        let (seen, observer) = recorder();
        bus.on("e", observer).unwrap();

        for v in &values {
            bus.fire("e", *v).unwrap();
        }
        prop_assert_eq!(&*seen.lock(), &values);
    }

    #[test]
    fn prop_change_matches_consecutive_dedup(values in prop::collection::vec(0u8..4, 0..64)) {
        let bus: EventManager<u8> = EventManager::new();
        let (seen, observer) = recorder();
        bus.change("e", observer).unwrap();

        for v in &values {
            bus.fire("e", *v).unwrap();
        }
        let mut expected = values.clone();
        expected.dedup();
        prop_assert_eq!(&*seen.lock(), &expected);
    }

    #[test]
    fn prop_once_delivers_at_most_one(values in prop::collection::vec(any::<u8>(), 0..16)) {
        let bus: EventManager<u8> = EventManager::new();
        let (seen, observer) = recorder();
        bus.once("e", observer).unwrap();

        for v in &values {
            bus.fire("e", *v).unwrap();
        }
        let expected: Vec<u8> = values.first().copied().into_iter().collect();
        prop_assert_eq!(&*seen.lock(), &expected);
    }

    #[test]
    fn prop_latest_replays_last_fired(values in prop::collection::vec(any::<u8>(), 1..16)) {
        let bus: EventManager<u8> = EventManager::new();
        for v in &values {
            bus.fire("e", *v).unwrap();
        }

        let (seen, observer) = recorder();
        bus.latest("e", observer).unwrap();
        prop_assert!(seen.lock().is_empty());
        bus.run_pending();
        prop_assert_eq!(&*seen.lock(), &vec![*values.last().unwrap()]);
    }

    #[test]
    fn prop_observe_identity(a in name_strategy(), b in name_strategy()) {
        let bus: EventManager<u8> = EventManager::new();
        let first = bus.observe(&a).unwrap();
        let second = bus.observe(&b).unwrap();
        prop_assert_eq!(first.same_topic(&second), a == b);
    }

    #[test]
    fn prop_fire_only_reaches_matching_name(
        listened in name_strategy(),
        fired in name_strategy(),
        v in any::<u8>(),
    ) {
        let bus: EventManager<u8> = EventManager::new();
        let (seen, observer) = recorder();
        bus.on(&listened, observer).unwrap();

        bus.fire(&fired, v).unwrap();
        let expected = if listened == fired { vec![v] } else { Vec::new() };
        prop_assert_eq!(&*seen.lock(), &expected);
    }

    #[test]
    fn prop_off_silences_listeners(count in 0usize..8, v in any::<u8>()) {
        let bus: EventManager<u8> = EventManager::new();
        let (seen, observer) = recorder();
        for _ in 0..count {
            bus.on("e", observer.clone()).unwrap();
        }

        prop_assert_eq!(bus.off("e").unwrap(), count);
        bus.fire("e", v).unwrap();
        prop_assert!(seen.lock().is_empty());
        prop_assert!(bus.has_latest("e"));
    }
}
