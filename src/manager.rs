//! The event manager: public façade tying all components together.

use crate::broadcast::Broadcast;
use crate::error::{BusError, Result};
use crate::latest::LatestValueStore;
use crate::scheduler::{QueueScheduler, Scheduler, ThreadScheduler};
use crate::subscriptions::{Observer, Subscription, SubscriptionRegistry};
use crate::topics::{Observable, Router};
use crate::types::{BusStats, Counters, Envelope, EventName};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

/// How latest-value replay is scheduled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplayMode {
    /// Replays wait in a queue until [`EventManager::run_pending`].
    #[default]
    Queued,
    /// Replays run on a dedicated worker thread.
    Worker,
}

/// Manager configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Name attached to log events, and to the replay worker thread.
    pub label: String,

    /// Replay scheduling strategy.
    pub replay: ReplayMode,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            label: "herald".to_string(),
            replay: ReplayMode::Queued,
        }
    }
}

struct Shared<T> {
    config: ManagerConfig,
    core: Arc<Broadcast<T>>,
    router: Router<T>,
    registry: Arc<SubscriptionRegistry>,
    latest: LatestValueStore<T>,
    scheduler: Arc<dyn Scheduler>,
    counters: Arc<Counters>,
}

/// In-process publish/subscribe bus.
///
/// Named events carry payloads of type `T` to listeners registered on that
/// name. Delivery is synchronous, in subscription order, on the thread that
/// calls [`fire`](EventManager::fire). Listeners may call back into the
/// manager while being delivered to.
///
/// The manager is a cheap handle: clones share the same state, so one bus can
/// be built at startup and handed to every component that needs it.
///
/// ```
/// use herald::EventManager;
/// use std::sync::{Arc, Mutex};
///
/// let bus: EventManager<i32> = EventManager::new();
/// let seen = Arc::new(Mutex::new(Vec::new()));
/// let sink = Arc::clone(&seen);
///
/// bus.on("temp", move |v: &i32| sink.lock().unwrap().push(*v))?;
/// bus.fire("temp", 20)?.fire("temp", 25)?;
/// assert_eq!(*seen.lock().unwrap(), vec![20, 25]);
///
/// bus.off("temp")?;
/// bus.fire("temp", 30)?;
/// assert_eq!(seen.lock().unwrap().len(), 2);
/// # Ok::<(), herald::BusError>(())
/// ```
pub struct EventManager<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for EventManager<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Clone + Send + Sync + 'static> EventManager<T> {
    /// Create a manager with the default configuration.
    pub fn new() -> Self {
        Self::with_scheduler(ManagerConfig::default(), Arc::new(QueueScheduler::new()))
    }

    /// Create a manager from a configuration.
    ///
    /// Fails only if [`ReplayMode::Worker`] is requested and the worker thread
    /// cannot be spawned.
    pub fn with_config(config: ManagerConfig) -> Result<Self> {
        let scheduler: Arc<dyn Scheduler> = match config.replay {
            ReplayMode::Queued => Arc::new(QueueScheduler::new()),
            ReplayMode::Worker => Arc::new(ThreadScheduler::spawn(&config.label)?),
        };
        Ok(Self::with_scheduler(config, scheduler))
    }

    /// Create a manager that replays through a caller-supplied scheduler.
    pub fn with_scheduler(config: ManagerConfig, scheduler: Arc<dyn Scheduler>) -> Self {
        let counters = Arc::new(Counters::default());
        let core = Arc::new(Broadcast::new());
        let router = Router::new(Arc::clone(&core), Arc::clone(&counters));
        debug!(bus = %config.label, replay = ?config.replay, "event manager created");

        Self {
            shared: Arc::new(Shared {
                config,
                core,
                router,
                registry: Arc::new(SubscriptionRegistry::new()),
                latest: LatestValueStore::new(),
                scheduler,
                counters,
            }),
        }
    }

    pub fn config(&self) -> &ManagerConfig {
        &self.shared.config
    }

    fn stream(&self, name: &EventName) -> Observable<T> {
        Observable::new(
            self.shared.router.topic(name),
            Arc::clone(&self.shared.registry),
        )
    }

    // --- Subscribing ---

    /// Stream of payloads fired on `name`.
    ///
    /// Every stream for one name is a view of the same cached topic (see
    /// [`Observable::same_topic`]). Subscriptions made on it are registered,
    /// so [`off`](Self::off) cancels them.
    pub fn observe(&self, name: &str) -> Result<Observable<T>> {
        let name = validate(name)?;
        Ok(self.stream(&name))
    }

    /// Subscribe a listener to `name`.
    pub fn on(&self, name: &str, observer: impl Into<Observer<T>>) -> Result<Subscription> {
        Ok(self.observe(name)?.subscribe(observer))
    }

    /// Subscribe one listener to several names.
    ///
    /// Every name is validated before anything is registered. Returns one
    /// handle per name, in input order.
    pub fn on_each<I, S>(
        &self,
        names: I,
        observer: impl Into<Observer<T>>,
    ) -> Result<Vec<Subscription>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let names = names
            .into_iter()
            .map(|name| validate(name.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let observer = observer.into();

        Ok(names
            .iter()
            .map(|name| self.stream(name).subscribe(observer.clone()))
            .collect())
    }

    /// Subscribe a listener that receives at most one payload.
    ///
    /// The handle goes inactive as the payload is delivered, and the
    /// observer's `on_complete` runs right after its `on_next`.
    pub fn once(&self, name: &str, observer: impl Into<Observer<T>>) -> Result<Subscription> {
        Ok(self.observe(name)?.take(1).subscribe(observer))
    }

    /// Stream for `name` without replay; the caller subscribes manually.
    pub fn latest_stream(&self, name: &str) -> Result<Observable<T>> {
        self.observe(name)
    }

    /// Subscribe a listener and replay the last value fired on `name`.
    ///
    /// The listener is attached first, so fires that happen from here on
    /// reach it. If a value has been fired since the last `off(name)`, one
    /// delivery of it is handed to the scheduler; it never runs inside this
    /// call. A handle cancelled before the replay runs receives nothing.
    pub fn latest(&self, name: &str, observer: impl Into<Observer<T>>) -> Result<Subscription> {
        let name = validate(name)?;
        let (subscription, slot) = self.stream(&name).attach(observer.into());

        if let Some(value) = self.shared.latest.peek(name.as_str()) {
            let job = Box::new(move || {
                if slot.is_active() {
                    slot.deliver(&value);
                }
            });
            if let Err(err) = self.shared.scheduler.schedule(job) {
                subscription.unsubscribe();
                return Err(err);
            }
            Counters::bump(&self.shared.counters.replays_scheduled);
            debug!(
                bus = %self.shared.config.label,
                event = %name,
                listener = %subscription.id(),
                "replay scheduled"
            );
        }

        Ok(subscription)
    }

    /// Subscribe with change detection using a custom comparer.
    ///
    /// `comparer(previous, next)` returns true when `next` should be
    /// suppressed as unchanged.
    pub fn change_by<F>(
        &self,
        name: &str,
        comparer: F,
        observer: impl Into<Observer<T>>,
    ) -> Result<Subscription>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Ok(self.change_stream_by(name, comparer)?.subscribe(observer))
    }

    /// Change-filtered stream using a custom comparer.
    pub fn change_stream_by<F>(&self, name: &str, comparer: F) -> Result<Observable<T>>
    where
        F: Fn(&T, &T) -> bool + Send + Sync + 'static,
    {
        Ok(self.observe(name)?.distinct_until_changed_by(comparer))
    }

    // --- Publishing ---

    /// Publish `payload` on `name`.
    ///
    /// Records the payload as the latest value, then delivers it to every
    /// listener on `name` before returning. Listener failures are reported to
    /// the failing listener and never surface here. Returns the manager so
    /// calls can be chained.
    pub fn fire(&self, name: &str, payload: T) -> Result<&Self> {
        let name = validate(name)?;
        self.shared.latest.record(&name, payload.clone());
        Counters::bump(&self.shared.counters.events_fired);
        trace!(bus = %self.shared.config.label, event = %name, "firing event");

        self.shared.core.emit(&Envelope { name, payload });
        Ok(self)
    }

    // --- Teardown ---

    /// Cancel every registered listener on `name` and forget its latest
    /// value. Returns how many live listeners were cancelled.
    pub fn off(&self, name: &str) -> Result<usize> {
        let name = validate(name)?;
        Ok(self.off_name(&name))
    }

    /// `off` for every name that currently has live registered listeners.
    ///
    /// A name whose listeners were all unsubscribed through their handles is
    /// left alone, latest value included.
    pub fn off_all(&self) -> usize {
        let torn_down = self.shared.registry.cancel_everything();
        let mut cancelled = 0;
        for (name, count) in &torn_down {
            self.shared.latest.clear(name.as_str());
            cancelled += count;
        }
        debug!(
            bus = %self.shared.config.label,
            names = torn_down.len(),
            cancelled,
            "all events turned off"
        );
        cancelled
    }

    fn off_name(&self, name: &EventName) -> usize {
        let cancelled = self.shared.registry.cancel_all(name.as_str());
        let cleared = self.shared.latest.clear(name.as_str());
        debug!(
            bus = %self.shared.config.label,
            event = %name,
            cancelled,
            cleared,
            "event turned off"
        );
        cancelled
    }

    // --- Introspection ---

    /// Listeners currently attached to `name`.
    pub fn listener_count(&self, name: &str) -> usize {
        self.shared
            .router
            .get(name)
            .map_or(0, |topic| topic.listener_count())
    }

    /// Whether a value has been fired on `name` since its last `off`.
    pub fn has_latest(&self, name: &str) -> bool {
        self.shared.latest.contains(name)
    }

    /// The value `latest` would replay for `name`.
    pub fn peek_latest(&self, name: &str) -> Option<T> {
        self.shared.latest.peek(name)
    }

    /// Run replays that are due. One call is one scheduler tick.
    ///
    /// Only does work with [`ReplayMode::Queued`]; the worker thread runs
    /// replays on its own.
    pub fn run_pending(&self) -> usize {
        self.shared.scheduler.run_pending()
    }

    pub fn stats(&self) -> BusStats {
        BusStats {
            active_subscriptions: self.shared.registry.active_count(),
            topics: self.shared.router.len(),
            latest_values: self.shared.latest.len(),
            ..self.shared.counters.snapshot()
        }
    }
}

impl<T: PartialEq + Clone + Send + Sync + 'static> EventManager<T> {
    /// Subscribe with change detection: a payload equal to the previous one
    /// this listener received is suppressed.
    pub fn change(&self, name: &str, observer: impl Into<Observer<T>>) -> Result<Subscription> {
        Ok(self.change_stream(name)?.subscribe(observer))
    }

    /// Change-filtered stream using `PartialEq`.
    pub fn change_stream(&self, name: &str) -> Result<Observable<T>> {
        Ok(self.observe(name)?.distinct_until_changed())
    }
}

impl<T: Clone + Send + Sync + 'static> Default for EventManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for EventManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventManager")
            .field("config", &self.shared.config)
            .finish()
    }
}

/// Bus carrying dynamically-typed JSON payloads.
pub type JsonEventManager = EventManager<serde_json::Value>;

fn validate(name: &str) -> Result<EventName> {
    EventName::new(name).map_err(BusError::from)
}
