//! # herald
//!
//! An in-process publish/subscribe event bus. Named events carry typed
//! payloads to any number of listeners, with opt-in replay of the last value
//! and change filtering.
//!
//! ## Core Concepts
//!
//! - **Events**: a non-empty name plus a payload of type `T`
//! - **Listeners**: an [`Observer`] attached to one name, delivered to
//!   synchronously and in subscription order
//! - **Replay**: [`EventManager::latest`] hands the last fired value to a new
//!   listener on the next scheduler tick
//! - **Change filtering**: [`EventManager::change`] drops consecutive equal
//!   payloads
//! - **Teardown**: [`EventManager::off`] and [`EventManager::off_all`] cancel
//!   listeners without the caller keeping handles
//!
//! ## Example
//!
//! ```
//! use herald::{EventManager, Observer};
//!
//! let bus: EventManager<String> = EventManager::new();
//!
//! bus.on("user.login", |name: &String| println!("welcome, {name}"))?;
//! bus.once("user.login", Observer::new(|_: &String| println!("first login")))?;
//!
//! bus.fire("user.login", "ada".to_string())?;
//!
//! // Late subscribers can catch up on the last value.
//! bus.latest("user.login", |name: &String| println!("last login: {name}"))?;
//! bus.run_pending();
//! # Ok::<(), herald::BusError>(())
//! ```

mod broadcast;
pub mod error;
mod latest;
pub mod manager;
pub mod scheduler;
pub mod subscriptions;
pub mod topics;
pub mod types;

// Re-exports
pub use error::{BusError, ListenerError, Result, ValidationError};
pub use manager::{EventManager, JsonEventManager, ManagerConfig, ReplayMode};
pub use scheduler::{Job, QueueScheduler, Scheduler, ThreadScheduler};
pub use subscriptions::{Observer, Subscription};
pub use topics::{Comparer, Observable};
pub use types::{BusStats, Envelope, EventName, ListenerId};
