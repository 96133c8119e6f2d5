//! Listener registrations.
//!
//! This module holds what a listener is made of and how it is torn down:
//! - [`Observer`]: the callbacks a listener provides
//! - [`Subscription`]: the cancelable handle returned to the caller
//! - the registry that mass-cancels handles per event name

mod observer;
pub(crate) mod registry;
pub(crate) mod types;

pub use observer::Observer;
pub(crate) use registry::SubscriptionRegistry;
pub use types::Subscription;
