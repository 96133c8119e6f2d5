//! Per-name views of the broadcast core.
//!
//! - the router builds and caches one topic per event name
//! - a topic holds that name's listeners in subscription order
//! - [`Observable`] is the public, subscribable face of a topic

mod observable;
pub(crate) mod router;
pub(crate) mod topic;

pub use observable::Observable;
pub(crate) use router::Router;
pub use topic::Comparer;
