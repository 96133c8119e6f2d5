//! Error types for the event bus.

use thiserror::Error;

/// Raised before any side effect when an argument is unusable.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("event name must be a non-empty string")]
    EmptyName,
}

/// Main error type for bus operations.
#[derive(Debug, Error)]
pub enum BusError {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("replay scheduler is closed")]
    SchedulerClosed,

    #[error("failed to start replay worker: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure reported by a listener callback.
///
/// Never propagates out of `fire`; it is handed to the failing listener's
/// own error channel instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ListenerError {
    #[error("listener failed: {0}")]
    Failed(String),

    #[error("listener panicked: {0}")]
    Panicked(String),
}

impl ListenerError {
    /// Build a `Failed` error from anything printable.
    pub fn msg(message: impl std::fmt::Display) -> Self {
        ListenerError::Failed(message.to_string())
    }

    pub(crate) fn from_panic(payload: Box<dyn std::any::Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        ListenerError::Panicked(message)
    }
}

/// Result type for bus operations.
pub type Result<T> = std::result::Result<T, BusError>;
