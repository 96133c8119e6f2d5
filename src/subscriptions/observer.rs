//! Listener callbacks.
//!
//! An [`Observer`] bundles the three callbacks a listener may provide. It is
//! resolved once at the call boundary, so the manager never has to guess what
//! kind of argument it was handed.

use crate::error::ListenerError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

type NextFn<T> = Arc<dyn Fn(&T) -> Result<(), ListenerError> + Send + Sync>;
type ErrorFn = Arc<dyn Fn(&ListenerError) + Send + Sync>;
type CompleteFn = Arc<dyn Fn() + Send + Sync>;

/// Capability set `{ on_next, on_error?, on_complete? }` for one listener.
///
/// Any `Fn(&T)` closure converts into an observer with only `on_next` set:
///
/// ```
/// use herald::Observer;
///
/// let observer: Observer<i32> = Observer::new(|v: &i32| println!("got {v}"))
///     .on_error(|e| eprintln!("listener failed: {e}"))
///     .on_complete(|| println!("done"));
/// # let _ = observer;
/// ```
pub struct Observer<T> {
    next: NextFn<T>,
    error: Option<ErrorFn>,
    complete: Option<CompleteFn>,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self {
            next: Arc::clone(&self.next),
            error: self.error.clone(),
            complete: self.complete.clone(),
        }
    }
}

impl<T> Observer<T> {
    /// Observer with an infallible `on_next`.
    pub fn new<F>(on_next: F) -> Self
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        Self::fallible(move |value: &T| {
            on_next(value);
            Ok(())
        })
    }

    /// Observer whose `on_next` may report a failure.
    ///
    /// An `Err` is routed to this observer's `on_error`; delivery to other
    /// listeners is unaffected.
    pub fn fallible<F>(on_next: F) -> Self
    where
        F: Fn(&T) -> Result<(), ListenerError> + Send + Sync + 'static,
    {
        Self {
            next: Arc::new(on_next),
            error: None,
            complete: None,
        }
    }

    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&ListenerError) + Send + Sync + 'static,
    {
        self.error = Some(Arc::new(on_error));
        self
    }

    /// Called when the stream ends on its own (a `once` listener after its
    /// delivery). Not called on unsubscribe.
    pub fn on_complete<F>(mut self, on_complete: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.complete = Some(Arc::new(on_complete));
        self
    }

    pub fn has_error_handler(&self) -> bool {
        self.error.is_some()
    }

    /// Invoke `on_next`, turning a panic into `ListenerError::Panicked`.
    pub(crate) fn next(&self, value: &T) -> Result<(), ListenerError> {
        match catch_unwind(AssertUnwindSafe(|| (self.next)(value))) {
            Ok(result) => result,
            Err(payload) => Err(ListenerError::from_panic(payload)),
        }
    }

    /// Hand an error to `on_error`. Returns false when there is no handler or
    /// the handler itself panicked.
    pub(crate) fn error(&self, err: &ListenerError) -> bool {
        match &self.error {
            Some(on_error) => catch_unwind(AssertUnwindSafe(|| on_error(err))).is_ok(),
            None => false,
        }
    }

    pub(crate) fn complete(&self) -> Result<(), ListenerError> {
        match &self.complete {
            Some(on_complete) => catch_unwind(AssertUnwindSafe(|| on_complete()))
                .map_err(ListenerError::from_panic),
            None => Ok(()),
        }
    }
}

impl<T, F> From<F> for Observer<T>
where
    F: Fn(&T) + Send + Sync + 'static,
{
    fn from(on_next: F) -> Self {
        Observer::new(on_next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;

    #[test]
    fn test_closure_converts_to_observer() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let observer: Observer<i32> = (move |v: &i32| sink.lock().push(*v)).into();

        observer.next(&3).unwrap();
        assert_eq!(*seen.lock(), vec![3]);
        assert!(!observer.has_error_handler());
    }

    #[test]
    fn test_fallible_error_is_returned() {
        let observer: Observer<i32> =
            Observer::fallible(|v: &i32| Err(ListenerError::msg(format!("bad {v}"))));
        assert_eq!(
            observer.next(&1),
            Err(ListenerError::Failed("bad 1".to_string()))
        );
    }

    #[test]
    fn test_panic_becomes_error() {
        let observer: Observer<i32> = Observer::new(|_v: &i32| panic!("kaboom"));
        assert_eq!(
            observer.next(&1),
            Err(ListenerError::Panicked("kaboom".to_string()))
        );
    }

    #[test]
    fn test_error_handler_receives_error() {
        let errors = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&errors);
        let observer: Observer<i32> =
            Observer::new(|_v: &i32| {}).on_error(move |e| sink.lock().push(e.clone()));

        assert!(observer.error(&ListenerError::msg("x")));
        assert_eq!(errors.lock().len(), 1);
    }

    #[test]
    fn test_error_without_handler_reports_false() {
        let observer: Observer<i32> = Observer::new(|_v: &i32| {});
        assert!(!observer.error(&ListenerError::msg("x")));
    }
}
