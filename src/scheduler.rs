//! Deferred execution for latest-value replay.
//!
//! Replay must never run inside the `latest` call that requested it. The
//! [`Scheduler`] trait is the seam: [`QueueScheduler`] holds jobs until the
//! owner's next tick (`run_pending`), [`ThreadScheduler`] hands them to a
//! worker thread.

use crate::error::{BusError, Result};
use crossbeam_channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

/// A unit of deferred work.
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Task-scheduling primitive used for replay.
pub trait Scheduler: Send + Sync {
    /// Queue a job. It must not run before this call returns.
    fn schedule(&self, job: Job) -> Result<()>;

    /// Run jobs that are due on the calling thread and return how many ran.
    ///
    /// Schedulers that run jobs elsewhere return 0.
    fn run_pending(&self) -> usize {
        0
    }
}

/// Queue drained explicitly by its owner.
///
/// A job queued while `run_pending` is draining waits for the next call, so
/// each call is one tick.
pub struct QueueScheduler {
    tx: Sender<Job>,
    rx: Receiver<Job>,
}

impl QueueScheduler {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Jobs waiting for the next tick.
    pub fn pending(&self) -> usize {
        self.rx.len()
    }
}

impl Default for QueueScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler for QueueScheduler {
    fn schedule(&self, job: Job) -> Result<()> {
        self.tx.send(job).map_err(|_| BusError::SchedulerClosed)
    }

    fn run_pending(&self) -> usize {
        let due = self.rx.len();
        let mut ran = 0;
        while ran < due {
            match self.rx.try_recv() {
                Ok(job) => {
                    job();
                    ran += 1;
                }
                Err(_) => break,
            }
        }
        ran
    }
}

/// Runs jobs on a dedicated worker thread.
pub struct ThreadScheduler {
    tx: Mutex<Option<Sender<Job>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl ThreadScheduler {
    /// Spawn the worker thread, named `{label}-replay`.
    pub fn spawn(label: &str) -> Result<Self> {
        let (tx, rx) = unbounded::<Job>();
        let name = format!("{label}-replay");
        let worker = thread::Builder::new().name(name.clone()).spawn(move || {
            for job in rx.iter() {
                if catch_unwind(AssertUnwindSafe(job)).is_err() {
                    warn!(worker = %name, "replay job panicked");
                }
            }
            debug!(worker = %name, "replay worker stopped");
        })?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Stop accepting jobs, let the worker finish what is queued, and join it.
    pub fn shutdown(&self) {
        self.tx.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            // A job may drop the last owner on the worker itself.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }
}

impl Scheduler for ThreadScheduler {
    fn schedule(&self, job: Job) -> Result<()> {
        match self.tx.lock().as_ref() {
            Some(tx) => tx.send(job).map_err(|_| BusError::SchedulerClosed),
            None => Err(BusError::SchedulerClosed),
        }
    }
}

impl Drop for ThreadScheduler {
    fn drop(&mut self) {
        self.shutdown();
    }
}
