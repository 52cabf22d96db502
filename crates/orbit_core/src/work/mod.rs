//! Serialized background work context.
//!
//! # Responsibility
//! - Own mutable store state on a single dedicated thread.
//! - Execute submitted jobs strictly in submission order.
//! - Hand each caller a completion signal for its job's result.
//!
//! # Invariants
//! - Jobs never run concurrently; there is exactly one worker thread.
//! - Dropping the worker drains already-queued jobs before joining.

use log::error;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

type Job<S> = Box<dyn FnOnce(&mut S) + Send>;

/// Failure modes for waiting on a submitted job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerError {
    /// The worker shut down before the job could report a result.
    Closed,
}

impl Display for WorkerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Closed => write!(f, "store worker has shut down"),
        }
    }
}

impl Error for WorkerError {}

/// Completion signal for one submitted job.
pub struct Completion<T> {
    rx: Receiver<T>,
}

impl<T> Completion<T> {
    /// Blocks until the job has run and returns its result.
    pub fn wait(self) -> Result<T, WorkerError> {
        self.rx.recv().map_err(|_| WorkerError::Closed)
    }

    /// Non-blocking probe; `None` while the job is still queued or running.
    pub fn try_wait(&self) -> Option<T> {
        self.rx.try_recv().ok()
    }
}

/// Single serialized worker owning store state of type `S`.
pub struct StoreWorker<S> {
    sender: Option<Sender<Job<S>>>,
    handle: Option<JoinHandle<()>>,
}

impl<S: Send + 'static> StoreWorker<S> {
    /// Spawns the worker thread and moves `state` onto it.
    pub fn spawn(name: &str, mut state: S) -> std::io::Result<Self> {
        let (sender, receiver) = mpsc::channel::<Job<S>>();
        let handle = thread::Builder::new()
            .name(name.to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    job(&mut state);
                }
            })?;

        Ok(Self {
            sender: Some(sender),
            handle: Some(handle),
        })
    }

    /// Queues one job and returns its completion signal.
    ///
    /// The job runs after every previously submitted job has finished. If the
    /// worker is already gone the completion reports `WorkerError::Closed`.
    pub fn submit<T, F>(&self, job: F) -> Completion<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut S) -> T + Send + 'static,
    {
        let (tx, rx) = mpsc::channel();
        if let Some(sender) = self.sender.as_ref() {
            let wrapped: Job<S> = Box::new(move |state| {
                // Receiver may be dropped when the caller does not care about
                // the result; that is not an error.
                let _ = tx.send(job(state));
            });
            let _ = sender.send(wrapped);
        }
        Completion { rx }
    }
}

impl<S> Drop for StoreWorker<S> {
    fn drop(&mut self) {
        // Closing the queue lets the worker drain pending jobs and exit.
        self.sender.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("event=worker_join module=work status=error error_code=worker_panicked");
            }
        }
    }
}
