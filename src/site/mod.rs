//! Completion synchronizer.
//!
//! A [`Site`] owns the watcher thread that consumes the progress channel and
//! a one-shot latch that releases [`Site::wait`] exactly once: on a terminal
//! STATUS frame, or when the channel closes or stops being readable.

pub mod errors;
pub mod latch;
mod watcher;

use std::io::{self, Read};
use std::sync::Arc;
use std::sync::Mutex;
use std::thread::{self, JoinHandle, ThreadId};
use std::time::Duration;

use tracing::warn;

pub use errors::SyncError;
pub use latch::{Completion, CompletionSource, Snapshot};

use latch::CompletionLatch;

#[derive(Debug)]
pub struct Site {
    latch: Arc<CompletionLatch>,
    watcher: Option<JoinHandle<()>>,
    worker: Mutex<Option<ThreadId>>,
}

impl Site {
    /// Starts a watcher thread reading `reader` until completion.
    pub fn watch<R: Read + Send + 'static>(reader: R) -> io::Result<Self> {
        let latch = Arc::new(CompletionLatch::new());
        let watcher_latch = latch.clone();

        let watcher = thread::Builder::new()
            .name("fractal-watcher".to_string())
            .spawn(move || watcher::watch(reader, watcher_latch))?;

        Ok(Self {
            latch,
            watcher: Some(watcher),
            worker: Mutex::new(None),
        })
    }

    /// Records the calculation thread this site reports on.
    pub fn set_worker_identity(&self, id: ThreadId) {
        let mut worker = self.worker.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *worker = Some(id);
    }

    #[must_use]
    pub fn worker_identity(&self) -> Option<ThreadId> {
        *self.worker.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Blocks until the job completes. Every call returns the same value.
    pub fn wait(&self) -> Completion {
        self.latch.wait()
    }

    pub fn wait_timeout(&self, timeout: Duration) -> Result<Completion, SyncError> {
        self.latch.wait_timeout(timeout)
    }

    #[must_use]
    pub fn is_signaled(&self) -> bool {
        self.latch.completion().is_some()
    }

    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        self.latch.snapshot()
    }

    /// Waits for completion, then joins the watcher thread.
    pub fn join(mut self) -> Completion {
        let completion = self.wait();

        if let Some(watcher) = self.watcher.take() {
            if watcher.join().is_err() {
                warn!("watcher thread panicked");
            }
        }

        completion
    }
}
