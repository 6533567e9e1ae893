use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use crate::protocol::message::CalcState;
use crate::site::errors::SyncError;

/// Why the site was released.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum CompletionSource {
    /// A terminal STATUS frame was read.
    Reported,
    /// The stream ended without one.
    ChannelClosed,
    /// The stream could no longer be framed.
    ProtocolError,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Completion {
    pub state: CalcState,
    pub source: CompletionSource,
}

impl Completion {
    #[must_use]
    pub fn reported(state: CalcState) -> Self {
        Self {
            state,
            source: CompletionSource::Reported,
        }
    }

    #[must_use]
    pub fn aborted(source: CompletionSource) -> Self {
        Self {
            state: CalcState::Aborted,
            source,
        }
    }

    #[must_use]
    pub fn is_done(&self) -> bool {
        self.state == CalcState::Done
    }
}

/// Latest non-terminal status seen on the channel.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Snapshot {
    pub state: Option<CalcState>,
    pub progress: f32,
    pub frames: u64,
}

#[derive(Debug)]
struct LatchState {
    completion: Option<Completion>,
    snapshot: Snapshot,
}

/// One-shot completion latch. The first signal wins; later ones are ignored.
#[derive(Debug)]
pub(crate) struct CompletionLatch {
    state: Mutex<LatchState>,
    signaled: Condvar,
}

impl CompletionLatch {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LatchState {
                completion: None,
                snapshot: Snapshot {
                    state: None,
                    progress: 0.0,
                    frames: 0,
                },
            }),
            signaled: Condvar::new(),
        }
    }

    // A panicking watcher must not wedge the controller.
    fn lock(&self) -> MutexGuard<'_, LatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns whether this call released the latch.
    pub(crate) fn signal(&self, completion: Completion) -> bool {
        let mut guard = self.lock();
        if guard.completion.is_some() {
            return false;
        }

        guard.completion = Some(completion);
        drop(guard);
        self.signaled.notify_all();
        true
    }

    pub(crate) fn record_state(&self, state: CalcState) {
        let mut guard = self.lock();
        guard.snapshot.state = Some(state);
        guard.snapshot.frames += 1;
    }

    pub(crate) fn record_progress(&self, progress: f32) {
        let mut guard = self.lock();
        guard.snapshot.progress = progress;
        guard.snapshot.frames += 1;
    }

    pub(crate) fn record_frame(&self) {
        self.lock().snapshot.frames += 1;
    }

    pub(crate) fn completion(&self) -> Option<Completion> {
        self.lock().completion
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.lock().snapshot
    }

    pub(crate) fn wait(&self) -> Completion {
        let mut guard = self.lock();
        loop {
            if let Some(completion) = guard.completion {
                return completion;
            }
            guard = self
                .signaled
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    pub(crate) fn wait_timeout(&self, timeout: Duration) -> Result<Completion, SyncError> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();

        loop {
            if let Some(completion) = guard.completion {
                return Ok(completion);
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(SyncError::Timeout(timeout));
            }

            guard = self
                .signaled
                .wait_timeout(guard, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_first_signal_wins() {
        let latch = CompletionLatch::new();

        assert!(latch.signal(Completion::reported(CalcState::Done)));
        assert!(!latch.signal(Completion::aborted(CompletionSource::ChannelClosed)));
        assert_eq!(latch.wait(), Completion::reported(CalcState::Done));
    }

    #[test]
    fn test_wait_timeout_expires_when_pending() {
        let latch = CompletionLatch::new();

        assert_eq!(
            latch.wait_timeout(Duration::from_millis(20)),
            Err(SyncError::Timeout(Duration::from_millis(20)))
        );
    }

    #[test]
    fn test_wait_wakes_on_signal_from_other_thread() {
        let latch = Arc::new(CompletionLatch::new());
        let signaller = latch.clone();

        let handle = thread::spawn(move || {
            thread::sleep(Duration::from_millis(10));
            signaller.signal(Completion::reported(CalcState::Error));
        });

        assert_eq!(latch.wait(), Completion::reported(CalcState::Error));
        handle.join().unwrap();
    }

    #[test]
    fn test_snapshot_tracks_latest_state_and_progress() {
        let latch = CompletionLatch::new();

        latch.record_state(CalcState::Calculating);
        latch.record_progress(0.5);
        latch.record_frame();

        assert_eq!(
            latch.snapshot(),
            Snapshot {
                state: Some(CalcState::Calculating),
                progress: 0.5,
                frames: 3
            }
        );
    }
}
