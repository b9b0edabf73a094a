//! Bookkeeping for background flush and cascade tasks.

use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Counts outstanding background tasks and the ones that failed.
///
/// A task that schedules a follow-up registers the follow-up before it
/// finishes itself, so the pending count only reaches zero once a whole
/// flush/cascade chain is done.
#[derive(Debug, Default)]
pub(crate) struct TaskTracker {
    pending: Mutex<usize>,
    idle: Condvar,
    unreported_failures: AtomicUsize,
    total_failures: AtomicU64,
}

impl TaskTracker {
    pub fn begin(&self) {
        *self.pending.lock() += 1;
    }

    pub fn finish(&self) {
        let mut pending = self.pending.lock();
        *pending = pending.saturating_sub(1);
        if *pending == 0 {
            self.idle.notify_all();
        }
    }

    pub fn record_failure(&self) {
        self.unreported_failures.fetch_add(1, Ordering::SeqCst);
        self.total_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Block until no task is outstanding.
    pub fn wait_idle(&self) {
        let mut pending = self.pending.lock();
        while *pending > 0 {
            self.idle.wait(&mut pending);
        }
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        *self.pending.lock()
    }

    /// Failures since the previous call.
    pub fn take_failures(&self) -> usize {
        self.unreported_failures.swap(0, Ordering::SeqCst)
    }

    pub fn total_failures(&self) -> u64 {
        self.total_failures.load(Ordering::Relaxed)
    }
}
