//! Thin portable condition-variable wrapper paired with [`PulseMutex`].
//!
//! Pairs a mutex with a condition variable and offers `wait`/`wait_timeout`/
//! `signal`/`broadcast`, the minimal vocabulary the rest of this crate's
//! blocking primitives are built from.

use crate::error::{SyncError, SyncResult};
use std::sync::{Condvar as StdCondvar, MutexGuard};
use std::time::Duration;

/// A condition variable that pairs with [`PulseMutex`].
#[derive(Debug, Default)]
pub struct Condvar {
    inner: StdCondvar,
}

impl Condvar {
    /// Creates a new condition variable.
    pub const fn new() -> Self {
        Self {
            inner: StdCondvar::new(),
        }
    }

    /// Atomically unlocks `guard` and blocks until [`Self::signal`] or
    /// [`Self::broadcast`] wakes this thread, then reacquires the lock.
    pub fn wait<'a, T>(&self, guard: MutexGuard<'a, T>) -> SyncResult<MutexGuard<'a, T>> {
        self.inner.wait(guard).map_err(|_| SyncError::Poisoned)
    }

    /// As [`Self::wait`], but gives up and returns [`SyncError::Timeout`] if
    /// `rel_timeout` elapses first. The guard is always returned (relocked)
    /// regardless of which outcome occurred.
    pub fn wait_timeout<'a, T>(
        &self,
        guard: MutexGuard<'a, T>,
        rel_timeout: Duration,
    ) -> SyncResult<(MutexGuard<'a, T>, bool)> {
        let (guard, result) = self
            .inner
            .wait_timeout(guard, rel_timeout)
            .map_err(|_| SyncError::Poisoned)?;
        Ok((guard, result.timed_out()))
    }

    /// Wakes one waiting thread, if any.
    pub fn signal(&self) {
        self.inner.notify_one();
    }

    /// Wakes all waiting threads.
    pub fn broadcast(&self) {
        self.inner.notify_all();
    }
}
