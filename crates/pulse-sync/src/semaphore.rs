//! Counting semaphore with timed waits.
//!
//! A non-negative integer count guarded by a mutex, with `post`/`wait`/
//! `try_wait`/`timed_wait`, built on `std::sync::{Mutex, Condvar}`.

use crate::error::{SyncError, SyncResult};
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A counting semaphore.
///
/// `wait` blocks indefinitely while the count is zero; `post` increments the
/// count and wakes exactly one waiter. `timed_wait` wakes on either resource
/// availability or deadline expiry — it never returns a spurious timeout
/// while the count is in fact positive, and never silently drops the
/// request.
#[derive(Debug)]
pub struct Semaphore {
    count: Mutex<usize>,
    available: Condvar,
}

impl Semaphore {
    /// Creates a semaphore with the given initial count.
    pub fn new(initial: usize) -> Self {
        Self {
            count: Mutex::new(initial),
            available: Condvar::new(),
        }
    }

    /// Increments the count and wakes one waiter.
    pub fn post(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        *count += 1;
        self.available.notify_one();
    }

    /// Blocks until the count is positive, then decrements it.
    pub fn wait(&self) {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        while *count == 0 {
            count = self
                .available
                .wait(count)
                .unwrap_or_else(|e| e.into_inner());
        }
        *count -= 1;
    }

    /// Decrements the count without blocking if it is positive.
    ///
    /// Returns `true` if a slot was acquired, `false` if the count was zero.
    pub fn try_wait(&self) -> bool {
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        if *count > 0 {
            *count -= 1;
            true
        } else {
            false
        }
    }

    /// Blocks until the count is positive or `rel_timeout` elapses.
    ///
    /// A relative timeout is converted to an absolute deadline once, at
    /// entry, so repeated spurious wakeups cannot extend the effective
    /// wait.
    pub fn timed_wait(&self, rel_timeout: Duration) -> SyncResult<()> {
        let deadline = Instant::now() + rel_timeout;
        let mut count = self.count.lock().unwrap_or_else(|e| e.into_inner());
        loop {
            if *count > 0 {
                *count -= 1;
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(SyncError::Timeout);
            }
            let (guard, result) = self
                .available
                .wait_timeout(count, deadline - now)
                .unwrap_or_else(|e| e.into_inner());
            count = guard;
            if *count == 0 && result.timed_out() {
                return Err(SyncError::Timeout);
            }
        }
    }

    /// Returns the current count. Only reliable under external
    /// synchronization — any informational accessor on a live semaphore is.
    pub fn count(&self) -> usize {
        *self.count.lock().unwrap_or_else(|e| e.into_inner())
    }
}
