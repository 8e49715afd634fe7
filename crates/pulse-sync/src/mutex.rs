//! Thin portable mutex wrapper.
//!
//! `PulseMutex<T>` wraps `std::sync::Mutex<T>`, translating lock poisoning
//! into [`SyncError`] instead of panicking, so callers upstream
//! (`pulse-queue`, `pulse-pool`, `pulse-bus`) have one error type to
//! propagate.

use crate::error::{SyncError, SyncResult};
use std::sync::{Mutex, MutexGuard};

/// A mutex that reports poisoning as a [`SyncError`] rather than panicking.
#[derive(Debug, Default)]
pub struct PulseMutex<T> {
    inner: Mutex<T>,
}

impl<T> PulseMutex<T> {
    /// Creates a new mutex wrapping `value`.
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(value),
        }
    }

    /// Acquires the lock, blocking the calling thread.
    pub fn lock(&self) -> SyncResult<MutexGuard<'_, T>> {
        self.inner.lock().map_err(|_| SyncError::Poisoned)
    }

    /// Acquires the lock, recovering the guard even if a previous holder
    /// panicked. Used on paths where the invariant being protected is
    /// cheap to re-validate (the pool/queue invariants re-check their own
    /// bookkeeping on every operation regardless).
    pub fn lock_recover(&self) -> MutexGuard<'_, T> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}
