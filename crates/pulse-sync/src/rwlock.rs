//! Fair reader/writer lock.
//!
//! Three counting semaphores — `order` (serializes entry for FIFO
//! fairness), `access` (the exclusive resource lock), `read` (guards the
//! reader counter) — plus a reader count, arranged so that neither readers
//! nor a waiting writer can starve each other.

use crate::error::SyncResult;
use crate::semaphore::Semaphore;
use std::sync::Mutex;
use std::time::Duration;

/// Which side of the lock a caller wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Read,
    Write,
}

/// A fair reader/writer lock: many concurrent readers, or one writer,
/// with neither side starved.
#[derive(Debug)]
pub struct RdWrLock {
    order: Semaphore,
    access: Semaphore,
    read: Semaphore,
    n_readers: Mutex<u32>,
}

impl Default for RdWrLock {
    fn default() -> Self {
        Self::new()
    }
}

impl RdWrLock {
    /// Creates a new, unlocked reader/writer lock.
    pub fn new() -> Self {
        Self {
            order: Semaphore::new(1),
            access: Semaphore::new(1),
            read: Semaphore::new(1),
            n_readers: Mutex::new(0),
        }
    }

    /// Blocks until the caller may enter the critical section for `scope`.
    pub fn req(&self, scope: Scope) {
        match scope {
            Scope::Read => self.rd_enter(),
            Scope::Write => self.wr_enter(),
        }
    }

    /// Releases a critical section previously entered via [`Self::req`] (or
    /// a successful [`Self::timed_req`]) for `scope`.
    pub fn exit(&self, scope: Scope) {
        match scope {
            Scope::Read => self.rd_exit(),
            Scope::Write => self.wr_exit(),
        }
    }

    /// As [`Self::req`], but gives up after `rel_timeout` and returns
    /// `Err(SyncError::Timeout)` instead of blocking indefinitely. The
    /// caller's place in the `order` line is always released before
    /// returning, timeout or not, so a timed-out waiter never blocks
    /// subsequent entrants.
    pub fn timed_req(&self, scope: Scope, rel_timeout: Duration) -> SyncResult<()> {
        match scope {
            Scope::Read => self.rd_timed_enter(rel_timeout),
            Scope::Write => self.wr_timed_enter(rel_timeout),
        }
    }

    fn wr_enter(&self) {
        self.order.wait();
        self.access.wait();
        self.order.post();
    }

    fn wr_exit(&self) {
        self.access.post();
    }

    fn wr_timed_enter(&self, rel_timeout: Duration) -> SyncResult<()> {
        // Both waits race the same deadline. `order` is only posted once we
        // know we actually hold it — posting it unconditionally after a
        // timed-out `order` wait would over-count a semaphore this caller
        // never acquired, corrupting fairness for later entrants.
        self.order.timed_wait(rel_timeout)?;
        let result = self.access.timed_wait(rel_timeout);
        self.order.post();
        result
    }

    fn rd_enter(&self) {
        self.order.wait();
        self.read.wait();
        {
            let mut n = self.n_readers.lock().unwrap_or_else(|e| e.into_inner());
            if *n == 0 {
                self.access.wait();
            }
            *n += 1;
        }
        self.order.post();
        self.read.post();
    }

    fn rd_exit(&self) {
        self.read.wait();
        {
            let mut n = self.n_readers.lock().unwrap_or_else(|e| e.into_inner());
            *n -= 1;
            if *n == 0 {
                self.access.post();
            }
        }
        self.read.post();
    }

    fn rd_timed_enter(&self, rel_timeout: Duration) -> SyncResult<()> {
        self.order.wait();
        self.read.wait();
        let result = {
            let mut n = self.n_readers.lock().unwrap_or_else(|e| e.into_inner());
            if *n == 0 {
                match self.access.timed_wait(rel_timeout) {
                    Ok(()) => {
                        *n += 1;
                        Ok(())
                    }
                    Err(e) => Err(e),
                }
            } else {
                *n += 1;
                Ok(())
            }
        };
        self.order.post();
        self.read.post();
        result
    }

    /// Current reader count. Diagnostic only.
    pub fn reader_count(&self) -> u32 {
        *self.n_readers.lock().unwrap_or_else(|e| e.into_inner())
    }
}
