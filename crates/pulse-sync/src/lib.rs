//! Portable blocking synchronization primitives.
//!
//! `pulse-sync` provides the thin building blocks the rest of the `pulse-rs`
//! workspace composes: a counting [`Semaphore`], thin [`PulseMutex`]/
//! [`Condvar`] wrappers, and a fair three-semaphore reader/writer lock
//! ([`RdWrLock`]). All blocking operations have a timed variant that
//! converts a relative [`std::time::Duration`] into an absolute deadline
//! once at entry, so repeated spurious wakeups cannot silently extend a
//! wait.

mod clock;
mod condvar;
mod error;
mod flags;
mod mutex;
mod rwlock;
mod semaphore;

pub use clock::{deadline_after, monotonic_now, realtime_now, Deadline};
pub use condvar::Condvar;
pub use error::{SyncError, SyncResult};
pub use flags::Flags;
pub use mutex::PulseMutex;
pub use rwlock::{RdWrLock, Scope};
pub use semaphore::Semaphore;
