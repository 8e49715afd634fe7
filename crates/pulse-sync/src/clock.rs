//! Clock source used to convert relative timeouts to absolute deadlines.
//!
//! Timed waits compute an absolute deadline up front rather than
//! re-measuring a relative timeout after every spurious wakeup.
//! `std::time::Instant` is already the platform monotonic clock on every
//! target Rust supports, so this module is a thin, testable seam rather
//! than a parallel clock implementation.

use std::time::{Duration, Instant, SystemTime};

/// A point in monotonic time, suitable for deadline arithmetic.
pub type Deadline = Instant;

/// Returns the current monotonic instant.
#[inline]
pub fn monotonic_now() -> Instant {
    Instant::now()
}

/// Returns the current wall-clock time, for diagnostics only — never used
/// for deadline arithmetic (which must be monotonic to avoid being skewed by
/// clock adjustments).
#[inline]
pub fn realtime_now() -> SystemTime {
    SystemTime::now()
}

/// Converts a relative timeout into an absolute deadline against the
/// monotonic clock.
#[inline]
pub fn deadline_after(rel_timeout: Duration) -> Instant {
    monotonic_now() + rel_timeout
}
