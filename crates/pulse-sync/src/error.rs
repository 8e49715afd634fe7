use thiserror::Error;

/// Errors shared by every blocking primitive in this crate.
///
/// Collapsed to the subset that is distinguishable at the Rust type level:
/// a timed wait either succeeds, times out, or (if the underlying lock was
/// poisoned by a panicking holder) reports that instead of silently
/// continuing with a possibly-inconsistent value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SyncError {
    /// A timed operation's deadline expired before the resource became
    /// available. Observable state is left exactly as it was before the call.
    #[error("timed wait expired")]
    Timeout,

    /// The underlying `std::sync::Mutex`/`Condvar` was poisoned by a thread
    /// that panicked while holding it.
    #[error("lock poisoned by a panicked holder")]
    Poisoned,
}

pub type SyncResult<T> = Result<T, SyncError>;
