use thiserror::Error;

/// Errors returned by [`crate::Pool`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PoolError {
    /// A timed request's deadline expired before a chunk became free.
    /// Observable state (free/allocated sets, refcounts) is unchanged.
    #[error("timed request expired")]
    Timeout,

    /// A handle passed to `release`/`ref_add`/`ref_remove`/`ref_count`
    /// does not belong to this pool, or does not name a chunk currently in
    /// the allocated set.
    #[error("chunk handle does not belong to this pool or is not allocated")]
    InvalidChunk,

    /// The pool's internal lock was poisoned by a panicking holder.
    #[error("pool lock poisoned by a panicked holder")]
    Poisoned,
}

pub type PoolResult<T> = Result<T, PoolError>;

impl From<pulse_sync::SyncError> for PoolError {
    fn from(err: pulse_sync::SyncError) -> Self {
        match err {
            pulse_sync::SyncError::Timeout => PoolError::Timeout,
            pulse_sync::SyncError::Poisoned => PoolError::Poisoned,
        }
    }
}
