use thiserror::Error;

/// Errors returned by [`crate::PcQueue`] operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum QueueError {
    /// A timed pop/peek's deadline expired before an element arrived.
    /// Observable state is unchanged.
    #[error("timed operation expired")]
    Timeout,

    /// The queue's internal lock was poisoned by a panicking holder.
    #[error("queue lock poisoned by a panicked holder")]
    Poisoned,
}

pub type QueueResult<T> = Result<T, QueueError>;

impl From<pulse_sync::SyncError> for QueueError {
    fn from(err: pulse_sync::SyncError) -> Self {
        match err {
            pulse_sync::SyncError::Timeout => QueueError::Timeout,
            pulse_sync::SyncError::Poisoned => QueueError::Poisoned,
        }
    }
}
