use thiserror::Error;

/// Errors returned by [`crate::Bus`] operations.
///
/// Covers invalid arguments, resource exhaustion with a deadline, full
/// downstream queues, and lifecycle misuse; resource exhaustion without a
/// deadline blocks the caller instead of returning an error.
#[derive(Debug, Error)]
pub enum BusError {
    /// No configured pool has a chunk size large enough for the requested
    /// publish size.
    #[error("publish size {size} exceeds the largest configured pool chunk ({max_chunk})")]
    SizeTooLarge { size: usize, max_chunk: usize },

    /// A timed request's deadline expired before a chunk became free.
    #[error("timed publish_reserve expired")]
    Timeout,

    /// `rxq_init` would exceed the bus's configured maximum RXQ count.
    #[error("maximum RXQ count ({max}) exceeded")]
    TooManyRxqs { max: usize },

    /// `subscribe` would exceed the bus's configured maximum subscription
    /// count.
    #[error("maximum subscription count ({max}) exceeded")]
    TooManySubscriptions { max: usize },

    /// `subscribe` called with a `(pid, rxq)` pair already present.
    #[error("rxq already subscribed to pid {pid}")]
    AlreadySubscribed { pid: u32 },

    /// `unsubscribe` called with a `(pid, rxq)` pair that is not present.
    #[error("rxq is not subscribed to pid {pid}")]
    NotSubscribed { pid: u32 },

    /// An [`crate::RxqId`] that does not name a live RXQ on this bus.
    #[error("invalid RXQ id")]
    InvalidRxq,

    /// A synchronous-mode fan-out found a subscribed RXQ full. Since the
    /// publish gate excludes all consumer-side draining while held in write
    /// mode, this indicates a misconfigured RXQ capacity rather than
    /// transient backpressure. Every target RXQ's capacity is checked before
    /// any of them is pushed to, so `delivered` is always `0`: either every
    /// subscriber receives the entry or the fan-out is aborted before
    /// touching any queue, and the references added for the publish are
    /// released without ever having been delivered anywhere.
    #[error("synchronous fan-out for pid {pid} aborted: rxq full, {delivered} of {total} delivered")]
    FanOutFailed { pid: u32, delivered: usize, total: usize },

    /// An asynchronous-mode fan-out partially succeeded: `delivered`
    /// subscribers received the entry, `failed` did not (their added
    /// references were released by dropping the undelivered entries'
    /// `ChunkHandle`s, which returns the chunk to its pool).
    #[error("asynchronous fan-out for pid {pid}: {delivered} delivered, {failed} failed")]
    PartialFanOut { pid: u32, delivered: usize, failed: usize },

    /// Destroying the bus while RXQs are non-empty or reservations are
    /// outstanding.
    #[error("bus destroy attempted with outstanding state: {reason}")]
    OutstandingState { reason: &'static str },

    /// A lower-layer poisoned-lock error bubbled up.
    #[error("internal lock poisoned")]
    Poisoned,

    /// A chunk handle did not belong to the pool it was presented to, or
    /// named a chunk no longer allocated. Indicates a bug in the bus's own
    /// bookkeeping, not a caller error.
    #[error("internal chunk handle invariant violated")]
    Internal,
}

pub type BusResult<T> = Result<T, BusError>;

impl From<pulse_sync::SyncError> for BusError {
    fn from(err: pulse_sync::SyncError) -> Self {
        match err {
            pulse_sync::SyncError::Timeout => BusError::Timeout,
            pulse_sync::SyncError::Poisoned => BusError::Poisoned,
        }
    }
}

impl From<pulse_pool::PoolError> for BusError {
    fn from(err: pulse_pool::PoolError) -> Self {
        match err {
            pulse_pool::PoolError::Timeout => BusError::Timeout,
            pulse_pool::PoolError::InvalidChunk => BusError::Internal,
            pulse_pool::PoolError::Poisoned => BusError::Poisoned,
        }
    }
}

impl From<pulse_queue::QueueError> for BusError {
    fn from(err: pulse_queue::QueueError) -> Self {
        match err {
            pulse_queue::QueueError::Timeout => BusError::Timeout,
            pulse_queue::QueueError::Poisoned => BusError::Poisoned,
        }
    }
}
