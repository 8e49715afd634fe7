//! RXQ identifiers and the queue they name.

use crate::entry::ReceiveEntry;
use pulse_queue::PcQueue;
use std::sync::Arc;

/// An opaque handle to one of a bus's RXQs, returned by
/// [`crate::Bus::rxq_init`].
///
/// Rather than hand back a raw pointer into the bus's internal `Vec<Rxq>`,
/// this wraps the index and is validated against the bus's RXQ count on
/// every use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RxqId(usize);

impl RxqId {
    pub(crate) fn from_raw(index: usize) -> Self {
        Self(index)
    }

    pub(crate) fn raw(self) -> usize {
        self.0
    }
}

/// One of a bus's receive queues: a bounded blocking FIFO of
/// [`ReceiveEntry`] values, owned by the bus for its lifetime.
pub(crate) struct Rxq {
    pub queue: Arc<PcQueue<ReceiveEntry>>,
}
