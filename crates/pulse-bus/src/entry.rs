//! The fan-out record deposited into subscribed RXQs.

use pulse_pool::ChunkHandle;
use std::sync::Arc;

/// One unit of fan-out: a publish's payload plus its identifier, as
/// delivered to a single subscriber's RXQ.
///
/// A packet is either backed by a chunk reserved from one of the bus's
/// pools, or by an externally-owned buffer published without copying. Rather
/// than thread a nullable pool reference through a single struct, those two
/// cases are exposed as distinct variants: a [`ChunkHandle`] for the pooled
/// case, an `Arc<[u8]>` for the zero-copy external case. Dropping a `Pooled`
/// entry (e.g. via [`crate::Bus::rxq_pop_front`]) releases its chunk
/// reference.
pub enum ReceiveEntry {
    /// A packet backed by a chunk from one of the bus's pools.
    Pooled {
        pid: u32,
        size: usize,
        chunk: ChunkHandle,
    },
    /// A packet backed by application-owned memory (zero-copy publish of an
    /// externally managed buffer).
    External { pid: u32, data: Arc<[u8]> },
}

impl ReceiveEntry {
    /// The packet identifier this entry was published under.
    pub fn pid(&self) -> u32 {
        match self {
            ReceiveEntry::Pooled { pid, .. } | ReceiveEntry::External { pid, .. } => *pid,
        }
    }

    /// The packet's size in bytes.
    pub fn size(&self) -> usize {
        match self {
            ReceiveEntry::Pooled { size, .. } => *size,
            ReceiveEntry::External { data, .. } => data.len(),
        }
    }

    /// A view of the packet's bytes.
    pub fn bytes(&self) -> &[u8] {
        match self {
            ReceiveEntry::Pooled { chunk, size, .. } => &chunk.bytes()[..*size],
            ReceiveEntry::External { data, .. } => data,
        }
    }
}

impl std::fmt::Debug for ReceiveEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiveEntry")
            .field("pid", &self.pid())
            .field("size", &self.size())
            .finish()
    }
}
