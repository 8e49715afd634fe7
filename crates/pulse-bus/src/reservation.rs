//! In-progress publishes: a chunk held by the publisher before release.

use pulse_pool::ChunkHandle;
use std::sync::Arc;

/// A reservation obtained from [`crate::Bus::publish_reserve`] (or
/// constructed directly for a zero-copy external publish), filled by the
/// caller, then consumed by [`crate::Bus::publish_release`].
///
/// Rather than thread a nullable pool reference through one struct to
/// distinguish a pool-backed reservation from an externally-owned buffer,
/// the two cases are exposed as distinct variants.
pub enum Reservation {
    /// A chunk reserved from one of the bus's pools. `chunk`'s refcount is
    /// exactly 1 until `publish_release` fans it out.
    Pooled {
        pool_index: usize,
        chunk: ChunkHandle,
        size: usize,
    },
    /// Application-owned memory published without allocating from a pool.
    /// The application is responsible for the buffer outliving every
    /// subscriber.
    External { data: Arc<[u8]> },
}

impl Reservation {
    /// Wraps an externally-owned buffer for zero-copy publish. The
    /// application must not mutate `data` after this call — any
    /// subscriber may read it concurrently once published.
    pub fn external(data: impl Into<Arc<[u8]>>) -> Self {
        Reservation::External { data: data.into() }
    }

    /// The reservation's size in bytes.
    pub fn size(&self) -> usize {
        match self {
            Reservation::Pooled { size, .. } => *size,
            Reservation::External { data } => data.len(),
        }
    }

    /// Mutable access to the reserved bytes, for the caller to fill before
    /// releasing. Only meaningful for [`Reservation::Pooled`] — an
    /// `External` reservation's buffer is expected to already be filled and
    /// immutable once wrapped (it may be concurrently aliased once this
    /// reservation is constructed).
    pub fn as_mut_slice(&mut self) -> Option<&mut [u8]> {
        match self {
            Reservation::Pooled { chunk, size, .. } => Some(&mut chunk.bytes_mut()[..*size]),
            Reservation::External { .. } => None,
        }
    }
}

impl std::fmt::Debug for Reservation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reservation").field("size", &self.size()).finish()
    }
}
