//! Shared configuration flag vocabulary.
//!
//! One flag word is defined here and reused across `pulse-pool` and
//! `pulse-bus` rather than each crate inventing its own; `PoolConfig` and
//! `BusConfig` each interpret only the bits relevant to them.

use bitflags::bitflags;

bitflags! {
    /// Configuration bits accepted across `pulse-pool` and `pulse-bus`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Flags: u32 {
        /// Zero a chunk's backing bytes when it is released back to its
        /// pool, so a subsequent `req` never observes a previous tenant's
        /// data.
        const ZALLOC = 1 << 0;

        /// Accepted for API parity with callers that set it, but a no-op:
        /// every handle in this crate owns its own storage unconditionally.
        const NOALLOC_HANDLE = 1 << 1;

        /// As `NOALLOC_HANDLE`, for a pool's element storage.
        const NOALLOC_DATA = 1 << 2;

        /// As `NOALLOC_HANDLE`, for a pool's metadata (free/alloc
        /// bookkeeping).
        const NOALLOC_META = 1 << 3;

        /// `Bus::publish_release` holds the publish gate in read mode
        /// instead of write mode, letting consumers pop concurrently with
        /// an in-progress fan-out.
        const PULSE_ASYNC = 1 << 4;
    }
}

impl Flags {
    /// `NOALLOC_DATA | NOALLOC_META`, a convenience combination for callers
    /// that want every pool in a bus to skip both allocations at once.
    pub const PULSE_POOLS_NOALLOC: Flags = Flags::NOALLOC_DATA.union(Flags::NOALLOC_META);
}

impl Default for Flags {
    fn default() -> Self {
        Flags::empty()
    }
}
