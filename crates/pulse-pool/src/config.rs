use pulse_sync::Flags;

/// Configuration for [`crate::Pool`].
///
/// A fixed element size and count, plus configuration flags. There is no
/// caller-supplied storage pointer to configure: the `NOALLOC_*` flags are
/// accepted for API parity but this pool always owns its own storage.
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Size of each chunk, in bytes.
    pub chunk_size: usize,
    /// Number of chunks in the pool.
    pub capacity: usize,
    /// Configuration flags. Only [`Flags::ZALLOC`] affects behavior.
    pub flags: Flags,
}

impl PoolConfig {
    /// Creates a configuration for `capacity` chunks of `chunk_size` bytes
    /// each, with no flags set.
    ///
    /// # Panics
    ///
    /// Panics if `chunk_size` or `capacity` is 0.
    pub const fn new(chunk_size: usize, capacity: usize) -> Self {
        assert!(chunk_size > 0, "Pool chunk_size must be > 0");
        assert!(capacity > 0, "Pool capacity must be > 0");
        Self {
            chunk_size,
            capacity,
            flags: Flags::empty(),
        }
    }

    /// Builder-style setter for [`Self::flags`].
    pub const fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Total bytes of chunk storage this pool will allocate.
    ///
    /// Kept as a diagnostic/sizing helper even though this pool always owns
    /// its storage outright.
    pub const fn storage_bytes(&self) -> usize {
        self.chunk_size * self.capacity
    }
}
