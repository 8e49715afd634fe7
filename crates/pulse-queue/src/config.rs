/// Configuration for [`crate::PcQueue`].
///
/// Just a capacity: element size is carried by the Rust type parameter
/// rather than a byte count.
#[derive(Debug, Clone, Copy)]
pub struct PcQueueConfig {
    /// Maximum number of elements the queue can hold at once.
    pub capacity: usize,
}

impl PcQueueConfig {
    /// Creates a configuration for a queue of the given capacity.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is 0 — a zero-capacity queue can never be
    /// pushed to or popped from and is almost certainly a configuration
    /// mistake.
    pub const fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "PcQueue capacity must be > 0");
        Self { capacity }
    }
}
