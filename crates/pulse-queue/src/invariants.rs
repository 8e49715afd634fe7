//! Debug assertion macros for `PcQueue` invariants.
//!
//! Zero-cost-in-release macros, active only under `debug_assertions`.

/// Semaphore-count coherence, queue half: the number of elements currently
/// buffered never exceeds capacity.
macro_rules! debug_assert_bounded_count {
    ($count:expr, $capacity:expr) => {
        debug_assert!(
            $count <= $capacity,
            "queue count {} exceeds capacity {}",
            $count,
            $capacity
        )
    };
}

/// A timed operation that returned `Timeout` must not have changed the
/// queue's count.
macro_rules! debug_assert_count_unchanged_on_timeout {
    ($before:expr, $after:expr) => {
        debug_assert_eq!(
            $before, $after,
            "queue count changed from {} to {} on a timed-out operation",
            $before, $after
        )
    };
}

pub(crate) use debug_assert_bounded_count;
pub(crate) use debug_assert_count_unchanged_on_timeout;
