//! Debug assertion macros for `Bus` invariants.
//!
//! Zero-cost-in-release macros, active only under `debug_assertions`.

/// The subscription sequence is totally ordered by `(pid, rxq)` at every
/// observable moment.
macro_rules! debug_assert_subscriptions_sorted {
    ($list:expr) => {
        debug_assert!($list.is_sorted(), "subscription list is not sorted")
    };
}

/// Fan-out completeness: the number of entries actually delivered for a
/// publish must equal the subscriber-count snapshot taken before fan-out
/// began.
macro_rules! debug_assert_fanout_complete {
    ($delivered:expr, $expected:expr) => {
        debug_assert_eq!(
            $delivered, $expected,
            "delivered {} of {} expected subscribers",
            $delivered, $expected
        )
    };
}

/// Pool selection monotonicity: for `s1 <= s2`, the chunk size chosen for
/// `s1` never exceeds the one chosen for `s2`.
macro_rules! debug_assert_pool_selection_monotonic {
    ($chunk_size_1:expr, $chunk_size_2:expr) => {
        debug_assert!(
            $chunk_size_1 <= $chunk_size_2,
            "pool selection not monotonic ({} > {})",
            $chunk_size_1,
            $chunk_size_2
        )
    };
}

pub(crate) use debug_assert_fanout_complete;
pub(crate) use debug_assert_pool_selection_monotonic;
pub(crate) use debug_assert_subscriptions_sorted;
