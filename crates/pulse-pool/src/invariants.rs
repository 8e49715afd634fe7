//! Debug assertion macros for `Pool` invariants.
//!
//! Zero-cost-in-release macros, active only under `debug_assertions`.

/// Pool conservation: free-set and allocated-set partition every chunk
/// exactly once.
macro_rules! debug_assert_partition {
    ($free_len:expr, $allocated_len:expr, $capacity:expr) => {
        debug_assert_eq!(
            $free_len + $allocated_len,
            $capacity,
            "free ({}) + allocated ({}) != capacity ({})",
            $free_len,
            $allocated_len,
            $capacity
        )
    };
}

/// No lost chunk: after refcount returns to 0, the chunk must be back in
/// the free set and nowhere else.
macro_rules! debug_assert_chunk_freed_once {
    ($allocated:expr, $index:expr) => {
        debug_assert!(
            !$allocated.contains(&$index),
            "chunk {} freed while still marked allocated",
            $index
        )
    };
}

pub(crate) use debug_assert_chunk_freed_once;
pub(crate) use debug_assert_partition;
