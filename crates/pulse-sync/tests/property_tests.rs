//! Property-based tests for `Semaphore`'s counting invariant.
//!
//! One `proptest!` block per invariant, run against sequences of operations
//! rather than fixed examples.

use proptest::prelude::*;
use pulse_sync::Semaphore;

proptest! {
    /// The semaphore's count after any sequence of `post`/`try_wait` calls
    /// equals the number of posts minus the number of successful waits —
    /// it can never go negative (try_wait simply fails instead).
    #[test]
    fn count_matches_post_minus_successful_wait(
        ops in prop::collection::vec(prop::bool::ANY, 0..200),
    ) {
        let sem = Semaphore::new(0);
        let mut expected: i64 = 0;

        for is_post in ops {
            if is_post {
                sem.post();
                expected += 1;
            } else if sem.try_wait() {
                expected -= 1;
            }
            prop_assert_eq!(sem.count() as i64, expected);
            prop_assert!(expected >= 0);
        }
    }

    /// A `timed_wait` that fails never changes the observable count: timed
    /// operations have no side effect on timeout.
    #[test]
    fn failed_timed_wait_is_a_no_op(initial in 0usize..5) {
        let sem = Semaphore::new(initial);
        // Drain it completely first so the timed wait is guaranteed to time out.
        while sem.try_wait() {}
        let before = sem.count();
        let result = sem.timed_wait(std::time::Duration::from_millis(5));
        prop_assert!(result.is_err());
        prop_assert_eq!(sem.count(), before);
    }
}
