//! Property tests for `Pool`'s conservation and refcount invariants.

use proptest::prelude::*;
use pulse_pool::{Pool, PoolConfig};

#[derive(Debug, Clone, Copy)]
enum Op {
    Req,
    Release,
}

proptest! {
    /// For any legal sequence of req/release pairs, the pool never
    /// over-allocates beyond capacity, and once every handle is dropped the
    /// pool returns to fully empty (no lost chunk).
    #[test]
    fn conservation_holds_for_any_req_release_sequence(
        capacity in 1usize..8,
        ops in prop::collection::vec(prop_oneof![Just(Op::Req), Just(Op::Release)], 0..100),
    ) {
        let pool = Pool::new(PoolConfig::new(16, capacity));
        let mut held = Vec::new();

        for op in ops {
            match op {
                Op::Req if held.len() < capacity => {
                    held.push(pool.req());
                }
                Op::Release if !held.is_empty() => {
                    held.pop();
                }
                _ => {}
            }
            prop_assert!(pool.size() <= capacity);
            prop_assert_eq!(pool.size(), held.len());
        }

        held.clear();
        prop_assert!(pool.is_empty());
        prop_assert_eq!(pool.size(), 0);
    }

    /// Reference accounting: fanning a single reservation out to `k` extra
    /// references and then dropping all `k` handles returns the chunk's
    /// refcount to zero and the chunk to the free set.
    #[test]
    fn fan_out_refcount_returns_to_zero(extra in 0usize..8) {
        let pool = Pool::new(PoolConfig::new(16, 1));
        let base = pool.req();
        let mut clones: Vec<_> = (0..extra).map(|_| pool.clone_handle(&base).unwrap()).collect();
        prop_assert_eq!(pool.ref_count(&base).unwrap(), extra + 1);

        clones.clear();
        prop_assert_eq!(pool.ref_count(&base).unwrap(), 1);
        prop_assert!(pool.is_full());

        drop(base);
        prop_assert!(pool.is_empty());
    }
}
