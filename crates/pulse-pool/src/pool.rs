//! Reference-counted, fixed-chunk memory pool.
//!
//! A single flat storage region of `capacity` equal-size chunks, a parallel
//! per-chunk refcount array, and free/allocated index sets guarded by one
//! mutex, with a "slots available" counting semaphore mirroring `|free|`.
//!
//! The free/allocated sets are an *indexed* representation (`Vec<usize>` /
//! `HashSet<usize>` of chunk indices) rather than two parallel pointer lists
//! into the same storage, so the two sets cannot alias; a chunk carried
//! around by a consumer is represented by [`ChunkHandle`], an owned `(pool,
//! index)` pair whose `Drop` performs the release a caller would otherwise
//! have to remember to call by hand.

use crate::config::PoolConfig;
use crate::error::{PoolError, PoolResult};
#[cfg(debug_assertions)]
use crate::invariants::{debug_assert_chunk_freed_once, debug_assert_partition};
use crossbeam_utils::CachePadded;
use pulse_sync::{Flags, PulseMutex, Semaphore};
use std::cell::UnsafeCell;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct State {
    free: Vec<usize>,
    allocated: HashSet<usize>,
}

/// A fixed-capacity allocator of equal-size, reference-counted chunks.
///
/// All operations are thread-safe. `req`/`timed_req` hand out a
/// [`ChunkHandle`] whose `Drop` calls [`Pool::release`] — the safe
/// replacement for manually pairing a raw pointer with a release call.
pub struct Pool {
    chunk_size: usize,
    capacity: usize,
    flags: Flags,
    // Flat storage, one cell per byte. Access outside the chunk a caller
    // currently holds a reference-counted claim on is a logic bug, not a
    // data race this type can fail safely against — see `chunk_bytes`'s
    // safety note.
    storage: Box<[UnsafeCell<u8>]>,
    refcounts: Box<[CachePadded<AtomicUsize>]>,
    state: PulseMutex<State>,
    slots_available: Semaphore,
}

// SAFETY: `storage` is only written to either (a) by the chunk's current
// sole owner before any reference is shared, or (b) during construction
// (single-threaded). After a reservation is published, every reader only
// reads. Concurrent bookkeeping (which chunk is free/allocated, and its
// refcount) is serialized through `state`'s mutex and the per-chunk atomic
// refcounts, which establish the happens-before edges a reader needs to see
// the writer's bytes.
unsafe impl Send for Pool {}
unsafe impl Sync for Pool {}

impl Pool {
    /// Creates a pool of `config.capacity` chunks, each `config.chunk_size`
    /// bytes, all initially free.
    pub fn new(config: PoolConfig) -> Arc<Self> {
        let total_bytes = config.storage_bytes();
        let mut storage = Vec::with_capacity(total_bytes);
        storage.resize_with(total_bytes, || UnsafeCell::new(0));

        let mut refcounts = Vec::with_capacity(config.capacity);
        refcounts.resize_with(config.capacity, || CachePadded::new(AtomicUsize::new(0)));

        Arc::new(Self {
            chunk_size: config.chunk_size,
            capacity: config.capacity,
            flags: config.flags,
            storage: storage.into_boxed_slice(),
            refcounts: refcounts.into_boxed_slice(),
            state: PulseMutex::new(State {
                free: (0..config.capacity).collect(),
                allocated: HashSet::with_capacity(config.capacity),
            }),
            slots_available: Semaphore::new(config.capacity),
        })
    }

    /// Size of each chunk, in bytes.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Number of chunks this pool was constructed with.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Claims a free chunk, blocking indefinitely until one is available.
    pub fn req(self: &Arc<Self>) -> ChunkHandle {
        self.slots_available.wait();
        let index = self.take_free_index();
        ChunkHandle {
            pool: Arc::clone(self),
            index,
        }
    }

    /// As [`Self::req`], but gives up after `rel_timeout` if no chunk
    /// becomes free. Observable state (free/allocated sets, refcounts) is
    /// left exactly as it was before the call on timeout.
    pub fn timed_req(self: &Arc<Self>, rel_timeout: Duration) -> PoolResult<ChunkHandle> {
        self.slots_available.timed_wait(rel_timeout)?;
        let index = self.take_free_index();
        Ok(ChunkHandle {
            pool: Arc::clone(self),
            index,
        })
    }

    fn take_free_index(&self) -> usize {
        let mut state = self.state.lock_recover();
        let index = state
            .free
            .pop()
            .expect("slots_available guaranteed a free chunk");
        state.allocated.insert(index);
        #[cfg(debug_assertions)]
        debug_assert_partition!(state.free.len(), state.allocated.len(), self.capacity);
        self.refcounts[index].store(1, Ordering::Release);
        if self.flags.contains(Flags::ZALLOC) {
            self.zero_chunk(index);
        }
        index
    }

    /// Releases one unit of ownership on chunk `index`. When the refcount
    /// reaches zero the chunk returns to the free set and wakes one waiter
    /// of [`Self::req`]/[`Self::timed_req`]. Called automatically by
    /// [`ChunkHandle`]'s `Drop` — released application code never calls
    /// this directly.
    fn release(&self, index: usize) {
        let mut state = self.state.lock_recover();
        if !state.allocated.contains(&index) {
            // Releasing an already-free chunk is a no-op.
            return;
        }
        let prev = self.refcounts[index].fetch_sub(1, Ordering::AcqRel);
        if prev == 1 {
            state.allocated.remove(&index);
            #[cfg(debug_assertions)]
            debug_assert_chunk_freed_once!(state.allocated, index);
            if self.flags.contains(Flags::ZALLOC) {
                self.zero_chunk(index);
            }
            state.free.push(index);
            #[cfg(debug_assertions)]
            debug_assert_partition!(state.free.len(), state.allocated.len(), self.capacity);
            drop(state);
            self.slots_available.post();
        } else if prev == 0 {
            // Underflow guard: a chunk's refcount never legitimately
            // reaches 0 while still allocated (ref_remove never fires the
            // free transition, and every release pairs with a prior req/
            // ref_add). Restore it rather than let the atomic wrap.
            self.refcounts[index].store(0, Ordering::Release);
        }
    }

    /// Creates an additional owning [`ChunkHandle`] for the same chunk as
    /// `handle`, incrementing its refcount by one. This is the handle-typed
    /// counterpart of [`Self::ref_add`], used by `pulse-bus` to hand one
    /// reference to each subscriber of a fan-out.
    pub fn clone_handle(&self, handle: &ChunkHandle) -> PoolResult<ChunkHandle> {
        self.ref_add(handle)?;
        Ok(ChunkHandle {
            pool: Arc::clone(&handle.pool),
            index: handle.index,
        })
    }

    /// Increments chunk `index`'s refcount without creating an owning
    /// handle. Models a non-owning reference the caller promises to
    /// balance with [`Self::ref_remove`].
    pub fn ref_add(&self, handle: &ChunkHandle) -> PoolResult<()> {
        self.validate(handle)?;
        let state = self.state.lock_recover();
        if !state.allocated.contains(&handle.index) {
            return Err(PoolError::InvalidChunk);
        }
        self.refcounts[handle.index].fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    /// Decrements chunk `index`'s refcount, saturating at zero. Unlike
    /// [`Self::release`], this **never** moves the chunk back to the free
    /// set, even if the count reaches zero — this asymmetry is intentional:
    /// `ref_add`/`ref_remove` model non-owning references, `release` models
    /// the owner handing the chunk back. Used by `pulse-bus` to undo a
    /// fan-out reference added for a subscriber that failed to receive its
    /// entry.
    pub fn ref_remove(&self, handle: &ChunkHandle) -> PoolResult<()> {
        self.validate(handle)?;
        let state = self.state.lock_recover();
        if !state.allocated.contains(&handle.index) {
            return Err(PoolError::InvalidChunk);
        }
        let _ = self.refcounts[handle.index].fetch_update(Ordering::AcqRel, Ordering::Acquire, |c| {
            Some(c.saturating_sub(1))
        });
        Ok(())
    }

    /// Current refcount of `handle`'s chunk. Only reliable under external
    /// synchronization.
    pub fn ref_count(&self, handle: &ChunkHandle) -> PoolResult<usize> {
        self.validate(handle)?;
        Ok(self.refcounts[handle.index].load(Ordering::Acquire))
    }

    fn validate(&self, handle: &ChunkHandle) -> PoolResult<()> {
        if !std::ptr::eq(self, Arc::as_ptr(&handle.pool)) || handle.index >= self.capacity {
            return Err(PoolError::InvalidChunk);
        }
        Ok(())
    }

    /// Shared view of a chunk's bytes.
    ///
    /// # Safety contract
    ///
    /// Valid so long as the caller holds a live [`ChunkHandle`] (or a
    /// reference derived from one) for `index`. There is no runtime check
    /// that the caller actually holds such a reference, same as indexing
    /// through a raw pointer would give no such guarantee either.
    pub fn chunk_bytes(&self, index: usize) -> &[u8] {
        let start = index * self.chunk_size;
        // SAFETY: see struct-level `Sync` note; readers only read once a
        // chunk has been published, and writers have exclusive access
        // before that point.
        unsafe {
            std::slice::from_raw_parts(self.storage[start].get().cast_const(), self.chunk_size)
        }
    }

    /// Exclusive view of a chunk's bytes, for the chunk's current sole
    /// owner (i.e. between `req`/`timed_req` and the first `publish_release`
    /// fan-out). See [`Self::chunk_bytes`] for the safety contract.
    #[allow(clippy::mut_from_ref)]
    pub fn chunk_bytes_mut(&self, index: usize) -> &mut [u8] {
        let start = index * self.chunk_size;
        // SAFETY: see `chunk_bytes`.
        unsafe { std::slice::from_raw_parts_mut(self.storage[start].get(), self.chunk_size) }
    }

    fn zero_chunk(&self, index: usize) {
        self.chunk_bytes_mut(index).fill(0);
    }

    /// True if every chunk is currently allocated. Not reliable under
    /// concurrency.
    pub fn is_full(&self) -> bool {
        self.state.lock_recover().free.is_empty()
    }

    /// True if every chunk is currently free. Not reliable under
    /// concurrency.
    pub fn is_empty(&self) -> bool {
        self.state.lock_recover().allocated.is_empty()
    }

    /// Number of chunks currently allocated. Not reliable under
    /// concurrency.
    pub fn size(&self) -> usize {
        self.state.lock_recover().allocated.len()
    }
}

/// An owned claim on one chunk of a [`Pool`].
///
/// Dropping the handle calls [`Pool::release`], so a chunk's refcount is
/// decremented automatically wherever its last handle goes out of scope —
/// the safe replacement for a caller remembering to call a release function
/// by hand.
pub struct ChunkHandle {
    pool: Arc<Pool>,
    index: usize,
}

impl ChunkHandle {
    /// The pool this handle's chunk belongs to.
    pub fn pool(&self) -> &Arc<Pool> {
        &self.pool
    }

    /// The chunk's index within its pool.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Shared view of the chunk's bytes.
    pub fn bytes(&self) -> &[u8] {
        self.pool.chunk_bytes(self.index)
    }

    /// Exclusive view of the chunk's bytes. Only sound to mutate through
    /// while this is the sole live handle for the chunk (i.e. before
    /// `publish_release` fans it out to other subscribers).
    #[allow(clippy::mut_from_ref)]
    pub fn bytes_mut(&self) -> &mut [u8] {
        self.pool.chunk_bytes_mut(self.index)
    }
}

impl std::fmt::Debug for ChunkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkHandle").field("index", &self.index).finish()
    }
}

impl Drop for ChunkHandle {
    fn drop(&mut self) {
        self.pool.release(self.index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc as StdArc;
    use std::thread;

    fn pool(chunk_size: usize, capacity: usize) -> Arc<Pool> {
        Pool::new(PoolConfig::new(chunk_size, capacity))
    }

    #[test]
    fn req_then_drop_returns_chunk_to_free_set() {
        let p = pool(64, 2);
        assert_eq!(p.size(), 0);
        let h = p.req();
        assert_eq!(p.size(), 1);
        drop(h);
        assert_eq!(p.size(), 0);
        assert!(p.is_empty());
    }

    #[test]
    fn req_blocks_when_pool_exhausted() {
        let p = pool(8, 1);
        let h1 = p.req();
        assert!(p.is_full());
        let p2 = StdArc::clone(&p);
        let waiter = thread::spawn(move || {
            let _h2 = p2.req();
        });
        thread::sleep(std::time::Duration::from_millis(20));
        drop(h1);
        waiter.join().unwrap();
    }

    #[test]
    fn timed_req_times_out_without_side_effects() {
        let p = pool(8, 1);
        let h1 = p.req();
        let before = p.size();
        let result = p.timed_req(Duration::from_millis(10));
        assert!(result.is_err());
        assert_eq!(p.size(), before);
        drop(h1);
        // A subsequent untimed req must still succeed.
        let h2 = p.req();
        drop(h2);
    }

    #[test]
    fn clone_handle_fans_out_refcount() {
        let p = pool(32, 1);
        let h1 = p.req();
        assert_eq!(p.ref_count(&h1).unwrap(), 1);
        let h2 = p.clone_handle(&h1).unwrap();
        let h3 = p.clone_handle(&h1).unwrap();
        assert_eq!(p.ref_count(&h1).unwrap(), 3);
        drop(h2);
        assert_eq!(p.ref_count(&h1).unwrap(), 2);
        drop(h3);
        assert_eq!(p.ref_count(&h1).unwrap(), 1);
        assert!(p.is_full());
        drop(h1);
        assert!(p.is_empty());
    }

    #[test]
    fn ref_remove_never_frees_even_at_zero() {
        let p = pool(32, 1);
        let h = p.req();
        p.ref_remove(&h).unwrap();
        // refcount saturates at 0, but the chunk stays allocated: only
        // `release` (handle drop) performs the free transition.
        assert_eq!(p.ref_count(&h).unwrap(), 0);
        assert!(p.is_full());
        drop(h);
        assert!(p.is_empty());
    }

    #[test]
    fn zalloc_zeroes_released_chunk() {
        let p = Pool::new(PoolConfig::new(16, 1).with_flags(Flags::ZALLOC));
        let h = p.req();
        h.bytes_mut().fill(0xAA);
        assert!(h.bytes().iter().all(|&b| b == 0xAA));
        drop(h);
        let h2 = p.req();
        assert!(h2.bytes().iter().all(|&b| b == 0));
    }

    #[test]
    fn concurrent_req_release_conserves_capacity() {
        let p = pool(16, 4);
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let p = StdArc::clone(&p);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let h = p.req();
                        h.bytes_mut()[0] = 1;
                        drop(h);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(p.is_empty());
        assert_eq!(p.size(), 0);
    }
}
