//! The PULSE bus itself: pool selection, subscription registry, fan-out
//! publish/release, RXQ consumption.
//!
//! A fixed array of pools chosen eagerly at construction, a registry of
//! RXQs the bus owns for its lifetime, a `(pid, rxq)` subscription list kept
//! sorted for `O(log N)` lookup, and a publish gate (`RdWrLock`)
//! coordinating publishers with consumers. The lock order is gate ->
//! subscription mutex -> {rxq mutex, pool mutex}; nothing here acquires a
//! pool or RXQ lock while waiting on the gate or the subscription mutex.

use crate::config::BusConfig;
use crate::entry::ReceiveEntry;
use crate::error::{BusError, BusResult};
use crate::event::{EventSink, NoopSink};
#[cfg(debug_assertions)]
use crate::invariants::{debug_assert_fanout_complete, debug_assert_subscriptions_sorted};
use crate::reservation::Reservation;
use crate::rxq::{Rxq, RxqId};
use crate::subscription::SubscriptionList;
use pulse_pool::Pool;
use pulse_queue::{PcQueue, PcQueueConfig};
use pulse_sync::{PulseMutex, RdWrLock, Scope};
use std::sync::Arc;
use std::time::Duration;

/// The publish/subscribe bus: selects a pool by size, fans a publish out to
/// every RXQ subscribed to its pid, and hands consumers a drain interface
/// over their RXQ.
pub struct Bus {
    pools: Vec<Arc<Pool>>,
    rxqs: PulseMutex<Vec<Rxq>>,
    subscriptions: PulseMutex<SubscriptionList>,
    gate: RdWrLock,
    config: BusConfig,
    sink: Box<dyn EventSink>,
}

impl Bus {
    /// Constructs a bus with the given pool configurations, eagerly creating
    /// every pool in the caller-supplied order. No pool may be added or
    /// removed afterward.
    pub fn new(config: BusConfig) -> Self {
        Self::with_sink(config, Box::new(NoopSink))
    }

    /// As [`Self::new`], with an explicit [`EventSink`] for diagnostics.
    pub fn with_sink(config: BusConfig, sink: Box<dyn EventSink>) -> Self {
        let pools = config.pools.iter().copied().map(Pool::new).collect();
        Self {
            pools,
            rxqs: PulseMutex::new(Vec::new()),
            subscriptions: PulseMutex::new(SubscriptionList::new()),
            gate: RdWrLock::new(),
            config,
            sink,
        }
    }

    /// The bus's debug name, if one was set on its [`BusConfig`].
    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// The number of pools this bus was constructed with.
    pub fn pool_count(&self) -> usize {
        self.pools.len()
    }

    /// The number of RXQs created on this bus so far.
    pub fn rxq_count(&self) -> usize {
        self.rxqs.lock_recover().len()
    }

    // ---- RXQ lifecycle ------------------------------------------------------

    /// Constructs a new RXQ with the given entry capacity and registers it
    /// with the bus, returning a handle used for subscribe/publish/consume.
    pub fn rxq_init(&self, entry_capacity: usize) -> BusResult<RxqId> {
        let mut rxqs = self.rxqs.lock_recover();
        if rxqs.len() >= self.config.max_rxqs {
            return Err(BusError::TooManyRxqs {
                max: self.config.max_rxqs,
            });
        }
        let id = RxqId::from_raw(rxqs.len());
        rxqs.push(Rxq {
            queue: Arc::new(PcQueue::new(PcQueueConfig::new(entry_capacity))),
        });
        Ok(id)
    }

    fn rxq_queue(&self, rxq: RxqId) -> BusResult<Arc<PcQueue<ReceiveEntry>>> {
        let rxqs = self.rxqs.lock_recover();
        rxqs.get(rxq.raw())
            .map(|r| Arc::clone(&r.queue))
            .ok_or(BusError::InvalidRxq)
    }

    fn validate_rxq(&self, rxq: RxqId) -> BusResult<()> {
        let rxqs = self.rxqs.lock_recover();
        if rxq.raw() >= rxqs.len() {
            return Err(BusError::InvalidRxq);
        }
        Ok(())
    }

    // ---- Subscription registry ----------------------------------------------

    /// Registers `rxq` as a subscriber of `pid`. Rejects a duplicate
    /// `(pid, rxq)` pair or exceeding the bus's configured maximum
    /// subscription count.
    pub fn subscribe(&self, rxq: RxqId, pid: u32) -> BusResult<()> {
        self.validate_rxq(rxq)?;
        let mut subs = self.subscriptions.lock_recover();
        subs.subscribe(pid, rxq, self.config.max_subscriptions)?;
        #[cfg(debug_assertions)]
        debug_assert_subscriptions_sorted!(subs);
        self.sink.on_subscribe(pid);
        Ok(())
    }

    /// Removes `rxq`'s subscription to `pid`.
    pub fn unsubscribe(&self, rxq: RxqId, pid: u32) -> BusResult<()> {
        self.validate_rxq(rxq)?;
        let mut subs = self.subscriptions.lock_recover();
        subs.unsubscribe(pid, rxq)?;
        #[cfg(debug_assertions)]
        debug_assert_subscriptions_sorted!(subs);
        self.sink.on_unsubscribe(pid);
        Ok(())
    }

    // ---- Pool selection -------------------------------------------------------

    /// Chooses the pool with the smallest chunk size `>= size`, breaking
    /// ties by lowest pool index. `None` if no pool is large enough. For
    /// `s1 <= s2` the pool chosen for `s1` never has a larger chunk size
    /// than the one chosen for `s2`, since both minimize over the same
    /// monotonic "chunk size >= size" predicate — pool selection is
    /// monotonic in the requested size.
    fn select_pool(&self, size: usize) -> Option<usize> {
        self.pools
            .iter()
            .enumerate()
            .filter(|(_, p)| p.chunk_size() >= size)
            .min_by_key(|(idx, p)| (p.chunk_size(), *idx))
            .map(|(idx, _)| idx)
    }

    fn max_chunk_size(&self) -> usize {
        self.pools.iter().map(|p| p.chunk_size()).max().unwrap_or(0)
    }

    // ---- Reservation ----------------------------------------------------------

    /// Selects a pool for `size` and reserves a chunk from it, blocking
    /// indefinitely if the pool is exhausted. The caller fills the returned
    /// reservation's bytes before calling [`Self::publish_release`].
    pub fn publish_reserve(&self, size: usize) -> BusResult<Reservation> {
        let pool_index = self.select_pool(size).ok_or(BusError::SizeTooLarge {
            size,
            max_chunk: self.max_chunk_size(),
        })?;
        let pool = &self.pools[pool_index];
        if pool.is_full() {
            self.sink.on_pool_exhausted(pool_index);
        }
        let chunk = pool.req();
        Ok(Reservation::Pooled {
            pool_index,
            chunk,
            size,
        })
    }

    /// As [`Self::publish_reserve`], but gives up after `rel_timeout` if no
    /// chunk becomes free. Observable pool state is left exactly as it was
    /// before the call on timeout.
    pub fn publish_reserve_timed(&self, size: usize, rel_timeout: Duration) -> BusResult<Reservation> {
        let pool_index = self.select_pool(size).ok_or(BusError::SizeTooLarge {
            size,
            max_chunk: self.max_chunk_size(),
        })?;
        let pool = &self.pools[pool_index];
        if pool.is_full() {
            self.sink.on_pool_exhausted(pool_index);
        }
        let chunk = pool.timed_req(rel_timeout)?;
        Ok(Reservation::Pooled {
            pool_index,
            chunk,
            size,
        })
    }

    // ---- Convenience publish --------------------------------------------------

    /// Reserves a chunk sized for `bytes`, copies `bytes` into it, and
    /// releases it under `pid`. Equivalent to `publish_reserve` + copy +
    /// `publish_release`.
    pub fn publish(&self, pid: u32, bytes: &[u8]) -> BusResult<()> {
        let mut rsrv = self.publish_reserve(bytes.len())?;
        rsrv.as_mut_slice()
            .expect("publish_reserve always yields a Pooled reservation")
            .copy_from_slice(bytes);
        self.publish_release(pid, rsrv)
    }

    // ---- Release / fan-out -----------------------------------------------------

    /// Fans `rsrv` out to every RXQ currently subscribed to `pid`. The
    /// subscription mutex is held for the full duration (including the RXQ
    /// pushes below), which is what makes the subscriber set for a given
    /// publish a consistent snapshot and keeps a single pid's deliveries in
    /// the order its publisher produced them.
    pub fn publish_release(&self, pid: u32, rsrv: Reservation) -> BusResult<()> {
        let scope = if self.config.is_async() {
            Scope::Read
        } else {
            Scope::Write
        };
        self.gate.req(scope);
        let result = self.fan_out(pid, rsrv);
        self.gate.exit(scope);
        result
    }

    fn fan_out(&self, pid: u32, rsrv: Reservation) -> BusResult<()> {
        let subs = self.subscriptions.lock_recover();
        let targets = subs.subscribers_for(pid);
        let k = targets.len();

        if k == 0 {
            // No matching subscribers: a Pooled `rsrv` drops here, its
            // ChunkHandle releasing the chunk back to its pool (step 3); an
            // External reservation just drops its Arc.
            self.sink.on_publish(pid, rsrv.size(), 0);
            return Ok(());
        }

        let size = rsrv.size();
        let is_async = self.config.is_async();

        // One entry per subscriber: the reservation's own chunk/data covers
        // the first recipient, and each additional recipient gets a cloned
        // handle (Pooled: one extra `ref_add` per clone) or a cloned `Arc`
        // (External) — step 4's "add k-1 extra references; the initial
        // reservation already counts as 1".
        let mut entries: Vec<ReceiveEntry> = Vec::with_capacity(k);
        match rsrv {
            Reservation::Pooled {
                pool_index, chunk, ..
            } => {
                let pool = &self.pools[pool_index];
                for _ in 1..k {
                    let extra = pool.clone_handle(&chunk)?;
                    entries.push(ReceiveEntry::Pooled {
                        pid,
                        size,
                        chunk: extra,
                    });
                }
                entries.push(ReceiveEntry::Pooled { pid, size, chunk });
            }
            Reservation::External { data } => {
                for _ in 0..k {
                    entries.push(ReceiveEntry::External {
                        pid,
                        data: Arc::clone(&data),
                    });
                }
            }
        }

        let queues: Vec<Arc<PcQueue<ReceiveEntry>>> = {
            let rxqs = self.rxqs.lock_recover();
            targets
                .iter()
                .map(|&id| Arc::clone(&rxqs[id.raw()].queue))
                .collect()
        };

        // Fan-out delivery never blocks. In sync mode the gate is held in
        // write mode and every consumer-side waiter (`rxq_wait`/`rxq_front`/
        // `rxq_timedwait`) blocks on the gate in read mode before touching a
        // queue, so none of these RXQs can be drained while we hold it:
        // checking every target's capacity up front, before pushing to any
        // of them, makes the fan-out atomic — either every subscriber
        // receives the entry or none do, and there is nothing to undo
        // afterward because nothing was pushed until every check passed.
        // Async mode has no such exclusion (that's the point of the
        // PULSE_ASYNC flag), so it still attempts every RXQ individually and
        // rolls back only the entries that failed to land.
        let mut delivered = 0usize;
        if is_async {
            for (queue, entry) in queues.into_iter().zip(entries) {
                match queue.try_push(entry) {
                    Ok(()) => delivered += 1,
                    // `_undelivered`'s Pooled chunk (if any) drops here,
                    // releasing the reference that was added for it.
                    Err(_undelivered) => {}
                }
            }
            if delivered < k {
                return Err(BusError::PartialFanOut {
                    pid,
                    delivered,
                    failed: k - delivered,
                });
            }
        } else if queues.iter().any(|q| q.is_full()) {
            // `entries` (and the queues Vec) drop here without anything
            // having been pushed, releasing every reference `fan_out` added
            // above — the whole publish is rolled back, not just the tail
            // end of it.
            return Err(BusError::FanOutFailed {
                pid,
                delivered: 0,
                total: k,
            });
        } else {
            for (queue, entry) in queues.into_iter().zip(entries) {
                queue
                    .try_push(entry)
                    .expect("checked not full while holding the write gate");
                delivered += 1;
            }
        }

        #[cfg(debug_assertions)]
        debug_assert_fanout_complete!(delivered, k);
        self.sink.on_publish(pid, size, delivered);
        Ok(())
    }

    // ---- RXQ consumption -------------------------------------------------------

    /// Blocks until `rxq` is non-empty, then runs `f` against the front
    /// entry without removing it. `f`'s borrow is valid only for the
    /// duration of this call: the entry is only guaranteed valid until the
    /// next pop, so the borrow is scoped to a callback (matching
    /// [`pulse_queue::PcQueue::peek_with`]) rather than handed back as a
    /// reference with an implicit lifetime contract.
    ///
    /// Takes the publish gate in read mode for the duration of the wait —
    /// the consumer-side counterpart of `publish_release` holding it in
    /// write mode for a synchronous fan-out. This is what gives
    /// `Flags::PULSE_ASYNC` an observable effect on consumers: in
    /// synchronous mode a waiter blocks here until an in-progress
    /// `publish_release` has finished delivering to every subscriber, so no
    /// subscriber can observe a pid's entry before every subscriber has one
    /// (spec §4.5.6); in async mode the gate is already held in read mode by
    /// publishers, so a waiter is never excluded by one.
    pub fn rxq_wait<R>(&self, rxq: RxqId, f: impl FnOnce(&ReceiveEntry) -> R) -> BusResult<R> {
        let queue = self.rxq_queue(rxq)?;
        self.gate.req(Scope::Read);
        let result = queue.peek_with(f);
        self.gate.exit(Scope::Read);
        Ok(result)
    }

    /// Alias for [`Self::rxq_wait`]: a non-removing peek at the front entry.
    pub fn rxq_front<R>(&self, rxq: RxqId, f: impl FnOnce(&ReceiveEntry) -> R) -> BusResult<R> {
        self.rxq_wait(rxq, f)
    }

    /// As [`Self::rxq_wait`], but gives up after `rel_timeout` if `rxq`
    /// stays empty. The deadline is computed once, up front, and shared
    /// between the gate wait and the queue wait, so a caller's requested
    /// timeout bounds the whole call rather than being restarted for each
    /// half.
    pub fn rxq_timedwait<R>(
        &self,
        rxq: RxqId,
        rel_timeout: Duration,
        f: impl FnOnce(&ReceiveEntry) -> R,
    ) -> BusResult<R> {
        let queue = self.rxq_queue(rxq)?;
        let deadline = pulse_sync::deadline_after(rel_timeout);
        self.gate.timed_req(Scope::Read, rel_timeout)?;
        let remaining = deadline.saturating_duration_since(pulse_sync::monotonic_now());
        let result = queue.timed_peek_with(remaining, f).map_err(BusError::from);
        self.gate.exit(Scope::Read);
        result
    }

    /// Removes the front entry of `rxq` and returns it. Dropping a `Pooled`
    /// entry's `ChunkHandle` decrements the referenced chunk's refcount,
    /// returning it to its pool's free set once the last subscriber has
    /// popped; releasing the pool reservation this entry held is simply a
    /// consequence of dropping the returned handle.
    pub fn rxq_pop_front(&self, rxq: RxqId) -> BusResult<ReceiveEntry> {
        let queue = self.rxq_queue(rxq)?;
        Ok(queue.pop())
    }

    /// The current number of entries queued in `rxq`. Not reliable under
    /// concurrency; diagnostic only.
    pub fn rxq_len(&self, rxq: RxqId) -> BusResult<usize> {
        Ok(self.rxq_queue(rxq)?.len())
    }

    // ---- Destruction -----------------------------------------------------------

    /// Checks that the bus can be safely dropped: every RXQ is empty (no
    /// pending entries holding chunk references) and, by extension, no
    /// reservation this bus produced is still outstanding. Callers that want
    /// a clean report rather than a debug-assertion panic on drop should
    /// invoke this explicitly, since `Drop` cannot return a `Result`.
    pub fn check_destructible(&self) -> BusResult<()> {
        let rxqs = self.rxqs.lock_recover();
        for (i, rxq) in rxqs.iter().enumerate() {
            if !rxq.queue.is_empty() {
                return Err(BusError::OutstandingState {
                    reason: if i == 0 {
                        "rxq 0 is non-empty"
                    } else {
                        "an rxq is non-empty"
                    },
                });
            }
        }
        Ok(())
    }
}

impl Drop for Bus {
    fn drop(&mut self) {
        debug_assert!(
            self.check_destructible().is_ok(),
            "Bus dropped with outstanding RXQ entries; call check_destructible() first"
        );
    }
}

impl std::fmt::Debug for Bus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Bus")
            .field("name", &self.config.name)
            .field("pools", &self.pools.len())
            .field("rxqs", &self.rxq_count())
            .finish()
    }
}
