//! Bounded blocking FIFO queue.
//!
//! A fixed-capacity circular buffer guarded by a mutex, with
//! `slots_available`/`slots_in_use` counting semaphores providing the
//! blocking push/pop protocol. Elements are owned `T` values moved in and
//! out of the buffer rather than raw bytes behind a pointer, so there's no
//! pointer-range validation to do on access.

use crate::config::PcQueueConfig;
use crate::error::{QueueError, QueueResult};
#[cfg(debug_assertions)]
use crate::invariants::{debug_assert_bounded_count, debug_assert_count_unchanged_on_timeout};
use crossbeam_utils::CachePadded;
use pulse_sync::{PulseMutex, Semaphore};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

struct Inner<T> {
    buffer: Vec<Option<T>>,
    head: usize,
    len: usize,
}

/// A fixed-capacity, thread-safe FIFO queue.
///
/// `push` blocks while the queue is full; `pop`/`timed_pop` block while it
/// is empty. All blocking waits release the internal mutex before parking
/// on a semaphore, so a blocked producer never holds up a consumer trying
/// to drain the queue concurrently: the mutex is never held across a
/// blocking semaphore wait.
pub struct PcQueue<T> {
    inner: PulseMutex<Inner<T>>,
    slots_available: Semaphore,
    slots_in_use: Semaphore,
    capacity: usize,
    // Cache-line isolated because every push/pop touches it; kept purely
    // for lock-free diagnostic reads (`len()`), never for control flow.
    len_hint: CachePadded<AtomicUsize>,
}

impl<T> PcQueue<T> {
    /// Creates an empty queue with the given configuration.
    pub fn new(config: PcQueueConfig) -> Self {
        let mut buffer = Vec::with_capacity(config.capacity);
        buffer.resize_with(config.capacity, || None);
        Self {
            inner: PulseMutex::new(Inner {
                buffer,
                head: 0,
                len: 0,
            }),
            slots_available: Semaphore::new(config.capacity),
            slots_in_use: Semaphore::new(0),
            capacity: config.capacity,
            len_hint: CachePadded::new(AtomicUsize::new(0)),
        }
    }

    /// Pushes `element` onto the back of the queue, blocking while the
    /// queue is full.
    pub fn push(&self, element: T) {
        self.slots_available.wait();
        {
            let mut inner = self.inner.lock_recover();
            let tail = (inner.head + inner.len) % self.capacity;
            debug_assert!(inner.buffer[tail].is_none());
            inner.buffer[tail] = Some(element);
            inner.len += 1;
            #[cfg(debug_assertions)]
            debug_assert_bounded_count!(inner.len, self.capacity);
            self.len_hint.store(inner.len, Ordering::Relaxed);
        }
        self.slots_in_use.post();
    }

    /// Pushes `element` onto the back of the queue without blocking.
    ///
    /// Returns `element` back to the caller if the queue is currently full,
    /// mirroring `try_send`-style APIs elsewhere in the ecosystem.
    /// `pulse-bus` uses this for fan-out delivery, where a full downstream
    /// RXQ must be reported as an error rather than stall the publisher.
    pub fn try_push(&self, element: T) -> Result<(), T> {
        if !self.slots_available.try_wait() {
            return Err(element);
        }
        {
            let mut inner = self.inner.lock_recover();
            let tail = (inner.head + inner.len) % self.capacity;
            debug_assert!(inner.buffer[tail].is_none());
            inner.buffer[tail] = Some(element);
            inner.len += 1;
            #[cfg(debug_assertions)]
            debug_assert_bounded_count!(inner.len, self.capacity);
            self.len_hint.store(inner.len, Ordering::Relaxed);
        }
        self.slots_in_use.post();
        Ok(())
    }

    /// Pops the front element, blocking while the queue is empty.
    pub fn pop(&self) -> T {
        self.slots_in_use.wait();
        let element = self.pop_front_locked();
        self.slots_available.post();
        element
    }

    /// Pops the front element, blocking until `rel_timeout` elapses if the
    /// queue is empty.
    pub fn timed_pop(&self, rel_timeout: Duration) -> QueueResult<T> {
        #[cfg(debug_assertions)]
        let before = self.len();
        self.slots_in_use.timed_wait(rel_timeout).map_err(|e| {
            #[cfg(debug_assertions)]
            debug_assert_count_unchanged_on_timeout!(before, self.len());
            QueueError::from(e)
        })?;
        let element = self.pop_front_locked();
        self.slots_available.post();
        Ok(element)
    }

    fn pop_front_locked(&self) -> T {
        let mut inner = self.inner.lock_recover();
        let head = inner.head;
        let element = inner.buffer[head].take().expect("slots_in_use guaranteed an element");
        inner.head = (head + 1) % self.capacity;
        inner.len -= 1;
        self.len_hint.store(inner.len, Ordering::Relaxed);
        element
    }

    /// Returns the current queue length. Not reliable under concurrency
    /// without external synchronization.
    pub fn len(&self) -> usize {
        self.len_hint.load(Ordering::Relaxed)
    }

    /// True if the queue currently holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True if the queue is currently at capacity.
    pub fn is_full(&self) -> bool {
        self.len() == self.capacity
    }

    /// The queue's fixed capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Blocks until the queue is non-empty, then runs `f` against a
    /// reference to the front element without removing it.
    ///
    /// Rather than hand back a reference whose validity is tied to an
    /// internal lock's lifetime (and only good "until the next pop"), the
    /// front element is visited in place while the lock is held.
    pub fn peek_with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.slots_in_use.wait();
        let result = {
            let inner = self.inner.lock_recover();
            f(inner.buffer[inner.head]
                .as_ref()
                .expect("slots_in_use guaranteed an element"))
        };
        self.slots_in_use.post();
        result
    }

    /// As [`Self::peek_with`], but gives up after `rel_timeout` if the queue
    /// stays empty.
    pub fn timed_peek_with<R>(&self, rel_timeout: Duration, f: impl FnOnce(&T) -> R) -> QueueResult<R> {
        self.slots_in_use.timed_wait(rel_timeout)?;
        let result = {
            let inner = self.inner.lock_recover();
            f(inner.buffer[inner.head]
                .as_ref()
                .expect("slots_in_use guaranteed an element"))
        };
        self.slots_in_use.post();
        Ok(result)
    }
}

impl<T: Clone> PcQueue<T> {
    /// Returns a clone of the front element without removing it, blocking
    /// while the queue is empty.
    ///
    /// A clone is taken under the queue's lock rather than handing out a
    /// reference, since a reference that outlives the lock would alias with
    /// a concurrent pop.
    pub fn peek(&self) -> T {
        self.slots_in_use.wait();
        let element = {
            let inner = self.inner.lock_recover();
            inner.buffer[inner.head]
                .clone()
                .expect("slots_in_use guaranteed an element")
        };
        self.slots_in_use.post();
        element
    }

    /// As [`Self::peek`], but gives up after `rel_timeout` if the queue
    /// stays empty.
    pub fn timed_peek(&self, rel_timeout: Duration) -> QueueResult<T> {
        self.slots_in_use.timed_wait(rel_timeout)?;
        let element = {
            let inner = self.inner.lock_recover();
            inner.buffer[inner.head]
                .clone()
                .expect("slots_in_use guaranteed an element")
        };
        self.slots_in_use.post();
        Ok(element)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn queue<T>(capacity: usize) -> PcQueue<T> {
        PcQueue::new(PcQueueConfig::new(capacity))
    }

    #[test]
    fn fifo_order_preserved() {
        let q = queue(4);
        q.push(1);
        q.push(2);
        q.push(3);
        assert_eq!(q.pop(), 1);
        assert_eq!(q.pop(), 2);
        assert_eq!(q.pop(), 3);
    }

    #[test]
    fn wraps_around_circular_buffer() {
        let q = queue(2);
        q.push(1);
        q.push(2);
        assert_eq!(q.pop(), 1);
        q.push(3);
        assert_eq!(q.pop(), 2);
        assert_eq!(q.pop(), 3);
    }

    #[test]
    fn timed_pop_times_out_on_empty_queue() {
        let q: PcQueue<u32> = queue(1);
        let result = q.timed_pop(Duration::from_millis(10));
        assert_eq!(result, Err(QueueError::Timeout));
        assert_eq!(q.len(), 0);
    }

    #[test]
    fn peek_does_not_remove() {
        let q = queue(2);
        q.push(42);
        assert_eq!(q.peek(), 42);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), 42);
    }

    #[test]
    fn push_blocks_until_space_freed() {
        let q = Arc::new(queue(1));
        q.push(1);
        let q2 = Arc::clone(&q);
        let pusher = thread::spawn(move || {
            q2.push(2);
        });
        thread::sleep(Duration::from_millis(20));
        assert_eq!(q.pop(), 1);
        pusher.join().unwrap();
        assert_eq!(q.pop(), 2);
    }

    #[test]
    fn try_push_fails_without_blocking_when_full() {
        let q = queue(1);
        q.push(1);
        assert_eq!(q.try_push(2), Err(2));
        assert_eq!(q.pop(), 1);
        assert_eq!(q.try_push(2), Ok(()));
    }

    #[test]
    fn peek_with_does_not_remove() {
        let q = queue(2);
        q.push(42);
        let seen = q.peek_with(|v| *v);
        assert_eq!(seen, 42);
        assert_eq!(q.len(), 1);
        assert_eq!(q.pop(), 42);
    }

    #[test]
    fn capacity_is_respected() {
        let q = queue::<u32>(4);
        assert_eq!(q.capacity(), 4);
        assert!(q.is_empty());
        for i in 0..4 {
            q.push(i);
        }
        assert!(q.is_full());
    }
}
