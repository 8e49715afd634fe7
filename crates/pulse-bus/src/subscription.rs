//! Subscription registry: a sequence sorted by `(pid, rxq)` so that every
//! pid's subscribers form a contiguous run.

use crate::error::{BusError, BusResult};
use crate::rxq::RxqId;

/// One `(pid, rxq)` registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct Subscription {
    pub pid: u32,
    pub rxq: RxqId,
}

/// The bus's subscription list: a `Vec` kept sorted by `(pid, rxq)`, giving
/// an `O(log N)` lower-bound lookup of a pid's first subscriber and `O(k)`
/// enumeration of its `k` subscribers. A sorted array was chosen over a
/// hashmap since it also gives trivial in-order iteration for
/// debugging/introspection.
#[derive(Debug, Default)]
pub(crate) struct SubscriptionList {
    entries: Vec<Subscription>,
}

impl SubscriptionList {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Inserts `(pid, rxq)`, maintaining sort order. Rejects duplicates and
    /// enforces `max_subscriptions`.
    pub fn subscribe(&mut self, pid: u32, rxq: RxqId, max_subscriptions: usize) -> BusResult<()> {
        let sub = Subscription { pid, rxq };
        match self.entries.binary_search(&sub) {
            Ok(_) => Err(BusError::AlreadySubscribed { pid }),
            Err(pos) => {
                if self.entries.len() >= max_subscriptions {
                    return Err(BusError::TooManySubscriptions {
                        max: max_subscriptions,
                    });
                }
                self.entries.insert(pos, sub);
                Ok(())
            }
        }
    }

    /// Removes `(pid, rxq)`.
    pub fn unsubscribe(&mut self, pid: u32, rxq: RxqId) -> BusResult<()> {
        let sub = Subscription { pid, rxq };
        match self.entries.binary_search(&sub) {
            Ok(pos) => {
                self.entries.remove(pos);
                Ok(())
            }
            Err(_) => Err(BusError::NotSubscribed { pid }),
        }
    }

    /// Returns the `rxq` of every subscriber currently registered for `pid`,
    /// in `(pid, rxq)` order. This is the fan-out snapshot taken under the
    /// subscription mutex.
    pub fn subscribers_for(&self, pid: u32) -> Vec<RxqId> {
        let start = self
            .entries
            .partition_point(|s| s.pid < pid);
        self.entries[start..]
            .iter()
            .take_while(|s| s.pid == pid)
            .map(|s| s.rxq)
            .collect()
    }

    #[cfg(debug_assertions)]
    pub fn is_sorted(&self) -> bool {
        self.entries.windows(2).all(|w| w[0] <= w[1])
    }
}
