//! Bounded blocking producer/consumer FIFO queue.
//!
//! `pulse-queue` provides [`PcQueue`], the receive-queue building block
//! `pulse-bus` fans packets out into.

mod config;
mod error;
mod invariants;
mod queue;

pub use config::PcQueueConfig;
pub use error::{QueueError, QueueResult};
pub use queue::PcQueue;
