//! PULSE: a zero-copy publish/subscribe bus over a reference-counted memory
//! pool.
//!
//! A publisher reserves a chunk from the smallest pool whose chunk size is
//! large enough for the packet, fills it, then releases it to the bus. The
//! bus looks up every RXQ subscribed to the packet's identifier and
//! enqueues one [`ReceiveEntry`] per subscriber, incrementing the chunk's
//! reference count by the number of recipients. Consumers drain their RXQ;
//! popping an entry decrements the chunk's refcount and, at zero, returns
//! it to its pool.
//!
//! The bus composes `pulse-sync`'s [`pulse_sync::RdWrLock`] publish gate,
//! `pulse-queue`'s bounded [`pulse_queue::PcQueue`] RXQs, and `pulse-pool`'s
//! refcounted [`pulse_pool::Pool`].
//!
//! ```
//! use pulse_bus::{Bus, BusConfig};
//! use pulse_pool::PoolConfig;
//!
//! let bus = Bus::new(BusConfig::new(vec![PoolConfig::new(64, 4)]));
//! let rxq = bus.rxq_init(8).unwrap();
//! bus.subscribe(rxq, 7).unwrap();
//!
//! bus.publish(7, b"hello").unwrap();
//!
//! let entry = bus.rxq_pop_front(rxq).unwrap();
//! assert_eq!(entry.bytes(), b"hello");
//! ```

mod bus;
mod config;
mod entry;
mod error;
mod event;
mod invariants;
mod reservation;
mod rxq;
mod subscription;

pub use bus::Bus;
pub use config::{BusConfig, MAX_NAME_LEN};
pub use entry::ReceiveEntry;
pub use error::{BusError, BusResult};
pub use event::{EventSink, NoopSink};
pub use reservation::Reservation;
pub use rxq::RxqId;

// Re-exported so downstream crates configuring a bus don't need a direct
// dependency on the lower crates just to name a pool or flag.
pub use pulse_pool::PoolConfig;
pub use pulse_sync::Flags;
