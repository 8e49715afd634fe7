use pulse_pool::PoolConfig;
use pulse_sync::Flags;

/// Maximum length of a [`BusConfig::name`] debug tag.
pub const MAX_NAME_LEN: usize = 32;

/// Construction parameters for a [`crate::Bus`].
///
/// An ordered list of pool configurations (pools are indexed 0..N-1 in the
/// caller-supplied order), the maximum RXQ and subscription counts, and
/// flags.
#[derive(Debug, Clone)]
pub struct BusConfig {
    /// Pool configurations, in the order pools are indexed.
    pub pools: Vec<PoolConfig>,
    /// Upper bound on the number of RXQs `rxq_init` may create.
    pub max_rxqs: usize,
    /// Upper bound on the number of live subscriptions.
    pub max_subscriptions: usize,
    /// Configuration flags. Only [`Flags::PULSE_ASYNC`] affects behavior;
    /// the `NOALLOC_*` bits are accepted for interface compatibility but
    /// are no-ops.
    pub flags: Flags,
    /// ASCII debug name, truncated to [`MAX_NAME_LEN`] bytes.
    pub name: String,
}

impl BusConfig {
    /// Creates a configuration for the given ordered pool list, with
    /// generous default RXQ/subscription limits, synchronous release mode,
    /// and an empty name.
    ///
    /// # Panics
    ///
    /// Panics if `pools` is empty: a bus needs at least one pool to reserve
    /// chunks from.
    pub fn new(pools: Vec<PoolConfig>) -> Self {
        assert!(!pools.is_empty(), "Bus requires at least one pool");
        Self {
            pools,
            max_rxqs: 64,
            max_subscriptions: 256,
            flags: Flags::empty(),
            name: String::new(),
        }
    }

    /// Builder-style setter for [`Self::max_rxqs`].
    pub fn with_max_rxqs(mut self, max_rxqs: usize) -> Self {
        self.max_rxqs = max_rxqs;
        self
    }

    /// Builder-style setter for [`Self::max_subscriptions`].
    pub fn with_max_subscriptions(mut self, max_subscriptions: usize) -> Self {
        self.max_subscriptions = max_subscriptions;
        self
    }

    /// Builder-style setter for [`Self::flags`].
    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    /// Builder-style setter for [`Self::name`], truncated to
    /// [`MAX_NAME_LEN`] ASCII bytes.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        let mut name = name.into();
        name.truncate(MAX_NAME_LEN);
        self.name = name;
        self
    }

    /// Whether fan-out release should hold the publish gate in read mode
    /// (async, concurrent-consumption-permitted) rather than write mode
    /// (synchronous).
    pub fn is_async(&self) -> bool {
        self.flags.contains(Flags::PULSE_ASYNC)
    }
}
