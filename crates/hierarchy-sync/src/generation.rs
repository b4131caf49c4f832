//! Request generations
//!
//! Every network fetch takes a ticket from one monotonically increasing
//! counter and records it as the latest for its cache key. A response is
//! applied only if its ticket is still the latest when it lands.

use dashmap::DashMap;
use hierarchy_cache::CacheKey;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Ticket identifying one fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// Raw counter value
    #[inline]
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Latest generation issued per cache key
#[derive(Debug, Default)]
pub struct RequestGenerations {
    counter: AtomicU64,
    latest: DashMap<CacheKey, Generation>,
}

impl RequestGenerations {
    /// Create empty registry
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new generation for `key`, superseding any earlier one
    pub fn issue(&self, key: CacheKey) -> Generation {
        let generation = Generation(self.counter.fetch_add(1, Ordering::Relaxed) + 1);
        self.latest.insert(key, generation);
        generation
    }

    /// Whether `generation` is still the latest for `key`
    #[must_use]
    pub fn is_current(&self, key: CacheKey, generation: Generation) -> bool {
        self.latest.get(&key).is_some_and(|latest| *latest == generation)
    }

    /// Latest generation issued for `key`
    #[must_use]
    pub fn latest(&self, key: CacheKey) -> Option<Generation> {
        self.latest.get(&key).map(|latest| *latest)
    }

    /// Forget every key; in-flight responses become stale
    ///
    /// The counter keeps running so tickets issued later never collide with
    /// ones still in flight.
    pub fn clear(&self) {
        self.latest.clear();
    }
}
