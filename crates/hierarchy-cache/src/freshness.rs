//! Cache freshness tracking
//!
//! Each (store, kind) pair has an optional "last updated" timestamp. An entry
//! is fresh while `now - timestamp < window`. There is no expiry timer:
//! staleness is computed when asked.
//!
//! ```text
//! Absent/Stale --begin_fetch--> Fetching --complete_fetch--> Fresh
//!                                   |                          |
//!                                fail_fetch          window elapses / invalidate
//!                                   v                          v
//!                             Absent/Stale                   Stale
//! ```

use chrono::{DateTime, Utc};
use hierarchy_model::StoreId;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default freshness window (5 minutes)
pub const DEFAULT_FRESHNESS_WINDOW: Duration = Duration::from_millis(300_000);

/// Source of the current time
pub trait Clock: Send + Sync + fmt::Debug {
    /// Current instant
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    #[inline]
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock for tests and replay
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create clock frozen at `start`
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        if let Some(advanced) = chrono::Duration::from_std(by)
            .ok()
            .and_then(|delta| now.checked_add_signed(delta))
        {
            *now = advanced;
        }
    }

    /// Jump to an instant
    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock() = instant;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(Utc::now())
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

/// Kind of cached data for one store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// Flat edge list
    Hierarchies(StoreId),
    /// Built tree
    Tree(StoreId),
}

impl CacheKey {
    /// Store the key belongs to
    #[inline]
    #[must_use]
    pub fn store_id(self) -> StoreId {
        match self {
            Self::Hierarchies(store) | Self::Tree(store) => store,
        }
    }

    /// Both keys of a store
    #[inline]
    #[must_use]
    pub fn for_store(store_id: StoreId) -> [Self; 2] {
        [Self::Hierarchies(store_id), Self::Tree(store_id)]
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hierarchies(store) => write!(f, "hierarchies_{store}"),
            Self::Tree(store) => write!(f, "tree_{store}"),
        }
    }
}

/// Lazily computed state of a cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Never fetched, or invalidated
    Absent,
    /// Request in flight
    Fetching,
    /// Fetched within the window
    Fresh,
    /// Fetched, but the window has elapsed
    Stale,
}

/// Per-key timestamp map
#[derive(Debug, Clone)]
pub struct FreshnessTracker {
    window: Duration,
    clock: Arc<dyn Clock>,
    last_updated: HashMap<CacheKey, DateTime<Utc>>,
    fetching: HashSet<CacheKey>,
}

impl Default for FreshnessTracker {
    fn default() -> Self {
        Self::new(DEFAULT_FRESHNESS_WINDOW)
    }
}

impl FreshnessTracker {
    /// Create tracker on the system clock
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self::with_clock(window, Arc::new(SystemClock))
    }

    /// Create tracker on a supplied clock
    #[must_use]
    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            window,
            clock,
            last_updated: HashMap::new(),
            fetching: HashSet::new(),
        }
    }

    /// Freshness window
    #[inline]
    #[must_use]
    pub fn window(&self) -> Duration {
        self.window
    }

    /// Current time according to the tracker's clock
    #[inline]
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Stamp a key with the current time
    pub fn mark_fresh(&mut self, key: CacheKey) {
        let now = self.clock.now();
        self.mark_fresh_at(key, now);
    }

    /// Stamp a key with a specific time
    pub fn mark_fresh_at(&mut self, key: CacheKey, at: DateTime<Utc>) {
        self.last_updated.insert(key, at);
    }

    /// When the key was last stamped
    #[must_use]
    pub fn last_updated(&self, key: CacheKey) -> Option<DateTime<Utc>> {
        self.last_updated.get(&key).copied()
    }

    /// Time elapsed since the key was stamped
    ///
    /// A timestamp in the future counts as zero age.
    #[must_use]
    pub fn age(&self, key: CacheKey) -> Option<Duration> {
        let stamped = self.last_updated.get(&key)?;
        Some((self.clock.now() - *stamped).to_std().unwrap_or(Duration::ZERO))
    }

    /// Whether the key was stamped within the window
    #[must_use]
    pub fn is_fresh(&self, key: CacheKey) -> bool {
        self.age(key).is_some_and(|age| age < self.window)
    }

    /// Whether a store's edge list is fresh
    #[inline]
    #[must_use]
    pub fn hierarchies_are_fresh(&self, store_id: StoreId) -> bool {
        self.is_fresh(CacheKey::Hierarchies(store_id))
    }

    /// Whether a store's tree is fresh
    #[inline]
    #[must_use]
    pub fn tree_is_fresh(&self, store_id: StoreId) -> bool {
        self.is_fresh(CacheKey::Tree(store_id))
    }

    /// Current state of a key
    #[must_use]
    pub fn status(&self, key: CacheKey) -> FetchStatus {
        if self.fetching.contains(&key) {
            FetchStatus::Fetching
        } else if !self.last_updated.contains_key(&key) {
            FetchStatus::Absent
        } else if self.is_fresh(key) {
            FetchStatus::Fresh
        } else {
            FetchStatus::Stale
        }
    }

    /// Record that a fetch started; false if one was already in flight
    pub fn begin_fetch(&mut self, key: CacheKey) -> bool {
        self.fetching.insert(key)
    }

    /// Record a successful fetch
    pub fn complete_fetch(&mut self, key: CacheKey) {
        self.fetching.remove(&key);
        self.mark_fresh(key);
    }

    /// Record a failed fetch; the timestamp is left untouched
    pub fn fail_fetch(&mut self, key: CacheKey) {
        self.fetching.remove(&key);
    }

    /// Forget a key's timestamp
    pub fn invalidate(&mut self, key: CacheKey) {
        if self.last_updated.remove(&key).is_some() {
            tracing::debug!(%key, "invalidated cache entry");
        }
    }

    /// Forget both timestamps of a store
    pub fn invalidate_store(&mut self, store_id: StoreId) {
        for key in CacheKey::for_store(store_id) {
            self.invalidate(key);
        }
    }

    /// Forget every timestamp and in-flight marker
    pub fn clear(&mut self) {
        self.last_updated.clear();
        self.fetching.clear();
    }
}
