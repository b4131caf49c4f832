//! Hierarchy Cache
//!
//! Client-side cache for store-scoped role hierarchies.
//!
//! # Architecture
//!
//! ```text
//! fetch orchestration ──writes──> HierarchyCache ──reads──> tree utilities / UI
//!                                   ├── NormalizedStore   (roles, permissions, edges by id)
//!                                   ├── trees             (one forest per store)
//!                                   └── FreshnessTracker  (hierarchies_{store}, tree_{store})
//! ```
//!
//! # Example
//!
//! ```rust
//! use hierarchy_cache::{HierarchyCache, DEFAULT_FRESHNESS_WINDOW};
//! use hierarchy_model::{HierarchyEdge, StoreId};
//!
//! let mut cache = HierarchyCache::new(DEFAULT_FRESHNESS_WINDOW);
//! cache.replace_edges(StoreId(1), vec![HierarchyEdge::new(1, 1, 10, 20)]);
//!
//! assert!(cache.hierarchies_are_fresh(StoreId(1)));
//! assert!(!cache.tree_is_fresh(StoreId(1)));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

pub mod cache;
pub mod freshness;
pub mod store;

// Re-exports for convenience
pub use cache::{CacheStats, HierarchyCache};
pub use freshness::{
    CacheKey, Clock, FetchStatus, FreshnessTracker, ManualClock, SystemClock,
    DEFAULT_FRESHNESS_WINDOW,
};
pub use store::NormalizedStore;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
