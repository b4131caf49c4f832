//! Owned hierarchy cache
//!
//! Bundles the normalized store, one tree per store and the freshness
//! tracker. It is an ordinary value: whoever performs fetches owns it (or a
//! lock around it) and passes it where needed.

use crate::freshness::{CacheKey, Clock, FetchStatus, FreshnessTracker};
use crate::store::NormalizedStore;
use hierarchy_model::{Forest, HierarchyEdge, StoreId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Stores with an edge list
    pub store_count: usize,
    /// Stores with a cached tree
    pub tree_count: usize,
    /// Edges across all stores
    pub edge_count: usize,
    /// Distinct roles
    pub role_count: usize,
    /// Distinct permissions
    pub permission_count: usize,
}

/// Normalized entities, per-store trees and freshness, in one owned value
#[derive(Debug, Clone, Default)]
pub struct HierarchyCache {
    store: NormalizedStore,
    trees: HashMap<StoreId, Forest>,
    freshness: FreshnessTracker,
}

impl HierarchyCache {
    /// Create empty cache with the given freshness window
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            store: NormalizedStore::new(),
            trees: HashMap::new(),
            freshness: FreshnessTracker::new(window),
        }
    }

    /// Create empty cache on a supplied clock
    #[must_use]
    pub fn with_clock(window: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            store: NormalizedStore::new(),
            trees: HashMap::new(),
            freshness: FreshnessTracker::with_clock(window, clock),
        }
    }

    /// Normalized entities
    #[inline]
    #[must_use]
    pub fn store(&self) -> &NormalizedStore {
        &self.store
    }

    /// Normalized entities, mutable
    #[inline]
    pub fn store_mut(&mut self) -> &mut NormalizedStore {
        &mut self.store
    }

    /// Freshness tracker
    #[inline]
    #[must_use]
    pub fn freshness(&self) -> &FreshnessTracker {
        &self.freshness
    }

    /// Freshness tracker, mutable
    #[inline]
    pub fn freshness_mut(&mut self) -> &mut FreshnessTracker {
        &mut self.freshness
    }

    /// Store a fetched edge list and mark it fresh
    pub fn replace_edges(&mut self, store_id: StoreId, edges: Vec<HierarchyEdge>) -> usize {
        let count = self.store.replace_store_edges(store_id, edges);
        self.freshness.complete_fetch(CacheKey::Hierarchies(store_id));
        count
    }

    /// Store a built tree and mark it fresh
    pub fn set_tree(&mut self, store_id: StoreId, tree: Forest) {
        self.trees.insert(store_id, tree);
        self.freshness.complete_fetch(CacheKey::Tree(store_id));
    }

    /// A store's edges, in list order
    #[must_use]
    pub fn edges(&self, store_id: StoreId) -> Vec<&HierarchyEdge> {
        self.store.store_edges(store_id)
    }

    /// A store's tree, if one was ever stored
    #[must_use]
    pub fn tree(&self, store_id: StoreId) -> Option<&Forest> {
        self.trees.get(&store_id)
    }

    /// Whether a store's edge list is fresh
    #[inline]
    #[must_use]
    pub fn hierarchies_are_fresh(&self, store_id: StoreId) -> bool {
        self.freshness.hierarchies_are_fresh(store_id)
    }

    /// Whether a store's tree is fresh
    #[inline]
    #[must_use]
    pub fn tree_is_fresh(&self, store_id: StoreId) -> bool {
        self.freshness.tree_is_fresh(store_id)
    }

    /// Current state of a key
    #[inline]
    #[must_use]
    pub fn status(&self, key: CacheKey) -> FetchStatus {
        self.freshness.status(key)
    }

    /// Force the next fetches for a store to hit the network
    ///
    /// Cached data stays readable until it is replaced.
    pub fn invalidate_store(&mut self, store_id: StoreId) {
        self.freshness.invalidate_store(store_id);
    }

    /// Drop a store's data and timestamps entirely
    pub fn evict_store(&mut self, store_id: StoreId) {
        self.store.remove_store(store_id);
        self.trees.remove(&store_id);
        self.freshness.invalidate_store(store_id);
    }

    /// Return to the empty state
    pub fn reset(&mut self) {
        self.store.clear();
        self.trees.clear();
        self.freshness.clear();
    }

    /// Get cache statistics
    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            store_count: self.store.store_count(),
            tree_count: self.trees.len(),
            edge_count: self.store.edge_count(),
            role_count: self.store.role_count(),
            permission_count: self.store.permission_count(),
        }
    }
}
