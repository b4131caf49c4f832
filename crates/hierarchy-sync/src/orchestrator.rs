//! Hierarchy sync orchestrator
//!
//! Owns the cache and mediates every backend call:
//! - Reads are served from cache while fresh, otherwise fetched with retry
//! - Each fetch carries a generation; late responses are discarded
//! - Mutations are sent once, then both views of the store are refetched;
//!   a failed refetch is reported next to the accepted mutation
//!
//! The cache lock is only taken between awaits, never across one.

use crate::api::HierarchyApi;
use crate::config::SyncConfig;
use crate::error::{SyncError, SyncResult};
use crate::generation::{Generation, RequestGenerations};
use crate::retry::RetryPolicy;
use hierarchy_cache::{CacheKey, FetchStatus, HierarchyCache};
use hierarchy_model::{
    CreateHierarchyRequest, Forest, HierarchyEdge, Permission, RemoveHierarchyRequest, RoleId,
    StoreId,
};
use hierarchy_tree::{
    aggregated_permissions, validate_hierarchy, validate_hierarchy_data, AggregateOptions,
    HierarchyReport, TreeBuilder,
};
use parking_lot::Mutex;

/// Where a fetch result came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Served from a fresh cache entry
    Cache,
    /// Fetched and stored
    Network,
    /// Fetched, but a newer request had been issued; cache left as is
    Superseded,
}

/// Data returned by a fetch, tagged with its source
#[derive(Debug, Clone, PartialEq)]
pub struct Fetched<T> {
    /// Cached or fetched data
    pub data: T,
    /// Where it came from
    pub source: FetchSource,
}

impl<T> Fetched<T> {
    fn new(data: T, source: FetchSource) -> Self {
        Self { data, source }
    }

    /// Whether the data came from the cache without a request
    #[inline]
    #[must_use]
    pub fn is_cached(&self) -> bool {
        self.source == FetchSource::Cache
    }
}

/// A mutation the backend accepted, with the outcome of the refetch after it
#[derive(Debug, Clone, PartialEq)]
#[must_use]
pub struct Mutation<T> {
    /// What the backend returned
    pub value: T,
    /// Result of the follow-up [`HierarchySync::reconcile`]
    pub reconcile: SyncResult<()>,
}

impl<T> Mutation<T> {
    /// Whether the cache was refreshed after the mutation
    #[inline]
    #[must_use]
    pub fn is_reconciled(&self) -> bool {
        self.reconcile.is_ok()
    }

    /// Backend result, ignoring the refetch outcome
    #[inline]
    pub fn into_value(self) -> T {
        self.value
    }
}

/// Fetch orchestration over a [`HierarchyApi`]
#[derive(Debug)]
pub struct HierarchySync<A> {
    api: A,
    cache: Mutex<HierarchyCache>,
    generations: RequestGenerations,
    builder: TreeBuilder,
    retry: RetryPolicy,
}

impl<A: HierarchyApi> HierarchySync<A> {
    /// Create orchestrator with an empty cache
    #[must_use]
    pub fn new(api: A, config: &SyncConfig) -> Self {
        Self::with_cache(api, config, HierarchyCache::new(config.freshness_window()))
    }

    /// Create orchestrator around an existing cache
    ///
    /// The cache's own freshness window is kept.
    #[must_use]
    pub fn with_cache(api: A, config: &SyncConfig, cache: HierarchyCache) -> Self {
        Self {
            api,
            cache: Mutex::new(cache),
            generations: RequestGenerations::new(),
            builder: TreeBuilder::new().with_mode(config.ingest_mode()),
            retry: config.retry,
        }
    }

    /// Backend in use
    #[inline]
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Run `f` against the cache
    pub fn read<R>(&self, f: impl FnOnce(&HierarchyCache) -> R) -> R {
        f(&self.cache.lock())
    }

    /// Fetch a store's edge list
    ///
    /// # Arguments
    /// * `store_id` - Store to fetch
    /// * `force` - Skip the freshness check
    ///
    /// # Errors
    /// Returns [`SyncError::Api`] once retries are exhausted or on a
    /// non-retryable failure. Cached data is left untouched.
    pub async fn fetch_hierarchies(
        &self,
        store_id: StoreId,
        force: bool,
    ) -> SyncResult<Fetched<Vec<HierarchyEdge>>> {
        let key = CacheKey::Hierarchies(store_id);

        if !force {
            if let Some(edges) = self.fresh_edges(store_id) {
                tracing::debug!(%key, "serving edges from cache");
                return Ok(Fetched::new(edges, FetchSource::Cache));
            }
        }

        let generation = self.begin(key);
        let result = self
            .retry
            .run("fetch_hierarchies", || self.api.fetch_hierarchies(store_id))
            .await;

        let mut cache = self.cache.lock();
        match result {
            Ok(edges) => {
                if !self.generations.is_current(key, generation) {
                    tracing::debug!(%key, %generation, "discarding superseded edge response");
                    let current = cache.edges(store_id).into_iter().cloned().collect();
                    return Ok(Fetched::new(current, FetchSource::Superseded));
                }

                let count = cache.replace_edges(store_id, edges);
                tracing::info!(store = %store_id, edges = count, "fetched hierarchies");
                let stored = cache.edges(store_id).into_iter().cloned().collect();
                Ok(Fetched::new(stored, FetchSource::Network))
            }
            Err(err) => {
                if self.generations.is_current(key, generation) {
                    cache.freshness_mut().fail_fetch(key);
                }
                tracing::error!(%key, error = %err, "failed to fetch hierarchies");
                Err(err.into())
            }
        }
    }

    /// Fetch and build a store's tree
    ///
    /// # Arguments
    /// * `store_id` - Store to fetch
    /// * `force` - Skip the freshness check
    ///
    /// # Errors
    /// - [`SyncError::Api`] if the request fails
    /// - [`SyncError::Build`] if strict ingestion rejects the payload
    pub async fn fetch_tree(&self, store_id: StoreId, force: bool) -> SyncResult<Fetched<Forest>> {
        let key = CacheKey::Tree(store_id);

        if !force {
            if let Some(tree) = self.fresh_tree(store_id) {
                tracing::debug!(%key, "serving tree from cache");
                return Ok(Fetched::new(tree, FetchSource::Cache));
            }
        }

        let generation = self.begin(key);
        let result = self
            .retry
            .run("fetch_tree", || self.api.fetch_tree(store_id))
            .await;

        let mut cache = self.cache.lock();
        if !self.generations.is_current(key, generation) {
            tracing::debug!(%key, %generation, "discarding superseded tree response");
            return match result {
                Ok(_) => Ok(Fetched::new(
                    cache.tree(store_id).cloned().unwrap_or_default(),
                    FetchSource::Superseded,
                )),
                Err(err) => Err(err.into()),
            };
        }

        let built = result
            .map_err(SyncError::from)
            .and_then(|raw| self.builder.build(&raw).map_err(SyncError::from));

        match built {
            Ok(report) => {
                if !report.is_complete() {
                    tracing::warn!(
                        store = %store_id,
                        rejected = report.rejected.len(),
                        "stored partial tree"
                    );
                }
                cache.set_tree(store_id, report.tree.clone());
                tracing::info!(store = %store_id, roots = report.tree.len(), "fetched tree");
                Ok(Fetched::new(report.tree, FetchSource::Network))
            }
            Err(err) => {
                cache.freshness_mut().fail_fetch(key);
                tracing::error!(%key, error = %err, "failed to fetch tree");
                Err(err)
            }
        }
    }

    /// Create an edge, then refetch the store
    ///
    /// The request is checked against the cached edges first; a rejected
    /// request never reaches the backend. Once the backend accepts, the
    /// returned edge is listed under its store immediately, so a retry is
    /// caught as a duplicate even if the refetch fails.
    ///
    /// # Errors
    /// - [`SyncError::Rejected`] for a self-reference, duplicate or cycle
    /// - [`SyncError::Api`] if the backend refuses (not retried)
    ///
    /// A failed refetch is returned in [`Mutation::reconcile`]; the store
    /// stays invalidated.
    pub async fn create_hierarchy(
        &self,
        request: &CreateHierarchyRequest,
    ) -> SyncResult<Mutation<HierarchyEdge>> {
        {
            let cache = self.cache.lock();
            if let Err(err) = validate_hierarchy_data(request, cache.edges(request.store_id)) {
                tracing::warn!(store = %request.store_id, error = %err, "rejected hierarchy before sending");
                return Err(err.into());
            }
        }

        let edge = self.api.create_hierarchy(request).await.map_err(|err| {
            tracing::error!(store = %request.store_id, error = %err, "failed to create hierarchy");
            err
        })?;
        tracing::info!(
            store = %request.store_id,
            higher = %request.higher_role_id,
            lower = %request.lower_role_id,
            "created hierarchy"
        );
        self.cache.lock().store_mut().upsert_edge(edge.clone());

        let reconcile = self.reconcile_after_mutation(request.store_id).await;
        Ok(Mutation {
            value: edge,
            reconcile,
        })
    }

    /// Remove an edge, then refetch the store
    ///
    /// # Errors
    /// [`SyncError::Api`] if the backend refuses (not retried). A failed
    /// refetch is returned in [`Mutation::reconcile`].
    pub async fn remove_hierarchy(&self, request: &RemoveHierarchyRequest) -> SyncResult<Mutation<()>> {
        self.api.remove_hierarchy(request).await.map_err(|err| {
            tracing::error!(store = %request.store_id, error = %err, "failed to remove hierarchy");
            err
        })?;
        tracing::info!(
            store = %request.store_id,
            higher = %request.higher_role_id,
            lower = %request.lower_role_id,
            "removed hierarchy"
        );

        let reconcile = self.reconcile_after_mutation(request.store_id).await;
        Ok(Mutation {
            value: (),
            reconcile,
        })
    }

    /// Invalidate a store and refetch its edges and tree concurrently
    ///
    /// Both fetches run to completion even if one fails.
    ///
    /// # Errors
    /// Returns the edge fetch error if any, otherwise the tree fetch error.
    pub async fn reconcile(&self, store_id: StoreId) -> SyncResult<()> {
        self.invalidate(store_id);
        let (edges, tree) = futures::join!(
            self.fetch_hierarchies(store_id, true),
            self.fetch_tree(store_id, true)
        );
        edges?;
        tree?;
        tracing::debug!(store = %store_id, "reconciled store");
        Ok(())
    }

    /// Mark both views of a store stale; data stays readable
    pub fn invalidate(&self, store_id: StoreId) {
        self.cache.lock().invalidate_store(store_id);
    }

    /// Drop all cached data; in-flight responses will be discarded
    pub fn reset(&self) {
        self.generations.clear();
        self.cache.lock().reset();
        tracing::info!("reset hierarchy cache");
    }

    /// Cached edges for a store
    #[must_use]
    pub fn edges(&self, store_id: StoreId) -> Vec<HierarchyEdge> {
        self.read(|cache| cache.edges(store_id).into_iter().cloned().collect())
    }

    /// Cached tree for a store
    #[must_use]
    pub fn tree(&self, store_id: StoreId) -> Option<Forest> {
        self.read(|cache| cache.tree(store_id).cloned())
    }

    /// State of a cache key
    #[must_use]
    pub fn status(&self, key: CacheKey) -> FetchStatus {
        self.read(|cache| cache.status(key))
    }

    /// Effective permissions of a role from the cached tree
    #[must_use]
    pub fn aggregated_permissions(
        &self,
        store_id: StoreId,
        role_id: RoleId,
        options: &AggregateOptions,
    ) -> Vec<Permission> {
        self.read(|cache| {
            cache
                .tree(store_id)
                .map(|tree| aggregated_permissions(tree, role_id, options))
                .unwrap_or_default()
        })
    }

    /// Structural report for the cached tree
    #[must_use]
    pub fn validate(&self, store_id: StoreId) -> Option<HierarchyReport> {
        self.read(|cache| cache.tree(store_id).map(|tree| validate_hierarchy(tree)))
    }

    async fn reconcile_after_mutation(&self, store_id: StoreId) -> SyncResult<()> {
        let result = self.reconcile(store_id).await;
        if let Err(err) = &result {
            tracing::warn!(store = %store_id, error = %err, "mutation accepted but refetch failed");
        }
        result
    }

    fn begin(&self, key: CacheKey) -> Generation {
        let generation = self.generations.issue(key);
        if !self.cache.lock().freshness_mut().begin_fetch(key) {
            tracing::debug!(%key, %generation, "superseding in-flight request");
        }
        generation
    }

    fn fresh_edges(&self, store_id: StoreId) -> Option<Vec<HierarchyEdge>> {
        self.read(|cache| {
            cache
                .hierarchies_are_fresh(store_id)
                .then(|| cache.edges(store_id).into_iter().cloned().collect())
        })
    }

    fn fresh_tree(&self, store_id: StoreId) -> Option<Forest> {
        self.read(|cache| {
            if cache.tree_is_fresh(store_id) {
                cache.tree(store_id).cloned()
            } else {
                None
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::MockHierarchyApi;
    use crate::error::ApiError;
    use hierarchy_model::RawNode;
    use hierarchy_test_utils::{retail_edges, retail_raw, role};
    use pretty_assertions::assert_eq;

    fn config() -> SyncConfig {
        SyncConfig::default().with_retry(RetryPolicy::none())
    }

    #[tokio::test]
    async fn second_read_is_served_from_cache() {
        let mut api = MockHierarchyApi::new();
        api.expect_fetch_hierarchies()
            .times(1)
            .returning(|store| Ok(retail_edges(store.get(), 1)));

        let sync = HierarchySync::new(api, &config());

        let first = sync.fetch_hierarchies(StoreId(1), false).await.unwrap();
        let second = sync.fetch_hierarchies(StoreId(1), false).await.unwrap();

        assert_eq!(first.source, FetchSource::Network);
        assert!(second.is_cached());
        assert_eq!(second.data.len(), 5);
    }

    #[tokio::test]
    async fn force_bypasses_cache() {
        let mut api = MockHierarchyApi::new();
        api.expect_fetch_tree().times(2).returning(|_| Ok(retail_raw()));

        let sync = HierarchySync::new(api, &config());
        sync.fetch_tree(StoreId(1), false).await.unwrap();
        let forced = sync.fetch_tree(StoreId(1), true).await.unwrap();

        assert_eq!(forced.source, FetchSource::Network);
        assert_eq!(forced.data.len(), 2);
    }

    #[tokio::test]
    async fn strict_ingestion_rejects_malformed_tree() {
        let mut api = MockHierarchyApi::new();
        api.expect_fetch_tree().returning(|_| {
            Ok(vec![RawNode {
                role: None,
                children: Vec::new(),
                permissions: None,
            }])
        });

        let sync = HierarchySync::new(api, &config());
        let err = sync.fetch_tree(StoreId(1), false).await.unwrap_err();

        assert!(matches!(err, SyncError::Build(_)));
        assert_eq!(sync.status(CacheKey::Tree(StoreId(1))), FetchStatus::Absent);
        assert!(sync.tree(StoreId(1)).is_none());
    }

    #[tokio::test]
    async fn lenient_ingestion_keeps_valid_nodes() {
        let mut api = MockHierarchyApi::new();
        api.expect_fetch_tree().returning(|_| {
            Ok(vec![
                RawNode::new(role(1, "Owner")),
                RawNode {
                    role: None,
                    children: Vec::new(),
                    permissions: None,
                },
            ])
        });

        let sync = HierarchySync::new(api, &config().with_strict_ingestion(false));
        let fetched = sync.fetch_tree(StoreId(1), false).await.unwrap();

        assert_eq!(fetched.data.len(), 1);
        assert!(sync.read(|cache| cache.tree_is_fresh(StoreId(1))));
    }

    #[tokio::test]
    async fn failed_fetch_keeps_previous_data() {
        let mut api = MockHierarchyApi::new();
        let mut calls = 0;
        api.expect_fetch_hierarchies().times(2).returning(move |store| {
            calls += 1;
            if calls == 1 {
                Ok(retail_edges(store.get(), 1))
            } else {
                Err(ApiError::Auth { status: 401 })
            }
        });

        let sync = HierarchySync::new(api, &config());
        sync.fetch_hierarchies(StoreId(1), false).await.unwrap();
        let err = sync.fetch_hierarchies(StoreId(1), true).await.unwrap_err();

        assert!(err.requires_login());
        assert_eq!(sync.edges(StoreId(1)).len(), 5);
        assert_eq!(sync.status(CacheKey::Hierarchies(StoreId(1))), FetchStatus::Fresh);
    }

    #[tokio::test]
    async fn selectors_read_cached_tree() {
        let mut api = MockHierarchyApi::new();
        api.expect_fetch_tree().returning(|_| Ok(retail_raw()));

        let sync = HierarchySync::new(api, &config());
        assert!(sync.validate(StoreId(1)).is_none());
        assert!(sync
            .aggregated_permissions(StoreId(1), RoleId(5), &AggregateOptions::default())
            .is_empty());

        sync.fetch_tree(StoreId(1), false).await.unwrap();

        let report = sync.validate(StoreId(1)).unwrap();
        assert!(report.is_valid);
        let names: Vec<_> = sync
            .aggregated_permissions(StoreId(1), RoleId(5), &AggregateOptions::default())
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert!(!names.is_empty());
    }

    #[tokio::test]
    async fn reset_empties_cache() {
        let mut api = MockHierarchyApi::new();
        api.expect_fetch_hierarchies()
            .returning(|store| Ok(retail_edges(store.get(), 1)));

        let sync = HierarchySync::new(api, &config());
        sync.fetch_hierarchies(StoreId(1), false).await.unwrap();

        sync.reset();

        assert!(sync.edges(StoreId(1)).is_empty());
        assert_eq!(sync.status(CacheKey::Hierarchies(StoreId(1))), FetchStatus::Absent);
    }
}
