//! Backend seam
//!
//! The HTTP layer lives outside this crate. Anything that can answer these
//! four calls can drive [`HierarchySync`](crate::HierarchySync).

use crate::error::ApiError;
use async_trait::async_trait;
use hierarchy_model::{CreateHierarchyRequest, HierarchyEdge, RawNode, RemoveHierarchyRequest, StoreId};
use std::sync::Arc;

/// Role hierarchy endpoints
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait HierarchyApi: Send + Sync {
    /// Flat edge list for a store
    async fn fetch_hierarchies(&self, store_id: StoreId) -> Result<Vec<HierarchyEdge>, ApiError>;

    /// Nested tree payload for a store
    async fn fetch_tree(&self, store_id: StoreId) -> Result<Vec<RawNode>, ApiError>;

    /// Create an edge; returns the stored edge
    async fn create_hierarchy(&self, request: &CreateHierarchyRequest) -> Result<HierarchyEdge, ApiError>;

    /// Remove the edge matching the triple
    async fn remove_hierarchy(&self, request: &RemoveHierarchyRequest) -> Result<(), ApiError>;
}

#[async_trait]
impl<T: HierarchyApi + ?Sized> HierarchyApi for Arc<T> {
    async fn fetch_hierarchies(&self, store_id: StoreId) -> Result<Vec<HierarchyEdge>, ApiError> {
        (**self).fetch_hierarchies(store_id).await
    }

    async fn fetch_tree(&self, store_id: StoreId) -> Result<Vec<RawNode>, ApiError> {
        (**self).fetch_tree(store_id).await
    }

    async fn create_hierarchy(&self, request: &CreateHierarchyRequest) -> Result<HierarchyEdge, ApiError> {
        (**self).create_hierarchy(request).await
    }

    async fn remove_hierarchy(&self, request: &RemoveHierarchyRequest) -> Result<(), ApiError> {
        (**self).remove_hierarchy(request).await
    }
}
