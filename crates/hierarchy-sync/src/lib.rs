//! Hierarchy Sync
//!
//! Keeps the hierarchy cache in step with the backend.
//!
//! # Overview
//!
//! ```text
//!  caller ──fetch_*/create/remove──> HierarchySync ──retry──> HierarchyApi
//!                                      │   ▲
//!                         generations ─┘   └─ HierarchyCache (locked between awaits)
//! ```
//!
//! - **Reads** come from cache while fresh; stale or forced reads go to the
//!   backend with exponential backoff on server errors
//! - **Out-of-order responses** are dropped by comparing request generations
//! - **Mutations** are validated locally, sent once, then followed by a
//!   refetch of the store's edges and tree
//!
//! # Example
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use hierarchy_model::{
//!     CreateHierarchyRequest, HierarchyEdge, RawNode, RemoveHierarchyRequest, StoreId,
//! };
//! use hierarchy_sync::{ApiError, HierarchyApi, HierarchySync, SyncConfig, SyncError};
//!
//! struct Backend;
//!
//! #[async_trait]
//! impl HierarchyApi for Backend {
//!     async fn fetch_hierarchies(&self, _: StoreId) -> Result<Vec<HierarchyEdge>, ApiError> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn fetch_tree(&self, _: StoreId) -> Result<Vec<RawNode>, ApiError> {
//!         Ok(Vec::new())
//!     }
//!
//!     async fn create_hierarchy(&self, req: &CreateHierarchyRequest) -> Result<HierarchyEdge, ApiError> {
//!         Ok(HierarchyEdge::new(1u64, req.store_id, req.higher_role_id, req.lower_role_id))
//!     }
//!
//!     async fn remove_hierarchy(&self, _: &RemoveHierarchyRequest) -> Result<(), ApiError> {
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), SyncError> {
//!     let sync = HierarchySync::new(Backend, &SyncConfig::default());
//!     let tree = sync.fetch_tree(StoreId(1), false).await?;
//!     println!("{} roots", tree.data.len());
//!
//!     let created = sync
//!         .create_hierarchy(&CreateHierarchyRequest::new(1u64, 2u64, 1u64))
//!         .await?;
//!     if let Err(err) = &created.reconcile {
//!         eprintln!("edge {} saved, refresh failed: {err}", created.value.id);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod api;
pub mod config;
pub mod error;
pub mod generation;
pub mod orchestrator;
pub mod retry;

// Re-exports for convenience
pub use api::HierarchyApi;
pub use config::SyncConfig;
pub use error::{ApiError, ConfigError, SyncError, SyncResult, NETWORK_ERROR_MESSAGE};
pub use generation::{Generation, RequestGenerations};
pub use orchestrator::{FetchSource, Fetched, HierarchySync, Mutation};
pub use retry::RetryPolicy;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for sync operations
    pub use crate::{
        ApiError, FetchSource, Fetched, HierarchyApi, HierarchySync, Mutation, RetryPolicy,
        SyncConfig, SyncError,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
