//! Mutation requests accepted from the dashboard

use crate::ids::{RoleId, StoreId};
use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_active() -> bool {
    true
}

/// Request to create a hierarchy edge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateHierarchyRequest {
    /// Role that will outrank
    pub higher_role_id: RoleId,
    /// Role that will be outranked
    pub lower_role_id: RoleId,
    /// Target store
    pub store_id: StoreId,
    /// Free-form metadata passed through to the backend
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
    /// Whether the edge starts active
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl CreateHierarchyRequest {
    /// Create an active edge request
    #[must_use]
    pub fn new(
        higher_role_id: impl Into<RoleId>,
        lower_role_id: impl Into<RoleId>,
        store_id: impl Into<StoreId>,
    ) -> Self {
        Self {
            higher_role_id: higher_role_id.into(),
            lower_role_id: lower_role_id.into(),
            store_id: store_id.into(),
            metadata: None,
            is_active: true,
        }
    }

    /// With free-form metadata
    #[must_use]
    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Request to remove a hierarchy edge, identified by its role pair and store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RemoveHierarchyRequest {
    /// Outranking role of the edge
    pub higher_role_id: RoleId,
    /// Outranked role of the edge
    pub lower_role_id: RoleId,
    /// Store holding the edge
    pub store_id: StoreId,
}

impl RemoveHierarchyRequest {
    /// Create removal request
    #[must_use]
    pub fn new(
        higher_role_id: impl Into<RoleId>,
        lower_role_id: impl Into<RoleId>,
        store_id: impl Into<StoreId>,
    ) -> Self {
        Self {
            higher_role_id: higher_role_id.into(),
            lower_role_id: lower_role_id.into(),
            store_id: store_id.into(),
        }
    }
}
