//! Normalized entity records
//!
//! Records are immutable once fetched and replaced wholesale on refetch.
//! Fields the cache does not interpret are kept in `attributes` so a record
//! round-trips without loss.

use crate::ids::{EdgeId, PermissionId, RoleId, StoreId};
use crate::request::RemoveHierarchyRequest;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A permission that can be granted to a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Permission {
    /// Backend id
    pub id: PermissionId,
    /// Display name
    pub name: String,
    /// Auth guard, e.g. `web` or `api`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_name: Option<String>,
}

impl Permission {
    /// Create permission without a guard
    #[must_use]
    pub fn new(id: impl Into<PermissionId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guard_name: None,
        }
    }

    /// With guard name
    #[must_use]
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard_name = Some(guard.into());
        self
    }
}

/// A role record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    /// Backend id
    pub id: RoleId,
    /// Display name
    pub name: String,
    /// Auth guard the role belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guard_name: Option<String>,
    /// Permissions embedded by the backend, if any
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub permissions: Vec<Permission>,
    /// Backend fields not interpreted here
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Role {
    /// Create role with no guard, permissions or extra attributes
    #[must_use]
    pub fn new(id: impl Into<RoleId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            guard_name: None,
            permissions: Vec::new(),
            attributes: Map::new(),
        }
    }

    /// With guard name
    #[must_use]
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard_name = Some(guard.into());
        self
    }

    /// With embedded permissions
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = permissions;
        self
    }
}

/// Store scoping a hierarchy
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    /// Backend id
    pub id: StoreId,
    /// Display name
    pub name: String,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl Store {
    /// Create store record
    #[must_use]
    pub fn new(id: impl Into<StoreId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            attributes: Map::new(),
        }
    }
}

/// Directed "higher role outranks lower role" record scoped to one store
///
/// `higher_role_id == lower_role_id` is representable; it is reported by the
/// edge pre-check rather than rejected here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HierarchyEdge {
    /// Backend id
    pub id: EdgeId,
    /// Store the edge belongs to
    pub store_id: StoreId,
    /// Outranking role
    pub higher_role_id: RoleId,
    /// Outranked role
    pub lower_role_id: RoleId,
    /// Embedded higher role, when the backend includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub higher_role: Option<Role>,
    /// Embedded lower role, when the backend includes it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lower_role: Option<Role>,
    /// Embedded store
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last update time
    pub updated_at: DateTime<Utc>,
}

impl HierarchyEdge {
    /// Create edge stamped with the current time and no embedded records
    #[must_use]
    pub fn new(
        id: impl Into<EdgeId>,
        store_id: impl Into<StoreId>,
        higher_role_id: impl Into<RoleId>,
        lower_role_id: impl Into<RoleId>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            store_id: store_id.into(),
            higher_role_id: higher_role_id.into(),
            lower_role_id: lower_role_id.into(),
            higher_role: None,
            lower_role: None,
            store: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// With embedded role records
    #[must_use]
    pub fn with_roles(mut self, higher: Role, lower: Role) -> Self {
        self.higher_role = Some(higher);
        self.lower_role = Some(lower);
        self
    }

    /// Whether the edge points a role at itself
    #[inline]
    #[must_use]
    pub fn is_self_reference(&self) -> bool {
        self.higher_role_id == self.lower_role_id
    }

    /// Whether this edge connects `higher` over `lower`
    #[inline]
    #[must_use]
    pub fn connects(&self, higher: RoleId, lower: RoleId) -> bool {
        self.higher_role_id == higher && self.lower_role_id == lower
    }

    /// Whether a removal request identifies this edge
    #[must_use]
    pub fn matches_removal(&self, request: &RemoveHierarchyRequest) -> bool {
        self.store_id == request.store_id
            && self.connects(request.higher_role_id, request.lower_role_id)
    }

    /// Embedded role records, higher first
    pub fn embedded_roles(&self) -> impl Iterator<Item = &Role> {
        self.higher_role.iter().chain(self.lower_role.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn role_keeps_unknown_fields() {
        let json = r#"{"id":3,"name":"Cashier","guard_name":"web","level":2}"#;
        let role: Role = serde_json::from_str(json).unwrap();

        assert_eq!(role.id, RoleId(3));
        assert_eq!(role.guard_name.as_deref(), Some("web"));
        assert_eq!(role.attributes.get("level"), Some(&Value::from(2)));

        let back: Value = serde_json::to_value(&role).unwrap();
        assert_eq!(back["level"], Value::from(2));
    }

    #[test]
    fn edge_deserializes_backend_shape() {
        let json = r#"{
            "id": 1,
            "store_id": 5,
            "higher_role_id": 10,
            "lower_role_id": 20,
            "higher_role": {"id": 10, "name": "Manager"},
            "created_at": "2024-03-01T10:00:00Z",
            "updated_at": "2024-03-01T10:00:00Z"
        }"#;
        let edge: HierarchyEdge = serde_json::from_str(json).unwrap();

        assert_eq!(edge.store_id, StoreId(5));
        assert!(edge.connects(RoleId(10), RoleId(20)));
        assert!(edge.lower_role.is_none());
        assert_eq!(edge.embedded_roles().count(), 1);
    }

    #[test]
    fn edge_self_reference_is_representable() {
        let edge = HierarchyEdge::new(1, 1, 4, 4);
        assert!(edge.is_self_reference());
    }

    #[test]
    fn edge_matches_removal_triple() {
        let edge = HierarchyEdge::new(1, 2, 10, 20);
        let hit = RemoveHierarchyRequest::new(10, 20, 2);
        let other_store = RemoveHierarchyRequest::new(10, 20, 3);

        assert!(edge.matches_removal(&hit));
        assert!(!edge.matches_removal(&other_store));
    }
}
