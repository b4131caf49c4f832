//! Tree node shapes
//!
//! [`RawNode`] mirrors the nested response from the backend and tolerates
//! missing fields. [`TreeNode`] is the annotated form consumers read.

use crate::entity::{Permission, Role};
use crate::ids::RoleId;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A store's hierarchy: one entry per top-level role
pub type Forest = Vec<TreeNode>;

/// Role as it appears inside a raw tree response
///
/// Every field is optional so one malformed node does not fail the whole
/// payload; the builder decides what to do with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRole {
    /// Role id; required by the builder
    #[serde(default)]
    pub id: Option<RoleId>,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
    /// Auth guard
    #[serde(default)]
    pub guard_name: Option<String>,
    /// Fields this crate does not interpret
    #[serde(flatten)]
    pub attributes: Map<String, Value>,
}

impl From<Role> for RawRole {
    fn from(role: Role) -> Self {
        Self {
            id: Some(role.id),
            name: Some(role.name),
            guard_name: role.guard_name,
            attributes: role.attributes,
        }
    }
}

/// Nested node exactly as received
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawNode {
    /// Role record; required by the builder
    #[serde(default)]
    pub role: Option<RawRole>,
    /// Direct subordinates
    #[serde(default)]
    pub children: Vec<RawNode>,
    /// Permissions granted directly
    #[serde(default)]
    pub permissions: Option<Vec<Permission>>,
}

impl RawNode {
    /// Create raw node for a role
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role: Some(role.into()),
            children: Vec::new(),
            permissions: None,
        }
    }

    /// With permissions
    #[must_use]
    pub fn with_permissions(mut self, permissions: Vec<Permission>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    /// With children
    #[must_use]
    pub fn with_children(mut self, children: Vec<RawNode>) -> Self {
        self.children = children;
        self
    }
}

/// Traversal state attached to every built node
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeMetadata {
    /// Distance from the root (roots are 0)
    pub depth: usize,
    /// Role ids from the root down to this node, inclusive
    pub path: Vec<RoleId>,
    /// Expanded in a tree view (depth below 2 on build)
    pub is_expanded: bool,
    /// Selected in a tree view
    pub is_selected: bool,
    /// Children are being loaded
    pub is_loading: bool,
    /// Last load failed
    pub has_error: bool,
}

/// Annotated hierarchy node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeNode {
    /// Role at this node
    pub role: Role,
    /// Direct subordinates
    #[serde(default)]
    pub children: Vec<TreeNode>,
    /// Permissions granted directly
    #[serde(default)]
    pub permissions: Vec<Permission>,
    /// Traversal state; `None` once stripped by a transform
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tree_metadata: Option<TreeMetadata>,
}

impl TreeNode {
    /// Create a leaf node with no metadata
    #[must_use]
    pub fn new(role: Role) -> Self {
        Self {
            role,
            children: Vec::new(),
            permissions: Vec::new(),
            tree_metadata: None,
        }
    }

    /// Role id of this node
    #[inline]
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role.id
    }

    /// Whether the node has no children
    #[inline]
    #[must_use]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Traversal metadata, when attached
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> Option<&TreeMetadata> {
        self.tree_metadata.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn raw_node_tolerates_missing_fields() {
        let json = r#"[{"role":{"name":"Ghost"}},{"children":[]},{"role":{"id":1,"name":"Owner"},"permissions":[{"id":9,"name":"all"}]}]"#;
        let nodes: Vec<RawNode> = serde_json::from_str(json).unwrap();

        assert_eq!(nodes.len(), 3);
        assert!(nodes[0].role.as_ref().unwrap().id.is_none());
        assert!(nodes[1].role.is_none());
        assert_eq!(nodes[2].permissions.as_ref().map(Vec::len), Some(1));
    }

    #[test]
    fn tree_node_omits_absent_metadata() {
        let node = TreeNode::new(Role::new(1, "Owner"));
        let value = serde_json::to_value(&node).unwrap();

        assert!(value.get("tree_metadata").is_none());
        assert!(node.is_leaf());
    }
}
