//! Hierarchy Model
//!
//! Entity types shared by the role hierarchy cache.
//!
//! # Overview
//!
//! - **Role / Permission / Store**: records owned by the normalized store
//! - **HierarchyEdge**: "higher role outranks lower role" within one store
//! - **RawNode**: nested tree node exactly as the backend sends it
//! - **TreeNode**: annotated tree node produced by the tree builder
//!
//! # Example
//!
//! ```rust
//! use hierarchy_model::{Permission, Role, RoleId};
//!
//! let role = Role::new(1, "Owner").with_permissions(vec![Permission::new(11, "admin")]);
//! assert_eq!(role.id, RoleId(1));
//! ```

#![warn(missing_docs)]

pub mod entity;
pub mod ids;
pub mod request;
pub mod tree;

// Re-exports
pub use entity::{HierarchyEdge, Permission, Role, Store};
pub use ids::{EdgeId, PermissionId, RoleId, StoreId};
pub use request::{CreateHierarchyRequest, RemoveHierarchyRequest};
pub use tree::{Forest, RawNode, RawRole, TreeMetadata, TreeNode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hierarchy entities
    pub use crate::{
        CreateHierarchyRequest, EdgeId, Forest, HierarchyEdge, Permission, PermissionId, RawNode,
        RawRole, RemoveHierarchyRequest, Role, RoleId, Store, StoreId, TreeMetadata, TreeNode,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
