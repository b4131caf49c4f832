//! Hierarchy Tree
//!
//! Builds annotated role trees from raw backend responses and answers
//! read-only questions about them.
//!
//! # Overview
//!
//! - **TreeBuilder**: raw nested nodes → [`TreeNode`] forest with depth, path
//!   and expansion metadata
//! - **Queries**: lookup, root-to-node path, permission aggregation, search
//! - **Validation**: structural findings (cycles, nesting, empty roles) and
//!   the pre-check run before creating an edge
//! - **Transform**: depth-limited copies, flattening with breadcrumbs, stats
//!
//! None of the query functions mutate the tree, and none of them fail on
//! missing data: an unknown role id yields `None` or an empty list.
//!
//! # Example
//!
//! ```rust
//! use hierarchy_model::{Permission, RawNode, Role, RoleId};
//! use hierarchy_tree::{aggregated_permissions, build_tree, AggregateOptions};
//!
//! let raw = vec![RawNode::new(Role::new(1, "Owner"))
//!     .with_permissions(vec![Permission::new(11, "admin")])
//!     .with_children(vec![RawNode::new(Role::new(2, "Manager"))
//!         .with_permissions(vec![Permission::new(10, "edit")])])];
//!
//! let tree = build_tree(&raw).unwrap();
//! let names: Vec<_> = aggregated_permissions(&tree, RoleId(2), &AggregateOptions::default())
//!     .into_iter()
//!     .map(|p| p.name)
//!     .collect();
//! assert_eq!(names, ["edit", "admin"]);
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod edges;
pub mod error;
pub mod query;
pub mod transform;
pub mod validation;

// Re-exports
pub use builder::{build_tree, BuildReport, IngestMode, RejectReason, RejectedNode, TreeBuilder};
pub use edges::validate_hierarchy_data;
pub use error::{BuildError, EdgeValidationError};
pub use query::{
    aggregated_permissions, find_node_by_role_id, path_to_role, search_tree, walk,
    AggregateOptions, PreOrder, SearchCriteria,
};
pub use transform::{flatten_tree, transform_tree, tree_stats, FlatNode, TransformOptions, TreeStats};
pub use validation::{
    validate_hierarchy, HierarchyError, HierarchyReport, HierarchySuggestion, HierarchyWarning,
    MAX_RECOMMENDED_DEPTH,
};

pub use hierarchy_model::{Forest, TreeNode};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for tree operations
    pub use crate::{
        aggregated_permissions, build_tree, find_node_by_role_id, flatten_tree, path_to_role,
        search_tree, transform_tree, validate_hierarchy, AggregateOptions, HierarchyReport,
        SearchCriteria, TransformOptions, TreeBuilder,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub(crate) fn format_path(path: &[hierarchy_model::RoleId]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
