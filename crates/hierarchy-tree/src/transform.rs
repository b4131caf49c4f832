//! Filtered copies, flattening and summary statistics

use crate::query::walk;
use hierarchy_model::{Forest, Permission, Role, RoleId, TreeNode};
use serde::Serialize;

/// Breadcrumb separator used by [`flatten_tree`]
pub const BREADCRUMB_SEPARATOR: &str = " > ";

/// Options for [`transform_tree`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformOptions {
    /// Nodes at this depth are kept but lose their children
    pub max_depth: Option<usize>,
    /// Keep node permissions
    pub include_permissions: bool,
    /// Keep traversal metadata
    pub include_metadata: bool,
}

impl Default for TransformOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            include_permissions: true,
            include_metadata: true,
        }
    }
}

impl TransformOptions {
    /// With depth limit
    #[inline]
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    /// With permissions toggled
    #[inline]
    #[must_use]
    pub fn with_permissions(mut self, include: bool) -> Self {
        self.include_permissions = include;
        self
    }

    /// With metadata toggled
    #[inline]
    #[must_use]
    pub fn with_metadata(mut self, include: bool) -> Self {
        self.include_metadata = include;
        self
    }
}

/// Produce a filtered copy of a forest
#[must_use]
pub fn transform_tree(tree: &[TreeNode], options: &TransformOptions) -> Forest {
    tree.iter()
        .map(|node| transform_node(node, 0, options))
        .collect()
}

fn transform_node(node: &TreeNode, depth: usize, options: &TransformOptions) -> TreeNode {
    let children = match options.max_depth {
        Some(max) if depth >= max => Vec::new(),
        _ => node
            .children
            .iter()
            .map(|child| transform_node(child, depth + 1, options))
            .collect(),
    };

    TreeNode {
        role: node.role.clone(),
        children,
        permissions: if options.include_permissions {
            node.permissions.clone()
        } else {
            Vec::new()
        },
        tree_metadata: if options.include_metadata {
            node.tree_metadata.clone()
        } else {
            None
        },
    }
}

/// One row of a flattened tree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlatNode {
    /// Role at this row
    pub role: Role,
    /// Permissions granted directly
    pub permissions: Vec<Permission>,
    /// Distance from the root
    pub depth: usize,
    /// Role ids from the root, inclusive
    pub path: Vec<RoleId>,
    /// Parent role, `None` for roots
    pub parent_id: Option<RoleId>,
    /// Whether the node has subordinates
    pub has_children: bool,
    /// Ancestor and own role names joined with `" > "`
    pub flat_path: String,
}

/// Flatten a forest in pre-order, attaching breadcrumbs
#[must_use]
pub fn flatten_tree(tree: &[TreeNode]) -> Vec<FlatNode> {
    let mut rows = Vec::new();
    let mut ids = Vec::new();
    let mut names = Vec::new();
    for root in tree {
        flatten_into(root, &mut ids, &mut names, &mut rows);
    }
    rows
}

fn flatten_into<'a>(
    node: &'a TreeNode,
    ids: &mut Vec<RoleId>,
    names: &mut Vec<&'a str>,
    rows: &mut Vec<FlatNode>,
) {
    let parent_id = ids.last().copied();
    ids.push(node.role.id);
    names.push(&node.role.name);

    rows.push(FlatNode {
        role: node.role.clone(),
        permissions: node.permissions.clone(),
        depth: ids.len() - 1,
        path: ids.clone(),
        parent_id,
        has_children: !node.children.is_empty(),
        flat_path: names.join(BREADCRUMB_SEPARATOR),
    });

    for child in &node.children {
        flatten_into(child, ids, names, rows);
    }

    ids.pop();
    names.pop();
}

/// Shape summary of a forest
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TreeStats {
    /// Total nodes
    pub node_count: usize,
    /// Top-level nodes
    pub root_count: usize,
    /// Nodes without children
    pub leaf_count: usize,
    /// Deepest depth reached (0 for an empty forest)
    pub max_depth: usize,
}

/// Count nodes, roots and leaves and find the deepest level
#[must_use]
pub fn tree_stats(tree: &[TreeNode]) -> TreeStats {
    walk(tree).fold(
        TreeStats {
            root_count: tree.len(),
            ..TreeStats::default()
        },
        |mut stats, (node, depth)| {
            stats.node_count += 1;
            stats.max_depth = stats.max_depth.max(depth);
            if node.is_leaf() {
                stats.leaf_count += 1;
            }
            stats
        },
    )
}
