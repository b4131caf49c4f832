//! Read-only tree queries
//!
//! All traversals are pre-order and respect sibling order, so "first match"
//! always means the first node a depth-first walk reaches.

use hierarchy_model::{Permission, RoleId, TreeNode};
use std::collections::HashSet;

/// Pre-order iterator yielding each node with its depth
#[derive(Debug, Clone)]
pub struct PreOrder<'a> {
    stack: Vec<(&'a TreeNode, usize)>,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = (&'a TreeNode, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        self.stack
            .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        Some((node, depth))
    }
}

/// Walk every node of a forest in pre-order
#[must_use]
pub fn walk(tree: &[TreeNode]) -> PreOrder<'_> {
    PreOrder {
        stack: tree.iter().rev().map(|root| (root, 0)).collect(),
    }
}

/// Find the first node (pre-order) whose role has `role_id`
#[must_use]
pub fn find_node_by_role_id(tree: &[TreeNode], role_id: RoleId) -> Option<&TreeNode> {
    walk(tree)
        .map(|(node, _)| node)
        .find(|node| node.role.id == role_id)
}

/// Nodes from a root down to the first node with `role_id`, inclusive
///
/// Returns an empty vector if the role is not in the tree.
#[must_use]
pub fn path_to_role(tree: &[TreeNode], role_id: RoleId) -> Vec<&TreeNode> {
    let mut path = Vec::new();
    if collect_path(tree, role_id, &mut path) {
        path
    } else {
        Vec::new()
    }
}

fn collect_path<'a>(nodes: &'a [TreeNode], role_id: RoleId, path: &mut Vec<&'a TreeNode>) -> bool {
    for node in nodes {
        path.push(node);
        if node.role.id == role_id || collect_path(&node.children, role_id, path) {
            return true;
        }
        path.pop();
    }
    false
}

/// Options for [`aggregated_permissions`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Add every ancestor's permissions after the node's own
    pub include_inherited: bool,
    /// Keep only permissions with this guard name
    pub guard_filter: Option<String>,
    /// Drop permissions whose id was already seen (first occurrence wins)
    pub deduplicate: bool,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            include_inherited: true,
            guard_filter: None,
            deduplicate: true,
        }
    }
}

impl AggregateOptions {
    /// Own permissions only
    #[inline]
    #[must_use]
    pub fn own_only() -> Self {
        Self {
            include_inherited: false,
            ..Self::default()
        }
    }

    /// With inheritance toggled
    #[inline]
    #[must_use]
    pub fn with_inherited(mut self, include: bool) -> Self {
        self.include_inherited = include;
        self
    }

    /// With guard filter
    #[inline]
    #[must_use]
    pub fn with_guard(mut self, guard: impl Into<String>) -> Self {
        self.guard_filter = Some(guard.into());
        self
    }

    /// With de-duplication toggled
    #[inline]
    #[must_use]
    pub fn with_deduplicate(mut self, deduplicate: bool) -> Self {
        self.deduplicate = deduplicate;
        self
    }
}

/// Permissions effective for a role
///
/// The node's own permissions come first, followed by each ancestor's from
/// the root downwards. Since own permissions are added first, de-duplication
/// keeps the node's copy over an inherited one with the same id.
#[must_use]
pub fn aggregated_permissions(
    tree: &[TreeNode],
    role_id: RoleId,
    options: &AggregateOptions,
) -> Vec<Permission> {
    let path = path_to_role(tree, role_id);
    let Some((target, ancestors)) = path.split_last() else {
        return Vec::new();
    };

    let mut permissions = target.permissions.clone();
    if options.include_inherited {
        for ancestor in ancestors {
            permissions.extend(ancestor.permissions.iter().cloned());
        }
    }

    if let Some(guard) = options.guard_filter.as_deref() {
        permissions.retain(|permission| permission.guard_name.as_deref() == Some(guard));
    }

    if options.deduplicate {
        let mut seen = HashSet::with_capacity(permissions.len());
        permissions.retain(|permission| seen.insert(permission.id));
    }

    permissions
}

/// Search filter; omitted fields match every node
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    /// Exact role id
    pub role_id: Option<RoleId>,
    /// Case-insensitive substring of the role name
    pub role_name: Option<String>,
    /// Case-insensitive substring of any permission name
    pub permission_name: Option<String>,
}

impl SearchCriteria {
    /// Create empty criteria (matches everything)
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With role id
    #[inline]
    #[must_use]
    pub fn with_role_id(mut self, role_id: impl Into<RoleId>) -> Self {
        self.role_id = Some(role_id.into());
        self
    }

    /// With role name fragment
    #[inline]
    #[must_use]
    pub fn with_role_name(mut self, name: impl Into<String>) -> Self {
        self.role_name = Some(name.into());
        self
    }

    /// With permission name fragment
    #[inline]
    #[must_use]
    pub fn with_permission_name(mut self, name: impl Into<String>) -> Self {
        self.permission_name = Some(name.into());
        self
    }

    /// Whether a node satisfies every supplied criterion
    #[must_use]
    pub fn matches(&self, node: &TreeNode) -> bool {
        if self.role_id.is_some_and(|id| id != node.role.id) {
            return false;
        }

        if let Some(fragment) = &self.role_name {
            if !contains_ignore_case(&node.role.name, fragment) {
                return false;
            }
        }

        if let Some(fragment) = &self.permission_name {
            if !node
                .permissions
                .iter()
                .any(|permission| contains_ignore_case(&permission.name, fragment))
            {
                return false;
            }
        }

        true
    }
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Every node (pre-order) matching all criteria
#[must_use]
pub fn search_tree<'a>(tree: &'a [TreeNode], criteria: &SearchCriteria) -> Vec<&'a TreeNode> {
    walk(tree)
        .map(|(node, _)| node)
        .filter(|node| criteria.matches(node))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build_tree;
    use hierarchy_model::{RawNode, Role};
    use pretty_assertions::assert_eq;

    fn node(id: u64, name: &str, permissions: Vec<Permission>, children: Vec<RawNode>) -> RawNode {
        RawNode::new(Role::new(id, name))
            .with_permissions(permissions)
            .with_children(children)
    }

    /// Owner(1) -> [Manager(2) -> [Clerk(3)], Buyer(4)], Auditor(5)
    fn store_tree() -> Vec<TreeNode> {
        build_tree(&[
            node(
                1,
                "Owner",
                vec![Permission::new(11, "admin").with_guard("web")],
                vec![
                    node(
                        2,
                        "Manager",
                        vec![Permission::new(10, "edit").with_guard("web")],
                        vec![node(
                            3,
                            "Clerk",
                            vec![
                                Permission::new(12, "view").with_guard("api"),
                                Permission::new(10, "edit").with_guard("web"),
                            ],
                            vec![],
                        )],
                    ),
                    node(4, "Buyer", vec![Permission::new(13, "purchase")], vec![]),
                ],
            ),
            node(5, "Auditor", vec![], vec![]),
        ])
        .unwrap()
    }

    fn ids<'a>(nodes: impl IntoIterator<Item = &'a TreeNode>) -> Vec<u64> {
        nodes.into_iter().map(|n| n.role.id.get()).collect()
    }

    fn permission_ids(permissions: &[Permission]) -> Vec<u64> {
        permissions.iter().map(|p| p.id.get()).collect()
    }

    #[test]
    fn walk_is_pre_order() {
        let tree = store_tree();
        let order: Vec<(u64, usize)> = walk(&tree).map(|(n, d)| (n.role.id.get(), d)).collect();
        assert_eq!(order, vec![(1, 0), (2, 1), (3, 2), (4, 1), (5, 0)]);
    }

    #[test]
    fn find_returns_first_match() {
        let tree = store_tree();
        assert_eq!(find_node_by_role_id(&tree, RoleId(4)).unwrap().role.name, "Buyer");
        assert!(find_node_by_role_id(&tree, RoleId(99)).is_none());
    }

    #[test]
    fn find_prefers_pre_order_on_duplicates() {
        let tree = build_tree(&[
            node(1, "A", vec![], vec![node(7, "deep", vec![], vec![])]),
            node(7, "shallow", vec![], vec![]),
        ])
        .unwrap();

        assert_eq!(find_node_by_role_id(&tree, RoleId(7)).unwrap().role.name, "deep");
    }

    #[test]
    fn path_runs_root_to_target() {
        let tree = store_tree();
        assert_eq!(ids(path_to_role(&tree, RoleId(3))), vec![1, 2, 3]);
        assert_eq!(ids(path_to_role(&tree, RoleId(5))), vec![5]);
        assert!(path_to_role(&tree, RoleId(42)).is_empty());
    }

    #[test]
    fn aggregated_permissions_own_then_ancestors() {
        let tree = store_tree();
        let options = AggregateOptions::default().with_deduplicate(false);

        // Clerk's own [12, 10], then ancestors root first: Owner [11], Manager [10]
        let permissions = aggregated_permissions(&tree, RoleId(3), &options);
        assert_eq!(permission_ids(&permissions), vec![12, 10, 11, 10]);
    }

    #[test]
    fn aggregated_permissions_deduplicates_keeping_own_copy() {
        let tree = store_tree();

        let permissions = aggregated_permissions(&tree, RoleId(3), &AggregateOptions::default());
        assert_eq!(permission_ids(&permissions), vec![12, 10, 11]);
    }

    #[test]
    fn aggregated_permissions_own_only() {
        let tree = store_tree();

        let permissions = aggregated_permissions(&tree, RoleId(2), &AggregateOptions::own_only());
        assert_eq!(permission_ids(&permissions), vec![10]);
    }

    #[test]
    fn aggregated_permissions_guard_filter() {
        let tree = store_tree();
        let options = AggregateOptions::default().with_guard("web");

        let permissions = aggregated_permissions(&tree, RoleId(3), &options);
        assert_eq!(permission_ids(&permissions), vec![10, 11]);
    }

    #[test]
    fn aggregated_permissions_unknown_role_is_empty() {
        let tree = store_tree();
        assert!(aggregated_permissions(&tree, RoleId(99), &AggregateOptions::default()).is_empty());
    }

    #[test]
    fn search_combines_criteria() {
        let tree = store_tree();

        let by_name = search_tree(&tree, &SearchCriteria::new().with_role_name("ER"));
        assert_eq!(ids(by_name), vec![1, 2, 3, 4]);

        let by_permission = search_tree(&tree, &SearchCriteria::new().with_permission_name("Edit"));
        assert_eq!(ids(by_permission), vec![2, 3]);

        let both = search_tree(
            &tree,
            &SearchCriteria::new()
                .with_role_name("clerk")
                .with_permission_name("edit"),
        );
        assert_eq!(ids(both), vec![3]);

        let by_id = search_tree(&tree, &SearchCriteria::new().with_role_id(5u64));
        assert_eq!(ids(by_id), vec![5]);
    }

    #[test]
    fn search_without_criteria_returns_every_node() {
        let tree = store_tree();
        assert_eq!(search_tree(&tree, &SearchCriteria::new()).len(), 5);
    }

    #[test]
    fn search_permission_criterion_skips_roles_without_permissions() {
        let tree = store_tree();
        let found = search_tree(&tree, &SearchCriteria::new().with_permission_name(""));
        assert_eq!(ids(found), vec![1, 2, 3, 4]);
    }
}
