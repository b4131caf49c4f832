//! Tree builder
//!
//! Converts the backend's nested response into a [`Forest`] of annotated
//! [`TreeNode`]s. Every node receives its depth (roots are 0), its root-to-node
//! path of role ids, and expansion state: the first [`AUTO_EXPAND_DEPTH`]
//! levels start expanded.
//!
//! A node without a role, or with a role lacking an id, is never silently
//! dereferenced. In [`IngestMode::Strict`] the build fails; in
//! [`IngestMode::Lenient`] the node and its subtree are dropped and reported.

use crate::error::BuildError;
use hierarchy_model::{Forest, RawNode, RawRole, Role, RoleId, TreeMetadata, TreeNode};

/// Levels below this depth start expanded
pub const AUTO_EXPAND_DEPTH: usize = 2;

/// How malformed raw nodes are handled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestMode {
    /// Fail the whole build on the first malformed node
    #[default]
    Strict,

    /// Drop malformed nodes (with their subtrees) and report them
    Lenient,
}

/// Why a raw node was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    /// No role object
    MissingRole,
    /// Role object without an id
    MissingRoleId,
}

/// A raw node dropped during lenient ingestion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedNode {
    /// Role ids of the accepted ancestors
    pub parent_path: Vec<RoleId>,
    /// Position among its siblings in the raw input
    pub index: usize,
    /// Why it was dropped
    pub reason: RejectReason,
    /// Number of raw descendants dropped with it
    pub dropped_descendants: usize,
}

/// Result of a build
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    /// Annotated forest
    pub tree: Forest,
    /// Nodes dropped in lenient mode (always empty in strict mode)
    pub rejected: Vec<RejectedNode>,
}

impl BuildReport {
    /// Whether every raw node made it into the tree
    #[inline]
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.rejected.is_empty()
    }
}

/// Builds annotated trees from raw responses
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeBuilder {
    mode: IngestMode,
}

impl TreeBuilder {
    /// Create strict builder
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create lenient builder
    #[inline]
    #[must_use]
    pub fn lenient() -> Self {
        Self::new().with_mode(IngestMode::Lenient)
    }

    /// With ingestion mode
    #[inline]
    #[must_use]
    pub fn with_mode(mut self, mode: IngestMode) -> Self {
        self.mode = mode;
        self
    }

    /// Ingestion mode in use
    #[inline]
    #[must_use]
    pub fn mode(&self) -> IngestMode {
        self.mode
    }

    /// Build a forest from raw root nodes
    ///
    /// # Errors
    /// In strict mode, returns [`BuildError`] for the first node (in pre-order)
    /// that lacks a role or role id.
    pub fn build(&self, raw: &[RawNode]) -> Result<BuildReport, BuildError> {
        let mut rejected = Vec::new();
        let tree = self.build_level(raw, None, &mut rejected)?;

        if !rejected.is_empty() {
            tracing::warn!(
                rejected = rejected.len(),
                "dropped malformed nodes while building hierarchy tree"
            );
        }

        Ok(BuildReport { tree, rejected })
    }

    fn build_level(
        &self,
        raw: &[RawNode],
        parent: Option<&TreeMetadata>,
        rejected: &mut Vec<RejectedNode>,
    ) -> Result<Vec<TreeNode>, BuildError> {
        let depth = parent.map_or(0, |meta| meta.depth + 1);
        let parent_path: &[RoleId] = match parent {
            Some(meta) => &meta.path,
            None => &[],
        };

        let mut nodes = Vec::with_capacity(raw.len());
        for (index, node) in raw.iter().enumerate() {
            let role = match resolve_role(node.role.as_ref()) {
                Ok(role) => role,
                Err(reason) => match self.mode {
                    IngestMode::Strict => {
                        return Err(reject_error(node, reason, parent_path, index));
                    }
                    IngestMode::Lenient => {
                        tracing::warn!(?reason, index, parent = ?parent_path, "rejecting raw node");
                        rejected.push(RejectedNode {
                            parent_path: parent_path.to_vec(),
                            index,
                            reason,
                            dropped_descendants: count_raw(&node.children),
                        });
                        continue;
                    }
                },
            };

            let mut path = Vec::with_capacity(parent_path.len() + 1);
            path.extend_from_slice(parent_path);
            path.push(role.id);

            let metadata = TreeMetadata {
                depth,
                path,
                is_expanded: depth < AUTO_EXPAND_DEPTH,
                is_selected: false,
                is_loading: false,
                has_error: false,
            };

            let children = self.build_level(&node.children, Some(&metadata), rejected)?;

            nodes.push(TreeNode {
                role,
                children,
                permissions: node.permissions.clone().unwrap_or_default(),
                tree_metadata: Some(metadata),
            });
        }

        Ok(nodes)
    }
}

/// Build a forest in strict mode
///
/// # Errors
/// Returns [`BuildError`] if any node lacks a role or role id.
pub fn build_tree(raw: &[RawNode]) -> Result<Forest, BuildError> {
    TreeBuilder::new().build(raw).map(|report| report.tree)
}

fn resolve_role(raw: Option<&RawRole>) -> Result<Role, RejectReason> {
    let raw = raw.ok_or(RejectReason::MissingRole)?;
    let id = raw.id.ok_or(RejectReason::MissingRoleId)?;

    Ok(Role {
        id,
        name: raw.name.clone().unwrap_or_default(),
        guard_name: raw.guard_name.clone(),
        permissions: Vec::new(),
        attributes: raw.attributes.clone(),
    })
}

fn reject_error(node: &RawNode, reason: RejectReason, parent_path: &[RoleId], index: usize) -> BuildError {
    match reason {
        RejectReason::MissingRole => BuildError::MissingRole {
            parent_path: parent_path.to_vec(),
            index,
        },
        RejectReason::MissingRoleId => BuildError::MissingRoleId {
            parent_path: parent_path.to_vec(),
            index,
            name: node.role.as_ref().and_then(|role| role.name.clone()),
        },
    }
}

fn count_raw(nodes: &[RawNode]) -> usize {
    nodes.iter().map(|node| 1 + count_raw(&node.children)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hierarchy_model::{Permission, RawRole};
    use pretty_assertions::assert_eq;

    fn raw(id: u64, name: &str, children: Vec<RawNode>) -> RawNode {
        RawNode::new(Role::new(id, name)).with_children(children)
    }

    fn nameless(name: &str) -> RawNode {
        RawNode {
            role: Some(RawRole {
                name: Some(name.to_string()),
                ..RawRole::default()
            }),
            ..RawNode::default()
        }
    }

    #[test]
    fn builder_annotates_depth_and_path() {
        let input = vec![raw(1, "Owner", vec![raw(2, "Manager", vec![raw(3, "Clerk", vec![])])])];

        let tree = build_tree(&input).unwrap();

        let owner = tree[0].metadata().unwrap();
        let manager = tree[0].children[0].metadata().unwrap();
        let clerk = tree[0].children[0].children[0].metadata().unwrap();

        assert_eq!(owner.depth, 0);
        assert_eq!(manager.depth, 1);
        assert_eq!(clerk.depth, 2);
        assert_eq!(clerk.path, vec![RoleId(1), RoleId(2), RoleId(3)]);
    }

    #[test]
    fn builder_expands_first_two_levels() {
        let input = vec![raw(1, "Owner", vec![raw(2, "Manager", vec![raw(3, "Clerk", vec![])])])];

        let tree = build_tree(&input).unwrap();

        assert!(tree[0].metadata().unwrap().is_expanded);
        assert!(tree[0].children[0].metadata().unwrap().is_expanded);
        assert!(!tree[0].children[0].children[0].metadata().unwrap().is_expanded);

        let meta = tree[0].metadata().unwrap();
        assert!(!meta.is_selected && !meta.is_loading && !meta.has_error);
    }

    #[test]
    fn builder_copies_permissions_and_defaults_missing() {
        let input = vec![
            RawNode::new(Role::new(1, "Owner")).with_permissions(vec![Permission::new(11, "admin")]),
            RawNode::new(Role::new(2, "Auditor")),
        ];

        let tree = build_tree(&input).unwrap();

        assert_eq!(tree[0].permissions, vec![Permission::new(11, "admin")]);
        assert!(tree[1].permissions.is_empty());
    }

    #[test]
    fn strict_builder_rejects_missing_role() {
        let input = vec![raw(1, "Owner", vec![raw(2, "Manager", vec![]), RawNode::default()])];

        let err = build_tree(&input).unwrap_err();

        assert_eq!(
            err,
            BuildError::MissingRole {
                parent_path: vec![RoleId(1)],
                index: 1,
            }
        );
    }

    #[test]
    fn strict_builder_rejects_missing_role_id() {
        let input = vec![nameless("Ghost")];

        let err = build_tree(&input).unwrap_err();

        assert!(matches!(
            err,
            BuildError::MissingRoleId { ref name, index: 0, .. } if name.as_deref() == Some("Ghost")
        ));
    }

    #[test]
    fn lenient_builder_drops_subtree_and_reports() {
        let mut ghost = nameless("Ghost");
        ghost.children = vec![raw(9, "Orphan", vec![raw(10, "Orphan child", vec![])])];
        let input = vec![raw(1, "Owner", vec![ghost, raw(2, "Manager", vec![])])];

        let report = TreeBuilder::lenient().build(&input).unwrap();

        assert!(!report.is_complete());
        assert_eq!(report.tree[0].children.len(), 1);
        assert_eq!(report.tree[0].children[0].role_id(), RoleId(2));
        assert_eq!(
            report.rejected,
            vec![RejectedNode {
                parent_path: vec![RoleId(1)],
                index: 0,
                reason: RejectReason::MissingRoleId,
                dropped_descendants: 2,
            }]
        );
    }

    #[test]
    fn builder_defaults_missing_name() {
        let input = vec![RawNode {
            role: Some(RawRole {
                id: Some(RoleId(5)),
                ..RawRole::default()
            }),
            ..RawNode::default()
        }];

        let tree = build_tree(&input).unwrap();
        assert_eq!(tree[0].role.name, "");
    }

    #[test]
    fn builder_empty_input() {
        let report = TreeBuilder::new().build(&[]).unwrap();
        assert!(report.tree.is_empty());
        assert!(report.is_complete());
    }
}
