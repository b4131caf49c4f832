//! Structural validation of a built tree
//!
//! Findings are returned as data, never raised. Only errors affect
//! [`HierarchyReport::is_valid`]; warnings and suggestions are advisory.
//!
//! Cycle detection is path-local: a role id repeating along one root-to-leaf
//! path is a [`HierarchyError::CircularReference`]. A role reachable through
//! two different branches is a legitimate tree shape for this check and is
//! reported as [`HierarchyWarning::RepeatedAcrossBranches`] instead.

use crate::format_path;
use hierarchy_model::{RoleId, TreeNode};
use serde::Serialize;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Nesting deeper than this draws a warning
pub const MAX_RECOMMENDED_DEPTH: usize = 10;

/// Structural errors
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyError {
    /// Role id appears twice on one path
    #[error("circular reference: role {role_id} repeats along {}", format_path(.path))]
    CircularReference {
        /// Repeated role
        role_id: RoleId,
        /// Path from the root up to the repeat
        path: Vec<RoleId>,
    },
}

/// Advisory findings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchyWarning {
    /// Node nested deeper than [`MAX_RECOMMENDED_DEPTH`]
    ExcessiveDepth {
        /// Offending role
        role_id: RoleId,
        /// Its display name
        role_name: String,
        /// Depth it sits at
        depth: usize,
    },

    /// Role carries no permissions
    NoPermissions {
        /// Offending role
        role_id: RoleId,
        /// Its display name
        role_name: String,
    },

    /// Role appears under more than one branch
    RepeatedAcrossBranches {
        /// Repeated role
        role_id: RoleId,
        /// Its display name
        role_name: String,
        /// Number of branches it appears under
        occurrences: usize,
    },
}

impl fmt::Display for HierarchyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExcessiveDepth {
                role_id,
                role_name,
                depth,
            } => write!(
                f,
                "role '{role_name}' ({role_id}) is nested {depth} levels deep (max {MAX_RECOMMENDED_DEPTH})"
            ),
            Self::NoPermissions { role_id, role_name } => {
                write!(f, "role '{role_name}' ({role_id}) has no permissions")
            }
            Self::RepeatedAcrossBranches {
                role_id,
                role_name,
                occurrences,
            } => write!(
                f,
                "role '{role_name}' ({role_id}) appears in {occurrences} branches"
            ),
        }
    }
}

/// Improvement hints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum HierarchySuggestion {
    /// Top-level role with nothing beneath it
    NoSubordinates {
        /// Root role
        role_id: RoleId,
        /// Its display name
        role_name: String,
    },
}

impl fmt::Display for HierarchySuggestion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSubordinates { role_id, role_name } => {
                write!(f, "role '{role_name}' ({role_id}) has no subordinates")
            }
        }
    }
}

/// Outcome of [`validate_hierarchy`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HierarchyReport {
    /// No errors were found
    pub is_valid: bool,
    /// Structural defects
    pub errors: Vec<HierarchyError>,
    /// Suspicious but allowed shapes
    pub warnings: Vec<HierarchyWarning>,
    /// Optional improvements
    pub suggestions: Vec<HierarchySuggestion>,
}

impl HierarchyReport {
    /// Total number of findings of any severity
    #[must_use]
    pub fn finding_count(&self) -> usize {
        self.errors.len() + self.warnings.len() + self.suggestions.len()
    }
}

/// Validate a forest's structure
#[must_use]
pub fn validate_hierarchy(tree: &[TreeNode]) -> HierarchyReport {
    let mut walker = Walker::default();
    for root in tree {
        walker.visit(root, 0);
    }
    walker.finish()
}

#[derive(Default)]
struct Walker {
    on_path: HashSet<RoleId>,
    path: Vec<RoleId>,
    occurrences: BTreeMap<RoleId, (String, usize)>,
    errors: Vec<HierarchyError>,
    warnings: Vec<HierarchyWarning>,
    suggestions: Vec<HierarchySuggestion>,
}

impl Walker {
    fn visit(&mut self, node: &TreeNode, depth: usize) {
        let role_id = node.role.id;

        if self.on_path.contains(&role_id) {
            let mut path = self.path.clone();
            path.push(role_id);
            self.errors
                .push(HierarchyError::CircularReference { role_id, path });
            return;
        }

        self.occurrences
            .entry(role_id)
            .or_insert_with(|| (node.role.name.clone(), 0))
            .1 += 1;

        if depth > MAX_RECOMMENDED_DEPTH {
            self.warnings.push(HierarchyWarning::ExcessiveDepth {
                role_id,
                role_name: node.role.name.clone(),
                depth,
            });
        }

        if node.permissions.is_empty() {
            self.warnings.push(HierarchyWarning::NoPermissions {
                role_id,
                role_name: node.role.name.clone(),
            });
        }

        if depth == 0 && node.children.is_empty() {
            self.suggestions.push(HierarchySuggestion::NoSubordinates {
                role_id,
                role_name: node.role.name.clone(),
            });
        }

        self.on_path.insert(role_id);
        self.path.push(role_id);
        for child in &node.children {
            self.visit(child, depth + 1);
        }
        self.path.pop();
        self.on_path.remove(&role_id);
    }

    fn finish(mut self) -> HierarchyReport {
        for (role_id, (role_name, occurrences)) in self.occurrences {
            if occurrences > 1 {
                self.warnings.push(HierarchyWarning::RepeatedAcrossBranches {
                    role_id,
                    role_name,
                    occurrences,
                });
            }
        }

        HierarchyReport {
            is_valid: self.errors.is_empty(),
            errors: self.errors,
            warnings: self.warnings,
            suggestions: self.suggestions,
        }
    }
}
