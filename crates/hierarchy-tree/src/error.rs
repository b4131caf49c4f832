//! Error types for tree ingestion and edge pre-checks

use crate::format_path;
use hierarchy_model::{RoleId, StoreId};

/// Errors raised while ingesting a raw tree in strict mode
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BuildError {
    /// Node has no role object at all
    #[error("node {index} under [{}] has no role", format_path(.parent_path))]
    MissingRole {
        /// Role ids from the root down to the node's parent
        parent_path: Vec<RoleId>,
        /// Position among its siblings
        index: usize,
    },

    /// Node has a role object without an id
    #[error("node {index} under [{}] has a role without an id (name: {name:?})", format_path(.parent_path))]
    MissingRoleId {
        /// Role ids from the root down to the node's parent
        parent_path: Vec<RoleId>,
        /// Position among its siblings
        index: usize,
        /// Role name, if one was sent
        name: Option<String>,
    },
}

impl BuildError {
    /// Position of the offending node: parent path and sibling index
    #[must_use]
    pub fn location(&self) -> (&[RoleId], usize) {
        match self {
            Self::MissingRole { parent_path, index }
            | Self::MissingRoleId {
                parent_path, index, ..
            } => (parent_path.as_slice(), *index),
        }
    }
}

/// Reasons an edge creation request is refused before it is sent
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EdgeValidationError {
    /// Higher and lower role are the same
    #[error("role {role_id} cannot outrank itself")]
    SelfReference {
        /// Role named on both sides
        role_id: RoleId,
    },

    /// The same edge already exists in the store
    #[error("role {higher_role_id} already outranks role {lower_role_id} in store {store_id}")]
    DuplicateEdge {
        /// Outranking role
        higher_role_id: RoleId,
        /// Outranked role
        lower_role_id: RoleId,
        /// Store already holding the edge
        store_id: StoreId,
    },

    /// The lower role already outranks the higher role
    #[error("edge would create a cycle: {}", format_path(.path))]
    WouldCreateCycle {
        /// Closed chain of roles the new edge would complete
        path: Vec<RoleId>,
    },
}
