//! Pre-check for edge creation
//!
//! Runs against the edges already cached for the target store, before the
//! request reaches the backend.

use crate::error::EdgeValidationError;
use hierarchy_model::{CreateHierarchyRequest, HierarchyEdge, RoleId};
use std::collections::{HashMap, HashSet};

/// Check that creating `request` keeps the store's hierarchy sane
///
/// Edges belonging to other stores are ignored.
///
/// # Errors
/// - [`EdgeValidationError::SelfReference`] if both roles are the same
/// - [`EdgeValidationError::DuplicateEdge`] if the edge already exists
/// - [`EdgeValidationError::WouldCreateCycle`] if the lower role already
///   outranks the higher role, directly or transitively
pub fn validate_hierarchy_data<'a>(
    request: &CreateHierarchyRequest,
    existing: impl IntoIterator<Item = &'a HierarchyEdge>,
) -> Result<(), EdgeValidationError> {
    let higher = request.higher_role_id;
    let lower = request.lower_role_id;

    if higher == lower {
        return Err(EdgeValidationError::SelfReference { role_id: higher });
    }

    let mut outranks: HashMap<RoleId, Vec<RoleId>> = HashMap::new();
    for edge in existing
        .into_iter()
        .filter(|edge| edge.store_id == request.store_id)
    {
        if edge.connects(higher, lower) {
            return Err(EdgeValidationError::DuplicateEdge {
                higher_role_id: higher,
                lower_role_id: lower,
                store_id: request.store_id,
            });
        }
        outranks
            .entry(edge.higher_role_id)
            .or_default()
            .push(edge.lower_role_id);
    }

    if let Some(mut path) = find_chain(&outranks, lower, higher) {
        path.push(lower);
        return Err(EdgeValidationError::WouldCreateCycle { path });
    }

    Ok(())
}

/// Chain of roles from `from` down to `to`, if `from` outranks `to`
fn find_chain(
    outranks: &HashMap<RoleId, Vec<RoleId>>,
    from: RoleId,
    to: RoleId,
) -> Option<Vec<RoleId>> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    if descend(outranks, from, to, &mut visited, &mut path) {
        Some(path)
    } else {
        None
    }
}

fn descend(
    outranks: &HashMap<RoleId, Vec<RoleId>>,
    current: RoleId,
    target: RoleId,
    visited: &mut HashSet<RoleId>,
    path: &mut Vec<RoleId>,
) -> bool {
    path.push(current);
    if current == target {
        return true;
    }

    if visited.insert(current) {
        for &next in outranks.get(&current).into_iter().flatten() {
            if descend(outranks, next, target, visited, path) {
                return true;
            }
        }
    }

    path.pop();
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn edges() -> Vec<HierarchyEdge> {
        vec![
            HierarchyEdge::new(1, 1, 1, 2),
            HierarchyEdge::new(2, 1, 2, 3),
            HierarchyEdge::new(3, 2, 3, 1),
        ]
    }

    #[test]
    fn accepts_new_edge() {
        let request = CreateHierarchyRequest::new(1, 4, 1);
        assert_eq!(validate_hierarchy_data(&request, &edges()), Ok(()));
    }

    #[test]
    fn rejects_self_reference() {
        let request = CreateHierarchyRequest::new(5, 5, 1);
        assert_eq!(
            validate_hierarchy_data(&request, &edges()),
            Err(EdgeValidationError::SelfReference { role_id: RoleId(5) })
        );
    }

    #[test]
    fn rejects_duplicate_in_same_store() {
        let request = CreateHierarchyRequest::new(2, 3, 1);
        assert!(matches!(
            validate_hierarchy_data(&request, &edges()),
            Err(EdgeValidationError::DuplicateEdge { .. })
        ));
    }

    #[test]
    fn rejects_transitive_cycle() {
        let request = CreateHierarchyRequest::new(3, 1, 1);
        assert_eq!(
            validate_hierarchy_data(&request, &edges()),
            Err(EdgeValidationError::WouldCreateCycle {
                path: vec![RoleId(1), RoleId(2), RoleId(3), RoleId(1)],
            })
        );
    }

    #[test]
    fn ignores_other_stores() {
        // Store 2 has 3 -> 1; store 1 does not, so 3 -> 1 in store 3 is fine
        let request = CreateHierarchyRequest::new(1, 3, 3);
        assert_eq!(validate_hierarchy_data(&request, &edges()), Ok(()));
    }

    #[test]
    fn tolerates_cycles_already_in_cache() {
        let mut cached = edges();
        cached.push(HierarchyEdge::new(4, 1, 3, 2));

        let request = CreateHierarchyRequest::new(5, 6, 1);
        assert_eq!(validate_hierarchy_data(&request, &cached), Ok(()));
    }
}
