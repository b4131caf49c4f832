//! Testing utilities for the hierarchy workspace
//!
//! Shared fixtures, raw-tree builders and proptest strategies.

#![allow(missing_docs)]

use hierarchy_model::{HierarchyEdge, Permission, RawNode, Role, StoreId};
use proptest::prelude::*;

pub fn role(id: u64, name: &str) -> Role {
    Role::new(id, name)
}

pub fn permission(id: u64, name: &str) -> Permission {
    Permission::new(id, name)
}

pub fn raw_node(id: u64, name: &str, permissions: Vec<Permission>, children: Vec<RawNode>) -> RawNode {
    RawNode::new(role(id, name))
        .with_permissions(permissions)
        .with_children(children)
}

/// Owner(1, admin) -> Manager(2, edit)
pub fn owner_manager_raw() -> Vec<RawNode> {
    vec![raw_node(
        1,
        "Owner",
        vec![permission(11, "admin")],
        vec![raw_node(2, "Manager", vec![permission(10, "edit")], vec![])],
    )]
}

/// Same tree as [`owner_manager_raw`], in the backend's JSON shape
pub fn owner_manager_json() -> serde_json::Value {
    serde_json::json!([
        {
            "role": {"id": 1, "name": "Owner"},
            "children": [
                {
                    "role": {"id": 2, "name": "Manager"},
                    "children": [],
                    "permissions": [{"id": 10, "name": "edit"}]
                }
            ],
            "permissions": [{"id": 11, "name": "admin"}]
        }
    ])
}

/// A small retail store:
///
/// ```text
/// Owner(1)
/// ├── Store Manager(2)
/// │   ├── Shift Lead(3)
/// │   │   └── Cashier(5)
/// │   └── Stock Lead(4)
/// └── HR(6)
/// Regional Auditor(7)
/// ```
pub fn retail_raw() -> Vec<RawNode> {
    vec![
        raw_node(
            1,
            "Owner",
            vec![permission(100, "manage_store").with_guard("web")],
            vec![
                raw_node(
                    2,
                    "Store Manager",
                    vec![
                        permission(101, "edit_schedule").with_guard("web"),
                        permission(102, "view_reports").with_guard("api"),
                    ],
                    vec![
                        raw_node(
                            3,
                            "Shift Lead",
                            vec![permission(103, "approve_swaps").with_guard("web")],
                            vec![raw_node(
                                5,
                                "Cashier",
                                vec![
                                    permission(104, "open_register").with_guard("pos"),
                                    permission(101, "edit_schedule").with_guard("web"),
                                ],
                                vec![],
                            )],
                        ),
                        raw_node(4, "Stock Lead", vec![permission(105, "receive_stock")], vec![]),
                    ],
                ),
                raw_node(6, "HR", vec![permission(106, "edit_employees").with_guard("web")], vec![]),
            ],
        ),
        raw_node(7, "Regional Auditor", vec![], vec![]),
    ]
}

/// Edges matching [`retail_raw`] for `store`, ids starting at `first_id`
pub fn retail_edges(store: u64, first_id: u64) -> Vec<HierarchyEdge> {
    [(1, 2), (2, 3), (3, 5), (2, 4), (1, 6)]
        .into_iter()
        .enumerate()
        .map(|(offset, (higher, lower))| {
            HierarchyEdge::new(first_id + offset as u64, StoreId(store), higher, lower)
        })
        .collect()
}

/// Edge with embedded role records
pub fn edge_with_roles(id: u64, store: u64, higher: Role, lower: Role) -> HierarchyEdge {
    HierarchyEdge::new(id, store, higher.id, lower.id).with_roles(higher, lower)
}

/// Strategy for raw forests with unique role ids assigned in pre-order
///
/// Produces up to `max_roots` roots and at most `depth` levels.
pub fn arb_raw_forest(depth: u32, max_roots: usize) -> impl Strategy<Value = Vec<RawNode>> {
    let leaf = Just(RawNode::default()).boxed();
    let shape = leaf.prop_recursive(depth, 64, 4, |inner| {
        prop::collection::vec(inner, 0..4)
            .prop_map(|children| RawNode::default().with_children(children))
    });

    prop::collection::vec(shape, 0..=max_roots).prop_map(|mut roots| {
        let mut next = 1;
        for root in &mut roots {
            assign_ids(root, &mut next);
        }
        roots
    })
}

fn assign_ids(node: &mut RawNode, next: &mut u64) {
    let id = *next;
    *next += 1;
    *node = RawNode::new(role(id, &format!("role-{id}")))
        .with_permissions(vec![permission(id % 5, &format!("perm-{}", id % 5))])
        .with_children(std::mem::take(&mut node.children));
    for child in &mut node.children {
        assign_ids(child, next);
    }
}
