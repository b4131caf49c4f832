//! Normalized entity store
//!
//! Roles, permissions and hierarchy edges are stored once, by id, in
//! insertion-ordered maps. Each store id maps to the ordered set of edge ids
//! belonging to it.
//!
//! Invariant: every edge id listed for a store is present in the edge map.
//! All mutations below maintain it; nothing re-checks it.

use hierarchy_model::{EdgeId, HierarchyEdge, Permission, PermissionId, Role, RoleId, StoreId};
use indexmap::{IndexMap, IndexSet};
use std::collections::HashMap;

/// Map-of-maps holding every fetched entity
#[derive(Debug, Clone, Default)]
pub struct NormalizedStore {
    edges: IndexMap<EdgeId, HierarchyEdge>,
    roles: IndexMap<RoleId, Role>,
    permissions: IndexMap<PermissionId, Permission>,
    store_edges: HashMap<StoreId, IndexSet<EdgeId>>,
}

impl NormalizedStore {
    /// Create empty store
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an edge by id and list it under its store
    ///
    /// If an edge with the same id was previously listed under another store,
    /// it is moved.
    pub fn upsert_edge(&mut self, edge: HierarchyEdge) {
        let id = edge.id;
        let store_id = edge.store_id;

        if let Some(previous) = self.edges.insert(id, edge) {
            if previous.store_id != store_id {
                if let Some(list) = self.store_edges.get_mut(&previous.store_id) {
                    list.shift_remove(&id);
                }
            }
        }

        self.store_edges.entry(store_id).or_default().insert(id);
    }

    /// Insert or replace a role by id, along with its embedded permissions
    pub fn upsert_role(&mut self, role: Role) {
        for permission in &role.permissions {
            self.upsert_permission(permission.clone());
        }
        self.roles.insert(role.id, role);
    }

    /// Insert or replace a permission by id
    pub fn upsert_permission(&mut self, permission: Permission) {
        self.permissions.insert(permission.id, permission);
    }

    /// Replace everything known about a store's edges in one step
    ///
    /// The store's edge list is rebuilt from `edges` in order, embedded roles
    /// and permissions are upserted, and edges that were only listed under
    /// this store before are dropped. Returns the number of edges now listed.
    pub fn replace_store_edges(&mut self, store_id: StoreId, edges: Vec<HierarchyEdge>) -> usize {
        let previous = self.store_edges.remove(&store_id).unwrap_or_default();

        let mut listed = IndexSet::with_capacity(edges.len());
        for edge in edges {
            if edge.store_id != store_id {
                tracing::warn!(
                    edge = %edge.id,
                    expected = %store_id,
                    actual = %edge.store_id,
                    "edge reported under a different store"
                );
            }

            for role in edge.embedded_roles() {
                self.upsert_role(role.clone());
            }
            listed.insert(edge.id);
            self.edges.insert(edge.id, edge);
        }

        for stale in previous.difference(&listed) {
            if !self.is_listed_elsewhere(*stale, store_id) {
                self.edges.shift_remove(stale);
            }
        }

        let count = listed.len();
        self.store_edges.insert(store_id, listed);
        tracing::debug!(store = %store_id, edges = count, "replaced store edges");
        count
    }

    fn is_listed_elsewhere(&self, edge_id: EdgeId, except: StoreId) -> bool {
        self.store_edges
            .iter()
            .any(|(store, list)| *store != except && list.contains(&edge_id))
    }

    /// Forget a store's edge list and the edges only it referenced
    pub fn remove_store(&mut self, store_id: StoreId) {
        if let Some(list) = self.store_edges.remove(&store_id) {
            for id in &list {
                if !self.is_listed_elsewhere(*id, store_id) {
                    self.edges.shift_remove(id);
                }
            }
        }
    }

    /// Drop everything
    pub fn clear(&mut self) {
        self.edges.clear();
        self.roles.clear();
        self.permissions.clear();
        self.store_edges.clear();
    }

    /// Edge by id
    #[must_use]
    pub fn edge(&self, id: EdgeId) -> Option<&HierarchyEdge> {
        self.edges.get(&id)
    }

    /// Role by id
    #[must_use]
    pub fn role(&self, id: RoleId) -> Option<&Role> {
        self.roles.get(&id)
    }

    /// Permission by id
    #[must_use]
    pub fn permission(&self, id: PermissionId) -> Option<&Permission> {
        self.permissions.get(&id)
    }

    /// A store's edges, in list order
    #[must_use]
    pub fn store_edges(&self, store_id: StoreId) -> Vec<&HierarchyEdge> {
        self.store_edges
            .get(&store_id)
            .map(|list| list.iter().filter_map(|id| self.edges.get(id)).collect())
            .unwrap_or_default()
    }

    /// Edge ids listed for a store
    #[must_use]
    pub fn store_edge_ids(&self, store_id: StoreId) -> Vec<EdgeId> {
        self.store_edges
            .get(&store_id)
            .map(|list| list.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether any edge list exists for a store
    #[inline]
    #[must_use]
    pub fn has_store(&self, store_id: StoreId) -> bool {
        self.store_edges.contains_key(&store_id)
    }

    /// Stores with an edge list
    pub fn store_ids(&self) -> impl Iterator<Item = StoreId> + '_ {
        self.store_edges.keys().copied()
    }

    /// All roles, in first-seen order
    pub fn roles(&self) -> impl Iterator<Item = &Role> {
        self.roles.values()
    }

    /// Number of edges
    #[inline]
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Number of roles
    #[inline]
    #[must_use]
    pub fn role_count(&self) -> usize {
        self.roles.len()
    }

    /// Number of permissions
    #[inline]
    #[must_use]
    pub fn permission_count(&self) -> usize {
        self.permissions.len()
    }

    /// Number of stores with an edge list
    #[inline]
    #[must_use]
    pub fn store_count(&self) -> usize {
        self.store_edges.len()
    }
}
