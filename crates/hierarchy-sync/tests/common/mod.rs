//! Scripted backend for orchestrator tests

#![allow(dead_code)]

use async_trait::async_trait;
use hierarchy_model::{
    CreateHierarchyRequest, HierarchyEdge, RawNode, RemoveHierarchyRequest, StoreId,
};
use hierarchy_sync::{ApiError, HierarchyApi};
use parking_lot::Mutex;
use std::collections::VecDeque;
use tokio::sync::oneshot;

type Reply<T> = oneshot::Receiver<Result<T, ApiError>>;

/// Gate for a reply that is released by the test
pub type Gate<T> = oneshot::Sender<Result<T, ApiError>>;

/// Backend call as observed by the fake
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    FetchHierarchies(StoreId),
    FetchTree(StoreId),
    Create(StoreId),
    Remove(StoreId),
}

/// Backend answering from per-endpoint queues, in call order
#[derive(Debug, Default)]
pub struct ScriptedApi {
    edges: Mutex<VecDeque<Reply<Vec<HierarchyEdge>>>>,
    trees: Mutex<VecDeque<Reply<Vec<RawNode>>>>,
    creates: Mutex<VecDeque<Result<HierarchyEdge, ApiError>>>,
    removes: Mutex<VecDeque<Result<(), ApiError>>>,
    calls: Mutex<Vec<Call>>,
}

fn ready<T>(reply: Result<T, ApiError>) -> Reply<T> {
    let (tx, rx) = oneshot::channel();
    let _ = tx.send(reply);
    rx
}

async fn answer<T>(reply: Option<Reply<T>>) -> Result<T, ApiError> {
    match reply {
        Some(rx) => rx
            .await
            .unwrap_or_else(|_| Err(ApiError::transport("gate dropped"))),
        None => Err(ApiError::Decode("no scripted reply".to_string())),
    }
}

impl ScriptedApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_edges(&self, reply: Result<Vec<HierarchyEdge>, ApiError>) {
        self.edges.lock().push_back(ready(reply));
    }

    pub fn gate_edges(&self) -> Gate<Vec<HierarchyEdge>> {
        let (tx, rx) = oneshot::channel();
        self.edges.lock().push_back(rx);
        tx
    }

    pub fn push_tree(&self, reply: Result<Vec<RawNode>, ApiError>) {
        self.trees.lock().push_back(ready(reply));
    }

    pub fn gate_tree(&self) -> Gate<Vec<RawNode>> {
        let (tx, rx) = oneshot::channel();
        self.trees.lock().push_back(rx);
        tx
    }

    pub fn push_create(&self, reply: Result<HierarchyEdge, ApiError>) {
        self.creates.lock().push_back(reply);
    }

    pub fn push_remove(&self, reply: Result<(), ApiError>) {
        self.removes.lock().push_back(reply);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push(call);
    }
}

#[async_trait]
impl HierarchyApi for ScriptedApi {
    async fn fetch_hierarchies(&self, store_id: StoreId) -> Result<Vec<HierarchyEdge>, ApiError> {
        self.record(Call::FetchHierarchies(store_id));
        let reply = self.edges.lock().pop_front();
        answer(reply).await
    }

    async fn fetch_tree(&self, store_id: StoreId) -> Result<Vec<RawNode>, ApiError> {
        self.record(Call::FetchTree(store_id));
        let reply = self.trees.lock().pop_front();
        answer(reply).await
    }

    async fn create_hierarchy(&self, request: &CreateHierarchyRequest) -> Result<HierarchyEdge, ApiError> {
        self.record(Call::Create(request.store_id));
        let reply = self.creates.lock().pop_front();
        reply.unwrap_or_else(|| Err(ApiError::Decode("no scripted reply".to_string())))
    }

    async fn remove_hierarchy(&self, request: &RemoveHierarchyRequest) -> Result<(), ApiError> {
        self.record(Call::Remove(request.store_id));
        let reply = self.removes.lock().pop_front();
        reply.unwrap_or_else(|| Err(ApiError::Decode("no scripted reply".to_string())))
    }
}

pub fn server_error() -> ApiError {
    ApiError::Server {
        status: 503,
        message: "unavailable".to_string(),
    }
}

/// Yield until the fake has seen `n` calls matching `predicate`
pub async fn wait_for_calls(api: &ScriptedApi, n: usize, predicate: impl Fn(&Call) -> bool) {
    while api.count(&predicate) < n {
        tokio::task::yield_now().await;
    }
}
