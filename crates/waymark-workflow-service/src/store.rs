//! Workflow storage gateway
//!
//! [`GraphStore`] is the boundary between the graph model and whatever
//! persists it. Saves are compare-and-swap on the graph version: a save
//! names the version it was based on and succeeds only if that is still
//! the stored version.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use workflow_graph::WorkflowGraph;

use crate::error::{Result, WorkflowServiceError};

/// Identifier of a stored workflow
pub type WorkflowId = String;

/// Listing entry for a stored workflow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowSummary {
    pub id: WorkflowId,
    pub version: u64,
    pub node_count: usize,
    pub edge_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A workflow as persisted: the graph plus bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredWorkflow {
    pub id: WorkflowId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub graph: WorkflowGraph,
}

impl StoredWorkflow {
    pub(crate) fn new(id: WorkflowId, graph: WorkflowGraph) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            graph,
        }
    }

    pub fn summary(&self) -> WorkflowSummary {
        WorkflowSummary {
            id: self.id.clone(),
            version: self.graph.version(),
            node_count: self.graph.nodes().len(),
            edge_count: self.graph.edges().len(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }

    /// Replace the graph if `expected` is still the stored version
    ///
    /// Returns the new version, always `expected + 1`.
    pub(crate) fn commit(&mut self, graph: &WorkflowGraph, expected: u64) -> Result<u64> {
        let actual = self.graph.version();
        if actual != expected {
            log::warn!(
                "Version conflict on workflow '{}': expected v{}, stored v{}",
                self.id,
                expected,
                actual
            );
            return Err(WorkflowServiceError::VersionConflict {
                workflow_id: self.id.clone(),
                expected,
                actual,
            });
        }

        let version = expected + 1;
        let mut committed = graph.clone();
        committed.set_committed_version(version);
        self.graph = committed;
        self.updated_at = Utc::now();
        Ok(version)
    }
}

/// Persistence boundary for workflow graphs
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Store a new workflow at the graph's current version
    async fn create(&self, graph: &WorkflowGraph) -> Result<WorkflowId>;

    /// Fetch a workflow; the graph carries its stored version
    async fn load(&self, id: &str) -> Result<WorkflowGraph>;

    /// Replace a workflow if it is still at `expected_version`
    ///
    /// On success the stored version is `expected_version + 1`, which is
    /// returned. On failure nothing stored changes.
    async fn save(&self, id: &str, graph: &WorkflowGraph, expected_version: u64) -> Result<u64>;

    async fn delete(&self, id: &str) -> Result<()>;

    /// Summaries of every stored workflow, ordered by id
    async fn list(&self) -> Result<Vec<WorkflowSummary>>;
}

/// Process-memory store
#[derive(Default)]
pub struct InMemoryGraphStore {
    workflows: RwLock<HashMap<WorkflowId, StoredWorkflow>>,
}

impl InMemoryGraphStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl GraphStore for InMemoryGraphStore {
    async fn create(&self, graph: &WorkflowGraph) -> Result<WorkflowId> {
        let id = uuid::Uuid::new_v4().to_string();
        self.workflows
            .write()
            .insert(id.clone(), StoredWorkflow::new(id.clone(), graph.clone()));
        log::info!("Created workflow '{}'", id);
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<WorkflowGraph> {
        self.workflows
            .read()
            .get(id)
            .map(|w| w.graph.clone())
            .ok_or_else(|| WorkflowServiceError::NotFound(id.to_string()))
    }

    async fn save(&self, id: &str, graph: &WorkflowGraph, expected_version: u64) -> Result<u64> {
        let mut workflows = self.workflows.write();
        let stored = workflows
            .get_mut(id)
            .ok_or_else(|| WorkflowServiceError::NotFound(id.to_string()))?;
        let version = stored.commit(graph, expected_version)?;
        log::debug!("Saved workflow '{}' at v{}", id, version);
        Ok(version)
    }

    async fn delete(&self, id: &str) -> Result<()> {
        self.workflows
            .write()
            .remove(id)
            .ok_or_else(|| WorkflowServiceError::NotFound(id.to_string()))?;
        log::info!("Deleted workflow '{}'", id);
        Ok(())
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        let mut summaries: Vec<WorkflowSummary> = self
            .workflows
            .read()
            .values()
            .map(StoredWorkflow::summary)
            .collect();
        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use workflow_graph::{NodeType, WorkflowBuilder};

    fn sample() -> WorkflowGraph {
        WorkflowBuilder::new()
            .add_node("start", NodeType::ManualTrigger, (0.0, 0.0))
            .add_node("open", NodeType::Navigate, (200.0, 0.0))
            .add_edge("start", "open")
            .build()
    }

    #[tokio::test]
    async fn test_create_and_load() {
        let store = InMemoryGraphStore::new();
        let graph = sample();
        let id = store.create(&graph).await.unwrap();

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded, graph);
        assert_eq!(loaded.version(), 0);
    }

    #[tokio::test]
    async fn test_save_increments_version() {
        let store = InMemoryGraphStore::new();
        let id = store.create(&sample()).await.unwrap();

        let mut graph = store.load(&id).await.unwrap();
        graph.set_variable("retries", json!(2));
        assert_eq!(store.save(&id, &graph, 0).await.unwrap(), 1);

        let loaded = store.load(&id).await.unwrap();
        assert_eq!(loaded.version(), 1);
        assert_eq!(loaded.variables()["retries"], 2);
    }

    #[tokio::test]
    async fn test_stale_save_conflicts_and_changes_nothing() {
        let store = InMemoryGraphStore::new();
        let id = store.create(&sample()).await.unwrap();
        let base = store.load(&id).await.unwrap();
        for expected in 0..3 {
            store.save(&id, &base, expected).await.unwrap();
        }

        let mut stale = base.clone();
        stale.set_variable("lost", json!(true));
        let err = store.save(&id, &stale, 2).await.unwrap_err();
        assert!(err.is_retryable());
        assert!(matches!(
            err,
            WorkflowServiceError::VersionConflict { expected: 2, actual: 3, .. }
        ));

        let stored = store.load(&id).await.unwrap();
        assert_eq!(stored.version(), 3);
        assert!(stored.variables().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_ids() {
        let store = InMemoryGraphStore::new();
        assert!(matches!(
            store.load("nope").await,
            Err(WorkflowServiceError::NotFound(_))
        ));
        assert!(matches!(
            store.save("nope", &sample(), 0).await,
            Err(WorkflowServiceError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(WorkflowServiceError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_list_and_delete() {
        let store = InMemoryGraphStore::new();
        let a = store.create(&sample()).await.unwrap();
        let b = store.create(&WorkflowGraph::new()).await.unwrap();

        let summaries = store.list().await.unwrap();
        assert_eq!(summaries.len(), 2);
        let first = summaries.iter().find(|s| s.id == a).unwrap();
        assert_eq!((first.node_count, first.edge_count), (2, 1));

        store.delete(&b).await.unwrap();
        let ids: Vec<String> = store.list().await.unwrap().into_iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![a]);
    }
}
