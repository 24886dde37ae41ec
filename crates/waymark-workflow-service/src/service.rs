//! Workflow service: validation-gated access to a graph store
//!
//! Every save runs the validator first. Error-severity issues reject the
//! save before storage is touched; warnings ride along with a successful
//! save unless the service is configured to treat them as blocking.

use std::sync::Arc;

use serde::Serialize;
use workflow_graph::{NodeRegistry, ValidationIssue, ValidationReport, Validator, WorkflowGraph};

use crate::config::{ServiceConfig, StoreConfig};
use crate::error::{Result, WorkflowServiceError};
use crate::file_store::FileGraphStore;
use crate::store::{GraphStore, InMemoryGraphStore, WorkflowId, WorkflowSummary};

/// Result of an accepted save
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOutcome {
    /// Version now stored
    pub version: u64,
    /// Non-blocking issues found while validating
    pub warnings: Vec<ValidationIssue>,
}

/// Build the store selected by the configuration
pub fn build_store(config: &ServiceConfig) -> Arc<dyn GraphStore> {
    match &config.store {
        StoreConfig::Memory => Arc::new(InMemoryGraphStore::new()),
        StoreConfig::File { dir } => Arc::new(FileGraphStore::new(dir)),
    }
}

/// Validation-gated workflow persistence
#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn GraphStore>,
    registry: &'static NodeRegistry,
    config: ServiceConfig,
}

impl WorkflowService {
    /// Service over the store the configuration selects
    pub fn from_config(config: ServiceConfig) -> Self {
        let store = build_store(&config);
        Self::new(store, config)
    }

    pub fn new(store: Arc<dyn GraphStore>, config: ServiceConfig) -> Self {
        Self {
            store,
            registry: NodeRegistry::builtin(),
            config,
        }
    }

    /// Validate against a registry other than the built-in one
    pub fn with_registry(mut self, registry: &'static NodeRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn registry(&self) -> &'static NodeRegistry {
        self.registry
    }

    /// Run the validator without touching storage
    pub fn validate(&self, graph: &WorkflowGraph) -> Result<Vec<ValidationIssue>> {
        Ok(Validator::new(self.registry).validate(graph)?)
    }

    /// Store a new workflow
    ///
    /// Drafts are stored as given; the validation gate applies to saves.
    pub async fn create(&self, graph: &WorkflowGraph) -> Result<WorkflowId> {
        self.store.create(graph).await
    }

    pub async fn load(&self, id: &str) -> Result<WorkflowGraph> {
        self.store.load(id).await
    }

    /// Validate and save a graph based on its current version
    ///
    /// On success the caller's graph adopts the committed version, so it
    /// can be saved again without reloading.
    pub async fn save(&self, id: &str, graph: &mut WorkflowGraph) -> Result<SaveOutcome> {
        let issues = self.validate(graph)?;
        let blocked = issues.has_errors() || (self.config.reject_on_warnings && !issues.is_empty());
        if blocked {
            log::warn!(
                "Rejected save of workflow '{}': {} error(s), {} warning(s)",
                id,
                issues.errors().len(),
                issues.warnings().len()
            );
            return Err(WorkflowServiceError::SaveRejected { issues });
        }

        let version = self.store.save(id, graph, graph.version()).await?;
        graph.set_committed_version(version);
        log::info!(
            "Saved workflow '{}' at v{} with {} warning(s)",
            id,
            version,
            issues.len()
        );

        Ok(SaveOutcome {
            version,
            warnings: issues,
        })
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.store.delete(id).await
    }

    pub async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        self.store.list().await
    }
}
