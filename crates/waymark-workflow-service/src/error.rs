//! Error types for workflow storage and the save pipeline

use thiserror::Error;
use workflow_graph::{GraphError, ValidationIssue};

/// Result type alias using WorkflowServiceError
pub type Result<T> = std::result::Result<T, WorkflowServiceError>;

#[derive(Debug, Error)]
pub enum WorkflowServiceError {
    /// No workflow is stored under this id
    #[error("Workflow not found: {0}")]
    NotFound(String),

    /// The stored version moved on since the caller loaded the graph
    ///
    /// Reload, re-apply the edit and save again; never overwrite blindly.
    #[error("Version conflict on workflow '{workflow_id}': expected v{expected}, stored v{actual}")]
    VersionConflict {
        workflow_id: String,
        expected: u64,
        actual: u64,
    },

    /// Validation found blocking issues; storage was not touched
    #[error("Save rejected with {} blocking issue(s)", .issues.len())]
    SaveRejected { issues: Vec<ValidationIssue> },

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl WorkflowServiceError {
    /// Whether reloading and trying again can succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }
}
