//! Error types for the workflow graph core
//!
//! Only registry misuse and aggregate invariant violations are errors.
//! Problems found in user-authored graphs are collected as
//! [`ValidationIssue`](crate::validation::ValidationIssue)s instead.

use thiserror::Error;

/// Result type alias using GraphError
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors that can occur in the graph core
#[derive(Debug, Error)]
pub enum GraphError {
    /// Registry lookup for a type that is not registered
    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    /// The same node type was registered twice
    #[error("Node type '{0}' is registered more than once")]
    DuplicateNodeType(String),

    /// A registry default does not satisfy its own configuration shape
    #[error("Default config for '{node_type}' is invalid: {reason}")]
    InvalidDefault { node_type: String, reason: String },

    /// A node with this id already exists in the graph
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// An edge with this id already exists in the graph
    #[error("Duplicate edge id: {0}")]
    DuplicateEdge(String),

    /// The same ordered node pair is already connected through the same handles
    #[error("Edge '{edge_id}' duplicates an existing connection {from} -> {to}")]
    DuplicateConnection {
        edge_id: String,
        from: String,
        to: String,
    },

    /// Node not found in the graph
    #[error("Node not found: {0}")]
    NodeNotFound(String),

    /// A node position with a NaN or infinite coordinate
    #[error("Node '{0}' has a non-finite position")]
    NonFinitePosition(String),

    /// Edge not found in the graph
    #[error("Edge not found: {0}")]
    EdgeNotFound(String),

    /// An edge endpoint names a node that does not exist
    #[error("Edge '{edge_id}' references unknown node '{node_id}'")]
    DanglingEdge { edge_id: String, node_id: String },

    /// An edge whose source and target are the same node
    #[error("Edge '{0}' connects a node to itself")]
    SelfLoop(String),

    /// Node data could not be read as its typed configuration
    #[error("Invalid config for '{node_type}': {reason}")]
    InvalidConfig { node_type: String, reason: String },

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Compression error
    #[error("Compression error: {0}")]
    Compression(String),
}

impl GraphError {
    /// Create an unknown node type error
    pub fn unknown_type(node_type: impl Into<String>) -> Self {
        Self::UnknownNodeType(node_type.into())
    }
}
