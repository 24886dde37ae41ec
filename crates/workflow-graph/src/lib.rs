//! Workflow Graph - the model behind the Waymark workflow builder
//!
//! This crate holds everything about a browser-automation workflow that
//! does not need a browser or a network:
//!
//! - A closed set of typed node variants and their registry
//! - `{{...}}` expression references: parsing and resolution
//! - The `WorkflowGraph` aggregate with invariant-preserving mutations
//! - A validator that collects every structural, shape and reference issue
//! - Compressed snapshot-based undo/redo
//!
//! # Example
//!
//! ```ignore
//! use workflow_graph::{validate_workflow, NodeType, ValidationReport, WorkflowBuilder};
//!
//! let graph = WorkflowBuilder::new()
//!     .add_node("start", NodeType::ManualTrigger, (0.0, 0.0))
//!     .add_node("open", NodeType::Navigate, (200.0, 0.0))
//!     .add_edge("start", "open")
//!     .build();
//!
//! let issues = validate_workflow(&graph)?;
//! assert!(!issues.has_errors());
//! ```

pub mod builder;
pub mod descriptor;
pub mod error;
pub mod expression;
pub mod graph;
pub mod history;
pub mod nodes;
pub mod registry;
pub mod shape;
pub mod types;
pub mod validation;

// Re-export key types
pub use builder::WorkflowBuilder;
pub use descriptor::{NodeDefinition, NodeVariant, OutputField, OutputHandles};
pub use error::{GraphError, Result};
pub use expression::{
    extract_references, lookup, resolve, ExecutionContext, ExpressionRef, Resolved, Scope,
    ScopeSource, SyntaxError, SyntaxErrorKind,
};
pub use graph::WorkflowGraph;
pub use history::UndoStack;
pub use nodes::NodeConfig;
pub use registry::NodeRegistry;
pub use shape::{check_node_data, check_shape, FieldKind, FieldSpec, ShapeViolation};
pub use types::{Edge, EdgeId, Node, NodeCategory, NodeId, NodeType, Position, ValueKind};
pub use validation::{
    validate_workflow, IssueCode, Severity, ValidationIssue, ValidationReport, Validator,
};
