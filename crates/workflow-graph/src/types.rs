//! Core types for workflow graphs
//!
//! These types define the pieces a workflow graph is made of: the closed
//! set of node types, node instances, and the edges between them.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Unique identifier for a node
pub type NodeId = String;

/// Unique identifier for an edge
pub type EdgeId = String;

/// Data field carrying a node's alias for `$input` references
pub const LABEL_FIELD: &str = "label";

/// Handle id every input-accepting node exposes
pub const INPUT_HANDLE: &str = "input";

/// The closed set of node types
///
/// Adding an automation capability means adding a case here; the registry
/// and [`NodeConfig`](crate::nodes::NodeConfig) match on this exhaustively.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NodeType {
    ManualTrigger,
    Webhook,
    Schedule,
    Navigate,
    Click,
    TypeText,
    Extract,
    Screenshot,
    WaitFor,
    Scroll,
    Condition,
    Loop,
    Switch,
    Merge,
    SetVariable,
    Script,
    HttpRequest,
    AiAgent,
}

impl NodeType {
    /// Every node type, in registration order
    pub const ALL: [NodeType; 18] = [
        NodeType::ManualTrigger,
        NodeType::Webhook,
        NodeType::Schedule,
        NodeType::Navigate,
        NodeType::Click,
        NodeType::TypeText,
        NodeType::Extract,
        NodeType::Screenshot,
        NodeType::WaitFor,
        NodeType::Scroll,
        NodeType::Condition,
        NodeType::Loop,
        NodeType::Switch,
        NodeType::Merge,
        NodeType::SetVariable,
        NodeType::Script,
        NodeType::HttpRequest,
        NodeType::AiAgent,
    ];

    /// The wire tag for this type
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeType::ManualTrigger => "manualTrigger",
            NodeType::Webhook => "webhook",
            NodeType::Schedule => "schedule",
            NodeType::Navigate => "navigate",
            NodeType::Click => "click",
            NodeType::TypeText => "typeText",
            NodeType::Extract => "extract",
            NodeType::Screenshot => "screenshot",
            NodeType::WaitFor => "waitFor",
            NodeType::Scroll => "scroll",
            NodeType::Condition => "condition",
            NodeType::Loop => "loop",
            NodeType::Switch => "switch",
            NodeType::Merge => "merge",
            NodeType::SetVariable => "setVariable",
            NodeType::Script => "script",
            NodeType::HttpRequest => "httpRequest",
            NodeType::AiAgent => "aiAgent",
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeType {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        NodeType::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| GraphError::unknown_type(s))
    }
}

/// Category of a node type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeCategory {
    /// Entry points (manual start, webhook, schedule)
    Trigger,
    /// Browser actions (navigate, click, extract, ...)
    Browser,
    /// Control flow (conditions, loops, switches, merges)
    Logic,
    /// Variable and script nodes
    Data,
    /// External service calls
    Integration,
    /// LLM-backed nodes
    Ai,
}

/// Coarse semantic type of a node output field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    String,
    Number,
    Boolean,
    Object,
    Array,
}

/// Canvas position of a node (presentation only)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Whether both coordinates survive the JSON wire format
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Position {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// A node instance in a graph
///
/// `data` is kept as raw JSON so that configurations which do not match
/// their declared shape survive loading and can be reported by the validator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier for this node instance
    pub id: NodeId,
    /// Node type; fixed for the lifetime of the node
    #[serde(rename = "type")]
    pub node_type: NodeType,
    /// Position in the editor
    #[serde(default)]
    pub position: Position,
    /// Configuration for this instance
    #[serde(default = "empty_data")]
    pub data: serde_json::Value,
}

fn empty_data() -> serde_json::Value {
    serde_json::Value::Object(serde_json::Map::new())
}

impl Node {
    /// Create a node with explicit data
    pub fn new(
        id: impl Into<String>,
        node_type: NodeType,
        position: impl Into<Position>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: id.into(),
            node_type,
            position: position.into(),
            data,
        }
    }

    /// The user-facing alias of this node, if it has one
    pub fn alias(&self) -> Option<&str> {
        self.data
            .get(LABEL_FIELD)
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
    }
}

/// A directed link: `target` may consume `source`'s output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    /// Unique identifier for this edge
    pub id: EdgeId,
    /// Source node ID
    pub source: NodeId,
    /// Target node ID
    pub target: NodeId,
    /// Output handle on the source (multi-output nodes only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_handle: Option<String>,
    /// Input handle on the target
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_handle: Option<String>,
}

impl Edge {
    /// Create an edge without handles
    pub fn new(id: impl Into<String>, source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_handle: None,
            target_handle: None,
        }
    }

    /// Set the source handle
    pub fn with_source_handle(mut self, handle: impl Into<String>) -> Self {
        self.source_handle = Some(handle.into());
        self
    }

    /// Set the target handle
    pub fn with_target_handle(mut self, handle: impl Into<String>) -> Self {
        self.target_handle = Some(handle.into());
        self
    }

    /// Whether this edge and `other` connect the same ordered pair through the same handles
    pub fn same_connection(&self, other: &Edge) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.source_handle == other.source_handle
            && self.target_handle == other.target_handle
    }
}
