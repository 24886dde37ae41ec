//! Fluent builder for workflow graphs
//!
//! Provides a fluent API for constructing graphs programmatically.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::descriptor::NodeVariant;
use crate::error::Result;
use crate::graph::WorkflowGraph;
use crate::registry::NodeRegistry;
use crate::types::{Edge, Node, NodeType, LABEL_FIELD};

/// Fluent builder for constructing workflow graphs
///
/// # Example
///
/// ```ignore
/// let graph = WorkflowBuilder::new()
///     .add_node("start", NodeType::ManualTrigger, (0.0, 0.0))
///     .add_variant("open", (200.0, 0.0), NavigateConfig {
///         url: "https://example.com".into(),
///         ..Default::default()
///     })
///     .with_label("home")
///     .add_edge("start", "open")
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct WorkflowBuilder {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    variables: BTreeMap<String, Value>,
    version: u64,
    edge_counter: usize,
}

impl WorkflowBuilder {
    /// Create a new workflow builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node with its type's default data
    pub fn add_node(
        mut self,
        id: impl Into<String>,
        node_type: NodeType,
        position: (f64, f64),
    ) -> Self {
        let data = NodeRegistry::builtin()
            .instantiate_default(node_type)
            .unwrap_or_default();
        self.nodes.push(Node::new(id, node_type, position, data));
        self
    }

    /// Add a node from a typed configuration
    pub fn add_variant<T: NodeVariant>(
        mut self,
        id: impl Into<String>,
        position: (f64, f64),
        config: T,
    ) -> Self {
        self.nodes.push(Node::new(
            id,
            T::NODE_TYPE,
            position,
            serde_json::to_value(config).unwrap_or_default(),
        ));
        self
    }

    /// Replace the data of the most recently added node
    ///
    /// Must be called immediately after `add_node`.
    pub fn with_data(mut self, data: Value) -> Self {
        if let Some(node) = self.nodes.last_mut() {
            node.data = data;
        }
        self
    }

    /// Give the most recently added node an alias
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        if let Some(Value::Object(data)) = self.nodes.last_mut().map(|n| &mut n.data) {
            data.insert(LABEL_FIELD.to_string(), Value::String(label.into()));
        }
        self
    }

    /// Add an edge between two nodes (auto-generates edge ID)
    pub fn add_edge(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let id = self.next_edge_id();
        self.edges.push(Edge::new(id, source, target));
        self
    }

    /// Add an edge leaving a named output handle
    pub fn add_edge_from(
        mut self,
        source: impl Into<String>,
        source_handle: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        let id = self.next_edge_id();
        self.edges
            .push(Edge::new(id, source, target).with_source_handle(source_handle));
        self
    }

    /// Add an edge with an explicit ID
    pub fn add_edge_with_id(
        mut self,
        edge_id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        self.edges.push(Edge::new(edge_id, source, target));
        self
    }

    /// Declare a workflow variable
    pub fn variable(mut self, name: impl Into<String>, value: Value) -> Self {
        self.variables.insert(name.into(), value);
        self
    }

    /// Start the graph at a given version
    pub fn version(mut self, version: u64) -> Self {
        self.version = version;
        self
    }

    /// Build the graph without checking invariants
    pub fn build(self) -> WorkflowGraph {
        WorkflowGraph::from_parts(self.nodes, self.edges, self.variables, self.version)
    }

    /// Build the graph through its mutation API, failing on the first broken invariant
    pub fn try_build(self) -> Result<WorkflowGraph> {
        let mut graph = WorkflowGraph::from_parts(Vec::new(), Vec::new(), self.variables, self.version);
        for node in self.nodes {
            graph.add_node(node)?;
        }
        for edge in self.edges {
            graph.add_edge(edge)?;
        }
        Ok(graph)
    }

    fn next_edge_id(&mut self) -> String {
        self.edge_counter += 1;
        format!("edge-{}", self.edge_counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GraphError;
    use crate::nodes::NavigateConfig;
    use serde_json::json;

    #[test]
    fn test_builder_basic() {
        let graph = WorkflowBuilder::new()
            .add_node("start", NodeType::ManualTrigger, (0.0, 0.0))
            .add_variant(
                "open",
                (200.0, 0.0),
                NavigateConfig {
                    url: "https://example.com".into(),
                    ..Default::default()
                },
            )
            .with_label("home")
            .add_edge("start", "open")
            .variable("user", json!("ada"))
            .build();

        assert_eq!(graph.nodes().len(), 2);
        assert_eq!(graph.edges()[0].id, "edge-1");
        assert_eq!(graph.find_by_alias("home").unwrap().id, "open");
        assert_eq!(graph.node("open").unwrap().data["url"], "https://example.com");
        assert_eq!(graph.variables()["user"], "ada");
        assert_eq!(graph.version(), 0);
    }

    #[test]
    fn test_build_keeps_broken_edges() {
        let graph = WorkflowBuilder::new()
            .add_node("a", NodeType::ManualTrigger, (0.0, 0.0))
            .add_edge_with_id("e1", "a", "missing")
            .build();
        assert_eq!(graph.edges().len(), 1);
    }

    #[test]
    fn test_try_build_enforces_invariants() {
        let result = WorkflowBuilder::new()
            .add_node("a", NodeType::ManualTrigger, (0.0, 0.0))
            .add_edge_with_id("e1", "a", "missing")
            .try_build();
        assert!(matches!(result, Err(GraphError::DanglingEdge { .. })));

        let graph = WorkflowBuilder::new()
            .add_node("if", NodeType::Condition, (0.0, 0.0))
            .add_node("yes", NodeType::Click, (0.0, 0.0))
            .add_edge_from("if", "true", "yes")
            .version(4)
            .try_build()
            .unwrap();
        assert_eq!(graph.edges()[0].source_handle.as_deref(), Some("true"));
        assert_eq!(graph.version(), 4);
    }
}
