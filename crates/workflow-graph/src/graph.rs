//! Workflow graph aggregate
//!
//! [`WorkflowGraph`] owns every node, edge and variable of one workflow.
//! Its mutations keep the structural invariants: unique ids, no dangling
//! endpoints, no self-loops, no duplicate connections. Graphs read from
//! JSON are taken as-is so that the validator can report what is wrong
//! with them.

use std::collections::{BTreeMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{GraphError, Result};
use crate::registry::NodeRegistry;
use crate::types::{Edge, EdgeId, Node, NodeId, NodeType, Position};

/// A workflow: nodes, edges, variables and the optimistic-concurrency version
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowGraph {
    #[serde(default)]
    nodes: Vec<Node>,
    #[serde(default)]
    edges: Vec<Edge>,
    #[serde(default)]
    variables: BTreeMap<String, Value>,
    #[serde(default)]
    version: u64,
}

impl WorkflowGraph {
    /// Create an empty graph at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Assemble a graph from stored parts without checking invariants
    ///
    /// Used when replacing a graph with what storage holds. Run the
    /// validator before trusting the result.
    pub fn from_parts(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        variables: BTreeMap<String, Value>,
        version: u64,
    ) -> Self {
        Self {
            nodes,
            edges,
            variables,
            version,
        }
    }

    /// Parse the JSON wire format
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize to the JSON wire format
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serialize to indented JSON
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Content hash over nodes, edges and variables
    ///
    /// The version is left out: a graph that was only committed hashes the
    /// same as before.
    pub fn fingerprint(&self) -> String {
        let bytes =
            serde_json::to_vec(&(&self.nodes, &self.edges, &self.variables)).unwrap_or_default();
        blake3::hash(&bytes).to_hex().to_string()
    }

    // ---- Queries ----

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn variables(&self) -> &BTreeMap<String, Value> {
        &self.variables
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Find a node by ID
    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Find an edge by ID
    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.iter().find(|e| e.id == id)
    }

    /// First node whose `label` equals `alias`
    pub fn find_by_alias(&self, alias: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.alias() == Some(alias))
    }

    /// Node named by an `$input` key: an id, or failing that an alias
    pub fn find_by_id_or_alias(&self, key: &str) -> Option<&Node> {
        self.node(key).or_else(|| self.find_by_alias(key))
    }

    /// Get edges coming into a node
    pub fn incoming_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.target == node_id)
    }

    /// Get edges going out of a node
    pub fn outgoing_edges<'a>(&'a self, node_id: &'a str) -> impl Iterator<Item = &'a Edge> + 'a {
        self.edges.iter().filter(move |e| e.source == node_id)
    }

    /// IDs of the nodes feeding directly into a node, without repeats
    pub fn upstream_nodes(&self, node_id: &str) -> Vec<NodeId> {
        let mut seen = HashSet::new();
        self.incoming_edges(node_id)
            .filter(|e| seen.insert(e.source.as_str()))
            .map(|e| e.source.clone())
            .collect()
    }

    /// IDs of every node reachable from `node_id` by following edges
    ///
    /// Breadth-first order. The start node is included only if a cycle
    /// leads back to it.
    pub fn reachable_from(&self, node_id: &str) -> Vec<NodeId> {
        let mut seen: HashSet<&str> = HashSet::new();
        let mut order = Vec::new();
        let mut queue = VecDeque::from([node_id]);

        while let Some(current) = queue.pop_front() {
            for edge in self.outgoing_edges(current) {
                if seen.insert(edge.target.as_str()) {
                    order.push(edge.target.clone());
                    queue.push_back(edge.target.as_str());
                }
            }
        }
        order
    }

    // ---- Mutations ----

    /// Add a node; its id must be new and its position finite
    pub fn add_node(&mut self, node: Node) -> Result<()> {
        if self.node(&node.id).is_some() {
            return Err(GraphError::DuplicateNode(node.id));
        }
        if !node.position.is_finite() {
            return Err(GraphError::NonFinitePosition(node.id));
        }
        log::debug!("Adding {} node '{}'", node.node_type, node.id);
        self.nodes.push(node);
        Ok(())
    }

    /// Create a node of `node_type` with a fresh id and the registry default data
    pub fn create_node(
        &mut self,
        registry: &NodeRegistry,
        node_type: NodeType,
        position: impl Into<Position>,
    ) -> Result<NodeId> {
        let data = registry.instantiate_default(node_type)?;
        let id = uuid::Uuid::new_v4().to_string();
        self.add_node(Node::new(id.clone(), node_type, position, data))?;
        Ok(id)
    }

    /// Replace a node's data, returning the previous data
    pub fn update_node_data(&mut self, node_id: &str, data: Value) -> Result<Value> {
        let node = self.node_mut(node_id)?;
        log::debug!("Updating data of node '{}'", node_id);
        Ok(std::mem::replace(&mut node.data, data))
    }

    pub fn move_node(&mut self, node_id: &str, position: impl Into<Position>) -> Result<()> {
        let position = position.into();
        let node = self.node_mut(node_id)?;
        if !position.is_finite() {
            return Err(GraphError::NonFinitePosition(node_id.to_string()));
        }
        node.position = position;
        Ok(())
    }

    /// Remove a node and every edge that names it
    pub fn remove_node(&mut self, node_id: &str) -> Result<(Node, Vec<Edge>)> {
        let pos = self
            .nodes
            .iter()
            .position(|n| n.id == node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        let node = self.nodes.remove(pos);

        let (removed, kept): (Vec<Edge>, Vec<Edge>) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|e| e.source == node_id || e.target == node_id);
        self.edges = kept;

        log::debug!(
            "Removed node '{}' and {} attached edge(s)",
            node_id,
            removed.len()
        );
        Ok((node, removed))
    }

    /// Add an edge between two existing nodes
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        if self.edge(&edge.id).is_some() {
            return Err(GraphError::DuplicateEdge(edge.id));
        }
        for endpoint in [&edge.source, &edge.target] {
            if self.node(endpoint).is_none() {
                return Err(GraphError::DanglingEdge {
                    edge_id: edge.id.clone(),
                    node_id: endpoint.clone(),
                });
            }
        }
        if edge.source == edge.target {
            return Err(GraphError::SelfLoop(edge.id));
        }
        if self.edges.iter().any(|e| e.same_connection(&edge)) {
            return Err(GraphError::DuplicateConnection {
                edge_id: edge.id,
                from: edge.source,
                to: edge.target,
            });
        }

        log::debug!("Adding edge '{}': {} -> {}", edge.id, edge.source, edge.target);
        self.edges.push(edge);
        Ok(())
    }

    /// Connect two nodes with a freshly identified edge
    pub fn connect(
        &mut self,
        source: &str,
        target: &str,
        source_handle: Option<&str>,
    ) -> Result<EdgeId> {
        let id = uuid::Uuid::new_v4().to_string();
        let mut edge = Edge::new(id.clone(), source, target);
        edge.source_handle = source_handle.map(str::to_string);
        self.add_edge(edge)?;
        Ok(id)
    }

    pub fn remove_edge(&mut self, edge_id: &str) -> Result<Edge> {
        let pos = self
            .edges
            .iter()
            .position(|e| e.id == edge_id)
            .ok_or_else(|| GraphError::EdgeNotFound(edge_id.to_string()))?;
        Ok(self.edges.remove(pos))
    }

    /// Set a workflow variable, returning the value it replaced
    ///
    /// The new value is stored as given, whatever kind the old one had.
    pub fn set_variable(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.variables.insert(name.into(), value)
    }

    pub fn remove_variable(&mut self, name: &str) -> Option<Value> {
        self.variables.remove(name)
    }

    /// Advance the version by one, returning the new version
    pub fn bump_version(&mut self) -> u64 {
        self.version += 1;
        self.version
    }

    /// Adopt the version storage committed for this graph
    pub fn set_committed_version(&mut self, version: u64) {
        self.version = version;
    }

    fn node_mut(&mut self, node_id: &str) -> Result<&mut Node> {
        self.nodes
            .iter_mut()
            .find(|n| n.id == node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))
    }
}
