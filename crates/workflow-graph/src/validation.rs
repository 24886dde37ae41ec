//! Graph validation
//!
//! Validates graph structure, node configuration shapes and expression
//! references. Problems are collected as [`ValidationIssue`]s, never
//! thrown, so one pass reports everything. Checks run in a fixed order:
//!
//! 1. Structure: ids, edge endpoints, self-loops, handles, duplicate connections
//! 2. Shape: node data against the type's declared fields
//! 3. Expression syntax in every string value
//! 4. Expression semantics: unknown nodes, output fields, variables, `$item` scope
//! 5. Reachability: non-trigger nodes with no incoming edge
//!
//! Errors block a save; warnings do not.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::descriptor::NodeDefinition;
use crate::error::Result;
use crate::expression::{extract_references, ExpressionRef, Scope};
use crate::graph::WorkflowGraph;
use crate::registry::NodeRegistry;
use crate::shape::check_node_data;
use crate::types::{Node, NodeCategory, NodeType, INPUT_HANDLE};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

/// What kind of problem an issue reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    DuplicateNodeId,
    /// NaN or infinite coordinate, which the wire format cannot carry
    InvalidPosition,
    DuplicateEdgeId,
    /// Edge endpoint names a node that does not exist
    DanglingReference,
    SelfLoop,
    /// Edge handle the endpoint does not expose
    OrphanHandle,
    /// Edge into a node that takes no input
    InputNotAccepted,
    DuplicateConnection,
    ShapeMismatch,
    InvalidSyntax,
    UnknownInputNode,
    UnknownOutputField,
    ItemOutsideLoop,
    UnknownVariable,
    UnreachableNode,
}

/// A single validation finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub severity: Severity,
    pub code: IssueCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edge_id: Option<String>,
    /// Path of the offending field within node data or the edge
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    pub message: String,
}

impl ValidationIssue {
    pub fn error(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, code, message)
    }

    pub fn warning(code: IssueCode, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, code, message)
    }

    fn new(severity: Severity, code: IssueCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            node_id: None,
            edge_id: None,
            field: None,
            message: message.into(),
        }
    }

    pub fn on_node(mut self, node_id: impl Into<String>) -> Self {
        self.node_id = Some(node_id.into());
        self
    }

    pub fn on_edge(mut self, edge_id: impl Into<String>) -> Self {
        self.edge_id = Some(edge_id.into());
        self
    }

    /// Address a field; an empty path means the whole value and is dropped
    pub fn at_field(mut self, field: impl Into<String>) -> Self {
        let field = field.into();
        self.field = (!field.is_empty()).then_some(field);
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let severity = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}: {}", severity, self.message)?;
        if let Some(node_id) = &self.node_id {
            write!(f, " [node {}]", node_id)?;
        }
        if let Some(edge_id) = &self.edge_id {
            write!(f, " [edge {}]", edge_id)?;
        }
        Ok(())
    }
}

/// Severity filters over a list of issues
pub trait ValidationReport {
    /// Return only the error-level issues
    fn errors(&self) -> Vec<&ValidationIssue>;
    /// Return only the warning-level issues
    fn warnings(&self) -> Vec<&ValidationIssue>;
    fn has_errors(&self) -> bool;
}

impl ValidationReport for [ValidationIssue] {
    fn errors(&self) -> Vec<&ValidationIssue> {
        self.iter().filter(|i| i.severity == Severity::Error).collect()
    }

    fn warnings(&self) -> Vec<&ValidationIssue> {
        self.iter()
            .filter(|i| i.severity == Severity::Warning)
            .collect()
    }

    fn has_errors(&self) -> bool {
        self.iter().any(ValidationIssue::is_error)
    }
}

/// Validate a graph against the built-in registry
pub fn validate_workflow(graph: &WorkflowGraph) -> Result<Vec<ValidationIssue>> {
    Validator::new(NodeRegistry::builtin()).validate(graph)
}

/// Graph validator bound to a registry
pub struct Validator<'r> {
    registry: &'r NodeRegistry,
}

/// A parsed reference and where it was found
struct FoundRef<'g> {
    node: &'g Node,
    field: String,
    reference: ExpressionRef,
}

impl<'r> Validator<'r> {
    pub fn new(registry: &'r NodeRegistry) -> Self {
        Self { registry }
    }

    /// Validate a graph, returning every issue in check order
    ///
    /// Fails only when a node's type is not in the registry; that is
    /// checked before anything else.
    pub fn validate(&self, graph: &WorkflowGraph) -> Result<Vec<ValidationIssue>> {
        let mut definitions: HashMap<NodeType, &NodeDefinition> = HashMap::new();
        for node in graph.nodes() {
            definitions.insert(node.node_type, self.registry.lookup(node.node_type)?);
        }

        let mut issues = Vec::new();
        check_structure(graph, &definitions, &mut issues);
        check_shapes(graph, &definitions, &mut issues);
        let refs = check_syntax(graph, &mut issues);
        check_semantics(graph, &definitions, &refs, &mut issues);
        check_reachability(graph, &definitions, &mut issues);

        log::debug!(
            "Validated graph v{}: {} error(s), {} warning(s)",
            graph.version(),
            issues.errors().len(),
            issues.warnings().len()
        );
        Ok(issues)
    }
}

fn check_structure(
    graph: &WorkflowGraph,
    definitions: &HashMap<NodeType, &NodeDefinition>,
    issues: &mut Vec<ValidationIssue>,
) {
    let mut node_ids = HashSet::new();
    for node in graph.nodes() {
        if !node_ids.insert(node.id.as_str()) {
            issues.push(
                ValidationIssue::error(
                    IssueCode::DuplicateNodeId,
                    format!("Node id '{}' is used more than once", node.id),
                )
                .on_node(&node.id),
            );
        }
        if !node.position.is_finite() {
            issues.push(
                ValidationIssue::error(
                    IssueCode::InvalidPosition,
                    format!("Node '{}' has a non-finite position", node.id),
                )
                .on_node(&node.id)
                .at_field("position"),
            );
        }
    }

    let mut edge_ids = HashSet::new();
    for (index, edge) in graph.edges().iter().enumerate() {
        let fresh_id = edge_ids.insert(edge.id.as_str());
        if !fresh_id {
            issues.push(
                ValidationIssue::error(
                    IssueCode::DuplicateEdgeId,
                    format!("Edge id '{}' is used more than once", edge.id),
                )
                .on_edge(&edge.id),
            );
        }

        let source = graph.node(&edge.source);
        let target = graph.node(&edge.target);
        for (endpoint, found, field) in [
            (&edge.source, source, "source"),
            (&edge.target, target, "target"),
        ] {
            if found.is_none() {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::DanglingReference,
                        format!("Edge '{}' {} '{}' does not exist", edge.id, field, endpoint),
                    )
                    .on_edge(&edge.id)
                    .at_field(field),
                );
            }
        }

        if edge.source == edge.target {
            issues.push(
                ValidationIssue::error(
                    IssueCode::SelfLoop,
                    format!("Edge '{}' connects node '{}' to itself", edge.id, edge.source),
                )
                .on_edge(&edge.id),
            );
        }

        if let Some((node, def)) =
            source.and_then(|n| definitions.get(&n.node_type).map(|d| (n, *d)))
        {
            if let Some(message) = source_handle_problem(node, def, edge.source_handle.as_deref()) {
                issues.push(
                    ValidationIssue::error(IssueCode::OrphanHandle, message)
                        .on_edge(&edge.id)
                        .at_field("sourceHandle"),
                );
            }
        }

        if let Some(def) = target.and_then(|n| definitions.get(&n.node_type)) {
            if !def.accepts_input {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::InputNotAccepted,
                        format!(
                            "Edge '{}' targets '{}', a {} node that takes no input",
                            edge.id, edge.target, def.node_type
                        ),
                    )
                    .on_edge(&edge.id),
                );
            } else if let Some(handle) = edge.target_handle.as_deref().filter(|h| *h != INPUT_HANDLE) {
                issues.push(
                    ValidationIssue::error(
                        IssueCode::OrphanHandle,
                        format!(
                            "Edge '{}' targets unknown input handle '{}'",
                            edge.id, handle
                        ),
                    )
                    .on_edge(&edge.id)
                    .at_field("targetHandle"),
                );
            }
        }

        if fresh_id
            && graph.edges()[..index]
                .iter()
                .any(|earlier| earlier.same_connection(edge))
        {
            issues.push(
                ValidationIssue::error(
                    IssueCode::DuplicateConnection,
                    format!(
                        "Edge '{}' repeats an existing connection {} -> {}",
                        edge.id, edge.source, edge.target
                    ),
                )
                .on_edge(&edge.id),
            );
        }
    }
}

fn source_handle_problem(
    node: &Node,
    def: &NodeDefinition,
    handle: Option<&str>,
) -> Option<String> {
    let available = def.output_handles.handles(&node.data);
    match (def.output_handles.is_multi(), handle) {
        (false, None) => None,
        (false, Some(h)) => Some(format!(
            "'{}' has a single output; handle '{}' does not exist",
            node.id, h
        )),
        (true, None) => Some(format!(
            "Edges leaving '{}' must name one of its handles: {}",
            node.id,
            available.join(", ")
        )),
        (true, Some(h)) if available.iter().any(|a| a == h) => None,
        (true, Some(h)) => Some(format!(
            "'{}' has no output handle '{}' (expected one of: {})",
            node.id,
            h,
            available.join(", ")
        )),
    }
}

fn check_shapes(
    graph: &WorkflowGraph,
    definitions: &HashMap<NodeType, &NodeDefinition>,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in graph.nodes() {
        let Some(def) = definitions.get(&node.node_type) else {
            continue;
        };
        for violation in check_node_data(&node.data, def.shape) {
            issues.push(
                ValidationIssue::error(
                    IssueCode::ShapeMismatch,
                    format!("{} node '{}': {}", node.node_type, node.id, violation.message),
                )
                .on_node(&node.id)
                .at_field(violation.field),
            );
        }
    }
}

fn check_syntax<'g>(graph: &'g WorkflowGraph, issues: &mut Vec<ValidationIssue>) -> Vec<FoundRef<'g>> {
    let mut found = Vec::new();
    for node in graph.nodes() {
        let mut fields = Vec::new();
        collect_strings(&node.data, String::new(), &mut fields);

        for (field, text) in fields {
            match extract_references(text) {
                Ok(refs) => found.extend(refs.into_iter().map(|reference| FoundRef {
                    node,
                    field: field.clone(),
                    reference,
                })),
                Err(e) => issues.push(
                    ValidationIssue::error(
                        IssueCode::InvalidSyntax,
                        format!("Invalid expression in '{}' of node '{}': {}", field, node.id, e),
                    )
                    .on_node(&node.id)
                    .at_field(field),
                ),
            }
        }
    }
    found
}

fn collect_strings<'v>(value: &'v Value, path: String, out: &mut Vec<(String, &'v str)>) {
    match value {
        Value::String(s) => out.push((path, s)),
        Value::Array(items) => {
            for (i, item) in items.iter().enumerate() {
                collect_strings(item, format!("{}[{}]", path, i), out);
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                let child = if path.is_empty() {
                    key.clone()
                } else {
                    format!("{}.{}", path, key)
                };
                collect_strings(item, child, out);
            }
        }
        _ => {}
    }
}

fn check_semantics(
    graph: &WorkflowGraph,
    definitions: &HashMap<NodeType, &NodeDefinition>,
    refs: &[FoundRef<'_>],
    issues: &mut Vec<ValidationIssue>,
) {
    let in_loop: HashSet<String> = graph
        .nodes()
        .iter()
        .filter(|n| n.node_type == NodeType::Loop)
        .flat_map(|n| graph.reachable_from(&n.id))
        .collect();

    let assigned: HashSet<&str> = graph
        .nodes()
        .iter()
        .filter(|n| n.node_type == NodeType::SetVariable)
        .filter_map(|n| n.data.get("name").and_then(Value::as_str))
        .collect();

    for found in refs {
        let node = found.node;
        let reference = &found.reference;
        let path = reference.path_string();
        let warning = |code: IssueCode, message: String| {
            ValidationIssue::warning(code, message)
                .on_node(&node.id)
                .at_field(found.field.clone())
        };

        match reference.scope {
            Scope::Input => {
                let Some(key) = reference.input_node() else {
                    continue;
                };
                let Some(upstream) = graph.find_by_id_or_alias(key) else {
                    issues.push(warning(
                        IssueCode::UnknownInputNode,
                        format!("'{}' refers to unknown node or alias '{}'", path, key),
                    ));
                    continue;
                };
                let Some(output) = reference.input_field() else {
                    continue;
                };
                let declared = definitions
                    .get(&upstream.node_type)
                    .is_some_and(|d| d.output_kind(output).is_some());
                if !declared {
                    issues.push(warning(
                        IssueCode::UnknownOutputField,
                        format!(
                            "'{}': {} node '{}' has no output '{}'",
                            path, upstream.node_type, upstream.id, output
                        ),
                    ));
                }
            }
            Scope::Vars => {
                let Some(name) = reference.variable_name() else {
                    continue;
                };
                if !graph.variables().contains_key(name) && !assigned.contains(name) {
                    issues.push(warning(
                        IssueCode::UnknownVariable,
                        format!("'{}': variable '{}' is never declared or set", path, name),
                    ));
                }
            }
            Scope::Item => {
                if !in_loop.contains(&node.id) {
                    issues.push(warning(
                        IssueCode::ItemOutsideLoop,
                        format!("'{}' used in node '{}', which no loop reaches", path, node.id),
                    ));
                }
            }
        }
    }
}

fn check_reachability(
    graph: &WorkflowGraph,
    definitions: &HashMap<NodeType, &NodeDefinition>,
    issues: &mut Vec<ValidationIssue>,
) {
    for node in graph.nodes() {
        let is_trigger = definitions
            .get(&node.node_type)
            .is_some_and(|d| d.category == NodeCategory::Trigger);
        if !is_trigger && graph.incoming_edges(&node.id).next().is_none() {
            issues.push(
                ValidationIssue::warning(
                    IssueCode::UnreachableNode,
                    format!("Node '{}' has no incoming edge and is not a trigger", node.id),
                )
                .on_node(&node.id),
            );
        }
    }
}
