//! Node variant trait and definition metadata
//!
//! Each typed node configuration implements [`NodeVariant`], which ties the
//! Rust struct to its [`NodeType`] tag, its declared shape and the registry
//! metadata (category, label, outputs, handles). The config struct is the
//! single source of truth: its `Default` is the registry default.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::shape::FieldSpec;
use crate::types::{NodeCategory, NodeType, ValueKind};

/// Trait for typed node configurations
///
/// # Example
///
/// ```ignore
/// impl NodeVariant for NavigateConfig {
///     const NODE_TYPE: NodeType = NodeType::Navigate;
///     const SHAPE: &'static [FieldSpec] = NAVIGATE_SHAPE;
///
///     fn definition() -> NodeDefinition {
///         NodeDefinition::for_variant::<Self>(NodeCategory::Browser, "Navigate", "Open a URL")
///             .output("title", ValueKind::String)
///     }
/// }
/// ```
pub trait NodeVariant: Serialize + DeserializeOwned + Default {
    /// The tag this configuration belongs to
    const NODE_TYPE: NodeType;
    /// Declared configuration fields, excluding the common `label`
    const SHAPE: &'static [FieldSpec];

    /// Registry metadata for this node type
    fn definition() -> NodeDefinition;
}

/// A named output field and its coarse kind
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutputField {
    pub name: String,
    pub kind: ValueKind,
}

/// Output handles a node type exposes to outgoing edges
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutputHandles {
    /// One unnamed output; edges carry no source handle
    Single,
    /// A fixed set of named outputs
    Fixed { handles: &'static [&'static str] },
    /// One handle per entry of a list field, plus a fallback handle
    PerCase {
        field: &'static str,
        prefix: &'static str,
        fallback: &'static str,
    },
}

impl OutputHandles {
    /// Handle ids available for a node with the given data
    pub fn handles(&self, data: &Value) -> Vec<String> {
        match self {
            OutputHandles::Single => Vec::new(),
            OutputHandles::Fixed { handles } => handles.iter().map(|h| h.to_string()).collect(),
            OutputHandles::PerCase {
                field,
                prefix,
                fallback,
            } => {
                let cases = data
                    .get(*field)
                    .and_then(|v| v.as_array())
                    .map_or(0, |a| a.len());
                (0..cases)
                    .map(|i| format!("{}{}", prefix, i))
                    .chain(std::iter::once(fallback.to_string()))
                    .collect()
            }
        }
    }

    /// Whether outgoing edges must name a handle
    pub fn is_multi(&self) -> bool {
        !matches!(self, OutputHandles::Single)
    }
}

/// Registry metadata for one node type
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeDefinition {
    /// Type tag
    pub node_type: NodeType,
    /// Palette category
    pub category: NodeCategory,
    /// Human-readable label
    pub label: String,
    /// What the node does
    pub description: String,
    /// Data a freshly created node starts with
    pub default_config: Value,
    /// Fields the node produces, for `$input` reference checks
    pub output_schema: Vec<OutputField>,
    /// Declared configuration fields
    pub shape: &'static [FieldSpec],
    /// Output handles
    pub output_handles: OutputHandles,
    /// Whether edges may target this node
    pub accepts_input: bool,
}

impl NodeDefinition {
    /// Start a definition from a variant's tag, shape and default
    pub fn for_variant<T: NodeVariant>(
        category: NodeCategory,
        label: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            node_type: T::NODE_TYPE,
            category,
            label: label.into(),
            description: description.into(),
            default_config: serde_json::to_value(T::default()).unwrap_or_default(),
            output_schema: Vec::new(),
            shape: T::SHAPE,
            output_handles: OutputHandles::Single,
            accepts_input: true,
        }
    }

    /// Declare an output field
    pub fn output(mut self, name: impl Into<String>, kind: ValueKind) -> Self {
        self.output_schema.push(OutputField {
            name: name.into(),
            kind,
        });
        self
    }

    /// Declare the output handles
    pub fn handles(mut self, handles: OutputHandles) -> Self {
        self.output_handles = handles;
        self
    }

    /// Mark the type as an entry point that accepts no incoming edges
    pub fn without_input(mut self) -> Self {
        self.accepts_input = false;
        self
    }

    /// Kind of a declared output field
    pub fn output_kind(&self, name: &str) -> Option<ValueKind> {
        self.output_schema
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_per_case_handles_follow_data() {
        let handles = OutputHandles::PerCase {
            field: "cases",
            prefix: "case-",
            fallback: "default",
        };
        let data = json!({"cases": [{"value": "a"}, {"value": "b"}]});
        assert_eq!(handles.handles(&data), vec!["case-0", "case-1", "default"]);
        assert_eq!(handles.handles(&json!({})), vec!["default"]);
        assert!(handles.is_multi());
    }

    #[test]
    fn test_single_handle() {
        assert!(OutputHandles::Single.handles(&json!({})).is_empty());
        assert!(!OutputHandles::Single.is_multi());
    }
}
