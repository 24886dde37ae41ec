//! Node type registry
//!
//! Maps each [`NodeType`] to its [`NodeDefinition`]: category, label,
//! default configuration, output schema, shape and handles. A registry is
//! immutable once built, so it can be shared freely across threads.
//!
//! # Usage
//!
//! ```ignore
//! use workflow_graph::{NodeRegistry, NodeType};
//!
//! let registry = NodeRegistry::builtin();
//! let data = registry.instantiate_default(NodeType::Navigate)?;
//! ```

use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::descriptor::NodeDefinition;
use crate::error::{GraphError, Result};
use crate::nodes::definition_for;
use crate::shape::check_node_data;
use crate::types::{NodeCategory, NodeType};

static BUILTIN: Lazy<NodeRegistry> = Lazy::new(|| {
    let definitions = NodeType::ALL.iter().map(|t| definition_for(*t)).collect();
    match NodeRegistry::from_definitions(definitions) {
        Ok(registry) => registry,
        Err(e) => panic!("built-in node registry is inconsistent: {}", e),
    }
});

/// Catalog of node types and their metadata
#[derive(Debug, Clone)]
pub struct NodeRegistry {
    definitions: Vec<NodeDefinition>,
    index: HashMap<NodeType, usize>,
}

impl NodeRegistry {
    /// The process-wide catalog of built-in node types
    pub fn builtin() -> &'static NodeRegistry {
        &BUILTIN
    }

    /// Build a registry from definitions, keeping their order
    ///
    /// Fails if a type is registered twice or if a default configuration
    /// does not satisfy its own shape.
    pub fn from_definitions(definitions: Vec<NodeDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(definitions.len());
        for (i, def) in definitions.iter().enumerate() {
            if index.insert(def.node_type, i).is_some() {
                return Err(GraphError::DuplicateNodeType(def.node_type.to_string()));
            }

            let violations = check_node_data(&def.default_config, def.shape);
            if let Some(first) = violations.first() {
                return Err(GraphError::InvalidDefault {
                    node_type: def.node_type.to_string(),
                    reason: first.message.clone(),
                });
            }
        }

        log::debug!("Built node registry with {} types", definitions.len());
        Ok(Self { definitions, index })
    }

    /// Definition of a node type
    pub fn lookup(&self, node_type: NodeType) -> Result<&NodeDefinition> {
        self.index
            .get(&node_type)
            .map(|&i| &self.definitions[i])
            .ok_or_else(|| GraphError::unknown_type(node_type.as_str()))
    }

    /// Definition of a node type given its wire tag
    pub fn lookup_tag(&self, tag: &str) -> Result<&NodeDefinition> {
        self.lookup(tag.parse()?)
    }

    /// Definitions in a category, in registration order
    pub fn list_by_category(&self, category: NodeCategory) -> Vec<&NodeDefinition> {
        self.definitions
            .iter()
            .filter(|d| d.category == category)
            .collect()
    }

    /// Whether a node type is registered
    pub fn is_registered(&self, node_type: NodeType) -> bool {
        self.index.contains_key(&node_type)
    }

    /// A fresh copy of a type's default configuration
    pub fn instantiate_default(&self, node_type: NodeType) -> Result<Value> {
        Ok(self.lookup(node_type)?.default_config.clone())
    }

    /// All definitions, in registration order
    pub fn definitions(&self) -> impl Iterator<Item = &NodeDefinition> {
        self.definitions.iter()
    }

    /// Number of registered types
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nodes::{ClickConfig, NavigateConfig};
    use crate::NodeVariant;

    #[test]
    fn test_builtin_has_every_type() {
        let registry = NodeRegistry::builtin();
        assert_eq!(registry.len(), NodeType::ALL.len());
        for node_type in NodeType::ALL {
            assert!(registry.is_registered(node_type));
            assert_eq!(registry.lookup(node_type).unwrap().node_type, node_type);
        }
    }

    #[test]
    fn test_list_by_category_keeps_order() {
        let registry = NodeRegistry::builtin();
        let triggers: Vec<NodeType> = registry
            .list_by_category(NodeCategory::Trigger)
            .iter()
            .map(|d| d.node_type)
            .collect();
        assert_eq!(
            triggers,
            vec![NodeType::ManualTrigger, NodeType::Webhook, NodeType::Schedule]
        );
        assert_eq!(registry.list_by_category(NodeCategory::Ai).len(), 1);
    }

    #[test]
    fn test_instantiate_default_is_a_copy() {
        let registry = NodeRegistry::builtin();
        let mut data = registry.instantiate_default(NodeType::Navigate).unwrap();
        data["url"] = "https://changed.example".into();

        let fresh = registry.instantiate_default(NodeType::Navigate).unwrap();
        assert_eq!(fresh["url"], "https://");
    }

    #[test]
    fn test_lookup_misses_are_errors() {
        let registry = NodeRegistry::from_definitions(vec![NavigateConfig::definition()]).unwrap();
        assert!(!registry.is_registered(NodeType::Click));
        assert!(matches!(
            registry.lookup(NodeType::Click),
            Err(GraphError::UnknownNodeType(t)) if t == "click"
        ));
        assert!(matches!(
            registry.lookup_tag("hover"),
            Err(GraphError::UnknownNodeType(t)) if t == "hover"
        ));
        assert!(registry.lookup_tag("navigate").is_ok());
    }

    #[test]
    fn test_duplicate_registration_rejected() {
        let result = NodeRegistry::from_definitions(vec![
            ClickConfig::definition(),
            ClickConfig::definition(),
        ]);
        assert!(matches!(result, Err(GraphError::DuplicateNodeType(t)) if t == "click"));
    }

    #[test]
    fn test_invalid_default_rejected() {
        let mut def = NavigateConfig::definition();
        def.default_config = serde_json::json!({"waitUntil": "load"});
        let result = NodeRegistry::from_definitions(vec![def]);
        assert!(matches!(
            result,
            Err(GraphError::InvalidDefault { node_type, .. }) if node_type == "navigate"
        ));
    }
}
