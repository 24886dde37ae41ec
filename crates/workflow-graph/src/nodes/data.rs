//! Data nodes
//!
//! Workflow variables and user scripts.

use serde::{Deserialize, Serialize};

use crate::descriptor::{NodeDefinition, NodeVariant};
use crate::shape::{FieldKind, FieldSpec};
use crate::types::{NodeCategory, NodeType, ValueKind};

/// How a set-variable node interprets its value
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VariableValueType {
    #[default]
    String,
    Number,
    Boolean,
    Json,
}

impl VariableValueType {
    const TAGS: &'static [&'static str] = &["string", "number", "boolean", "json"];
}

/// Assigns a workflow variable, readable downstream as `$vars.<name>`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SetVariableConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub name: String,
    pub value: String,
    pub value_type: VariableValueType,
}

impl NodeVariant for SetVariableConfig {
    const NODE_TYPE: NodeType = NodeType::SetVariable;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("name", FieldKind::String),
        FieldSpec::required("value", FieldKind::String),
        FieldSpec::required("valueType", FieldKind::Enum(VariableValueType::TAGS)),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Data,
            "Set Variable",
            "Stores a value in a workflow variable",
        )
        .output("name", ValueKind::String)
        .output("value", ValueKind::String)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptLanguage {
    #[default]
    Javascript,
}

impl ScriptLanguage {
    const TAGS: &'static [&'static str] = &["javascript"];
}

/// Runs a user-supplied script against the node inputs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScriptConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub language: ScriptLanguage,
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            label: None,
            language: ScriptLanguage::Javascript,
            code: "return $input;".to_string(),
            timeout_ms: None,
        }
    }
}

impl NodeVariant for ScriptConfig {
    const NODE_TYPE: NodeType = NodeType::Script;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("language", FieldKind::Enum(ScriptLanguage::TAGS)),
        FieldSpec::required("code", FieldKind::String),
        FieldSpec::optional("timeoutMs", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Data,
            "Script",
            "Runs custom code",
        )
        .output("result", ValueKind::Object)
        .output("logs", ValueKind::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_variable_wire_names() {
        let config: SetVariableConfig = serde_json::from_value(json!({
            "name": "token",
            "value": "{{$input.login.body}}",
            "valueType": "json",
        }))
        .unwrap();
        assert_eq!(config.value_type, VariableValueType::Json);
    }

    #[test]
    fn test_script_default_language() {
        let def = ScriptConfig::definition();
        assert_eq!(def.default_config["language"], "javascript");
    }
}
