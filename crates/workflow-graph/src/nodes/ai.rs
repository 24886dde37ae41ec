//! AI nodes

use serde::{Deserialize, Serialize};

use crate::descriptor::{NodeDefinition, NodeVariant};
use crate::shape::{FieldKind, FieldSpec};
use crate::types::{NodeCategory, NodeType, ValueKind};

/// Prompts a language model, optionally with tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AiAgentConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub model: String,
    pub prompt: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tools: Option<Vec<String>>,
}

impl Default for AiAgentConfig {
    fn default() -> Self {
        Self {
            label: None,
            model: "gpt-4o-mini".to_string(),
            prompt: String::new(),
            system_prompt: None,
            temperature: None,
            max_tokens: None,
            tools: None,
        }
    }
}

impl NodeVariant for AiAgentConfig {
    const NODE_TYPE: NodeType = NodeType::AiAgent;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("model", FieldKind::String),
        FieldSpec::required("prompt", FieldKind::String),
        FieldSpec::optional("systemPrompt", FieldKind::String),
        FieldSpec::optional("temperature", FieldKind::Number),
        FieldSpec::optional("maxTokens", FieldKind::Integer),
        FieldSpec::optional("tools", FieldKind::List(&FieldKind::String)),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Ai,
            "AI Agent",
            "Asks a language model and returns its answer",
        )
        .output("response", ValueKind::String)
        .output("usage", ValueKind::Object)
        .output("toolCalls", ValueKind::Array)
    }
}
