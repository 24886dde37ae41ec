//! Trigger nodes
//!
//! Entry points of a workflow. Triggers accept no incoming edges and are
//! the only nodes allowed to have none.

use serde::{Deserialize, Serialize};

use super::integration::HttpMethod;
use crate::descriptor::{NodeDefinition, NodeVariant};
use crate::shape::{FieldKind, FieldSpec};
use crate::types::{NodeCategory, NodeType, ValueKind};

/// Started by hand from the editor or API
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ManualTriggerConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodeVariant for ManualTriggerConfig {
    const NODE_TYPE: NodeType = NodeType::ManualTrigger;
    const SHAPE: &'static [FieldSpec] = &[];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Trigger,
            "Manual Trigger",
            "Starts the workflow on demand",
        )
        .output("triggeredAt", ValueKind::String)
        .output("payload", ValueKind::Object)
        .without_input()
    }
}

/// Started by an incoming HTTP call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WebhookConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub path: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret: Option<String>,
}

impl Default for WebhookConfig {
    fn default() -> Self {
        Self {
            label: None,
            path: "/hooks/workflow".to_string(),
            method: HttpMethod::Post,
            secret: None,
        }
    }
}

impl NodeVariant for WebhookConfig {
    const NODE_TYPE: NodeType = NodeType::Webhook;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("path", FieldKind::String),
        FieldSpec::required("method", FieldKind::Enum(HttpMethod::TAGS)),
        FieldSpec::optional("secret", FieldKind::String),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Trigger,
            "Webhook",
            "Starts the workflow when an HTTP request arrives",
        )
        .output("body", ValueKind::Object)
        .output("headers", ValueKind::Object)
        .output("query", ValueKind::Object)
        .output("method", ValueKind::String)
        .without_input()
    }
}

/// Started on a cron schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScheduleConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub cron: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            label: None,
            cron: "0 * * * *".to_string(),
            timezone: None,
        }
    }
}

impl NodeVariant for ScheduleConfig {
    const NODE_TYPE: NodeType = NodeType::Schedule;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("cron", FieldKind::String),
        FieldSpec::optional("timezone", FieldKind::String),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Trigger,
            "Schedule",
            "Starts the workflow on a cron schedule",
        )
        .output("firedAt", ValueKind::String)
        .without_input()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triggers_accept_no_input() {
        assert!(!ManualTriggerConfig::definition().accepts_input);
        assert!(!WebhookConfig::definition().accepts_input);
        assert!(!ScheduleConfig::definition().accepts_input);
    }

    #[test]
    fn test_webhook_default_config() {
        let def = WebhookConfig::definition();
        assert_eq!(def.default_config["method"], "POST");
        assert!(def.default_config.get("secret").is_none());
    }
}
