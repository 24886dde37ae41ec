//! Integration nodes
//!
//! Calls to external services.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::descriptor::{NodeDefinition, NodeVariant};
use crate::shape::{FieldKind, FieldSpec};
use crate::types::{NodeCategory, NodeType, ValueKind};

/// HTTP verb, shared by the request node and the webhook trigger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub(crate) const TAGS: &'static [&'static str] = &["GET", "POST", "PUT", "PATCH", "DELETE"];
}

/// Performs an HTTP request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct HttpRequestConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub url: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl NodeVariant for HttpRequestConfig {
    const NODE_TYPE: NodeType = NodeType::HttpRequest;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("url", FieldKind::String),
        FieldSpec::required("method", FieldKind::Enum(HttpMethod::TAGS)),
        FieldSpec::optional("headers", FieldKind::Map(&FieldKind::String)),
        FieldSpec::optional("body", FieldKind::String),
        FieldSpec::optional("timeoutMs", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Integration,
            "HTTP Request",
            "Calls an HTTP endpoint and exposes the response",
        )
        .output("status", ValueKind::Number)
        .output("body", ValueKind::Object)
        .output("headers", ValueKind::Object)
    }
}
