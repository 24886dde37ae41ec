//! Browser nodes
//!
//! Page-level actions. Only their configuration lives here; what an action
//! does to a page is up to the executor.

use serde::{Deserialize, Serialize};

use crate::descriptor::{NodeDefinition, NodeVariant};
use crate::shape::{FieldKind, FieldSpec};
use crate::types::{NodeCategory, NodeType, ValueKind};

/// Page load milestone to wait for after navigating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitUntil {
    #[default]
    Load,
    DomContentLoaded,
    NetworkIdle,
}

impl WaitUntil {
    const TAGS: &'static [&'static str] = &["load", "domcontentloaded", "networkidle"];
}

/// Opens a URL in the current tab
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NavigateConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub url: String,
    pub wait_until: WaitUntil,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for NavigateConfig {
    fn default() -> Self {
        Self {
            label: None,
            url: "https://".to_string(),
            wait_until: WaitUntil::Load,
            timeout_ms: None,
        }
    }
}

impl NodeVariant for NavigateConfig {
    const NODE_TYPE: NodeType = NodeType::Navigate;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("url", FieldKind::String),
        FieldSpec::required("waitUntil", FieldKind::Enum(WaitUntil::TAGS)),
        FieldSpec::optional("timeoutMs", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Navigate",
            "Opens a URL and waits for the page to load",
        )
        .output("url", ValueKind::String)
        .output("title", ValueKind::String)
        .output("status", ValueKind::Number)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

impl MouseButton {
    const TAGS: &'static [&'static str] = &["left", "right", "middle"];
}

/// Clicks the element matching a selector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ClickConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub selector: String,
    pub button: MouseButton,
    pub click_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            label: None,
            selector: String::new(),
            button: MouseButton::Left,
            click_count: 1,
            timeout_ms: None,
        }
    }
}

impl NodeVariant for ClickConfig {
    const NODE_TYPE: NodeType = NodeType::Click;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("selector", FieldKind::String),
        FieldSpec::required("button", FieldKind::Enum(MouseButton::TAGS)),
        FieldSpec::required("clickCount", FieldKind::Integer),
        FieldSpec::optional("timeoutMs", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Click",
            "Clicks an element on the page",
        )
        .output("clicked", ValueKind::Boolean)
        .output("selector", ValueKind::String)
    }
}

/// Types text into an input element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct TypeTextConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub selector: String,
    pub text: String,
    pub clear_first: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl NodeVariant for TypeTextConfig {
    const NODE_TYPE: NodeType = NodeType::TypeText;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("selector", FieldKind::String),
        FieldSpec::required("text", FieldKind::String),
        FieldSpec::required("clearFirst", FieldKind::Boolean),
        FieldSpec::optional("delayMs", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Type Text",
            "Types text into an input field",
        )
        .output("selector", ValueKind::String)
        .output("text", ValueKind::String)
    }
}

/// One named value pulled from the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Extraction {
    pub name: String,
    pub selector: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub multiple: Option<bool>,
}

const EXTRACTION_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("name", FieldKind::String),
    FieldSpec::required("selector", FieldKind::String),
    FieldSpec::optional("attribute", FieldKind::String),
    FieldSpec::optional("multiple", FieldKind::Boolean),
];

/// Extracts text or attributes from elements
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ExtractConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub extractions: Vec<Extraction>,
}

impl NodeVariant for ExtractConfig {
    const NODE_TYPE: NodeType = NodeType::Extract;
    const SHAPE: &'static [FieldSpec] = &[FieldSpec::required(
        "extractions",
        FieldKind::List(&FieldKind::Record(EXTRACTION_SHAPE)),
    )];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Extract",
            "Extracts structured data from the page",
        )
        .output("data", ValueKind::Object)
        .output("count", ValueKind::Number)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Png,
    Jpeg,
}

impl ImageFormat {
    const TAGS: &'static [&'static str] = &["png", "jpeg"];
}

/// Captures the page or one element as an image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScreenshotConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub full_page: bool,
    pub format: ImageFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl NodeVariant for ScreenshotConfig {
    const NODE_TYPE: NodeType = NodeType::Screenshot;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("fullPage", FieldKind::Boolean),
        FieldSpec::required("format", FieldKind::Enum(ImageFormat::TAGS)),
        FieldSpec::optional("selector", FieldKind::String),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Screenshot",
            "Captures a screenshot of the page or an element",
        )
        .output("image", ValueKind::String)
        .output("width", ValueKind::Number)
        .output("height", ValueKind::Number)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaitMode {
    #[default]
    Time,
    Selector,
    Navigation,
}

impl WaitMode {
    const TAGS: &'static [&'static str] = &["time", "selector", "navigation"];
}

/// Pauses until time passes, an element appears, or navigation finishes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct WaitForConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub mode: WaitMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
}

impl Default for WaitForConfig {
    fn default() -> Self {
        Self {
            label: None,
            mode: WaitMode::Time,
            duration_ms: Some(1000),
            selector: None,
            timeout_ms: None,
        }
    }
}

impl NodeVariant for WaitForConfig {
    const NODE_TYPE: NodeType = NodeType::WaitFor;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("mode", FieldKind::Enum(WaitMode::TAGS)),
        FieldSpec::optional("durationMs", FieldKind::Integer),
        FieldSpec::optional("selector", FieldKind::String),
        FieldSpec::optional("timeoutMs", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Wait",
            "Waits for a duration, an element, or a navigation",
        )
        .output("waitedMs", ValueKind::Number)
        .output("found", ValueKind::Boolean)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    #[default]
    Down,
    Top,
    Bottom,
}

impl ScrollDirection {
    const TAGS: &'static [&'static str] = &["up", "down", "top", "bottom"];
}

/// Scrolls the page or a scrollable element
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ScrollConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub direction: ScrollDirection,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

impl NodeVariant for ScrollConfig {
    const NODE_TYPE: NodeType = NodeType::Scroll;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("direction", FieldKind::Enum(ScrollDirection::TAGS)),
        FieldSpec::optional("amount", FieldKind::Integer),
        FieldSpec::optional("selector", FieldKind::String),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Browser,
            "Scroll",
            "Scrolls the page or an element",
        )
        .output("scrollY", ValueKind::Number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::check_node_data;
    use serde_json::json;

    #[test]
    fn test_navigate_exposes_title() {
        let def = NavigateConfig::definition();
        assert_eq!(def.output_kind("title"), Some(ValueKind::String));
        assert_eq!(def.default_config["waitUntil"], "load");
    }

    #[test]
    fn test_extraction_fields_are_checked() {
        let data = json!({
            "extractions": [
                {"name": "title", "selector": "h1"},
                {"name": "links", "selector": "a", "attribute": "href", "multiple": true, "xpath": "//a"},
            ]
        });
        let violations = check_node_data(&data, ExtractConfig::SHAPE);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "extractions[1].xpath");

        let config: std::result::Result<ExtractConfig, _> = serde_json::from_value(data);
        assert!(config.is_err(), "typed parse also rejects unknown fields");
    }

    #[test]
    fn test_wait_until_tags() {
        for tag in WaitUntil::TAGS {
            let parsed: WaitUntil = serde_json::from_value(json!(tag)).unwrap();
            assert_eq!(serde_json::to_value(parsed).unwrap(), json!(tag));
        }
    }
}
