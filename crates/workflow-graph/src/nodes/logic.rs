//! Logic nodes
//!
//! Control flow: branching, iteration and joins. These are the only nodes
//! with more than one output handle.

use serde::{Deserialize, Serialize};

use crate::descriptor::{NodeDefinition, NodeVariant, OutputHandles};
use crate::shape::{FieldKind, FieldSpec};
use crate::types::{NodeCategory, NodeType, ValueKind};

/// Handle taken when a condition holds
pub const TRUE_HANDLE: &str = "true";
/// Handle taken when a condition does not hold
pub const FALSE_HANDLE: &str = "false";
/// Handle followed once per loop element
pub const BODY_HANDLE: &str = "body";
/// Handle followed after the last loop element
pub const DONE_HANDLE: &str = "done";

/// Comparison applied by a condition node
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConditionOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    GreaterThan,
    LessThan,
    Exists,
    IsEmpty,
}

impl ConditionOperator {
    const TAGS: &'static [&'static str] = &[
        "equals",
        "notEquals",
        "contains",
        "greaterThan",
        "lessThan",
        "exists",
        "isEmpty",
    ];

    /// Whether the operator compares against a right-hand value
    pub fn is_binary(&self) -> bool {
        !matches!(self, ConditionOperator::Exists | ConditionOperator::IsEmpty)
    }
}

/// Routes to `true` or `false` depending on a comparison
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConditionConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub left: String,
    pub operator: ConditionOperator,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub right: Option<String>,
}

impl NodeVariant for ConditionConfig {
    const NODE_TYPE: NodeType = NodeType::Condition;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("left", FieldKind::String),
        FieldSpec::required("operator", FieldKind::Enum(ConditionOperator::TAGS)),
        FieldSpec::optional("right", FieldKind::String),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Logic,
            "Condition",
            "Branches on a comparison",
        )
        .output("result", ValueKind::Boolean)
        .handles(OutputHandles::Fixed {
            handles: &[TRUE_HANDLE, FALSE_HANDLE],
        })
    }
}

/// Runs its `body` branch once per element of a list
///
/// Nodes on the body branch see the current element as `$item`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LoopConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Expression yielding the list to iterate
    pub items: String,
    pub max_iterations: u64,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            label: None,
            items: String::new(),
            max_iterations: 100,
        }
    }
}

impl NodeVariant for LoopConfig {
    const NODE_TYPE: NodeType = NodeType::Loop;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("items", FieldKind::String),
        FieldSpec::required("maxIterations", FieldKind::Integer),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Logic,
            "Loop",
            "Repeats the body branch for each item of a list",
        )
        .output("item", ValueKind::Object)
        .output("index", ValueKind::Number)
        .output("results", ValueKind::Array)
        .handles(OutputHandles::Fixed {
            handles: &[BODY_HANDLE, DONE_HANDLE],
        })
    }
}

/// One branch of a switch node
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SwitchCase {
    pub value: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

const SWITCH_CASE_SHAPE: &[FieldSpec] = &[
    FieldSpec::required("value", FieldKind::String),
    FieldSpec::optional("label", FieldKind::String),
];

/// Routes to the first case whose value matches, else to `default`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SwitchConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub value: String,
    pub cases: Vec<SwitchCase>,
}

impl NodeVariant for SwitchConfig {
    const NODE_TYPE: NodeType = NodeType::Switch;
    const SHAPE: &'static [FieldSpec] = &[
        FieldSpec::required("value", FieldKind::String),
        FieldSpec::required("cases", FieldKind::List(&FieldKind::Record(SWITCH_CASE_SHAPE))),
    ];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Logic,
            "Switch",
            "Routes to one of several branches by value",
        )
        .output("matched", ValueKind::String)
        .output("value", ValueKind::String)
        .handles(OutputHandles::PerCase {
            field: "cases",
            prefix: "case-",
            fallback: "default",
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MergeMode {
    /// Continue once every incoming branch has finished
    #[default]
    WaitAll,
    /// Continue with whichever branch finishes first
    First,
}

impl MergeMode {
    const TAGS: &'static [&'static str] = &["waitAll", "first"];
}

/// Joins several branches back into one
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MergeConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub mode: MergeMode,
}

impl NodeVariant for MergeConfig {
    const NODE_TYPE: NodeType = NodeType::Merge;
    const SHAPE: &'static [FieldSpec] =
        &[FieldSpec::required("mode", FieldKind::Enum(MergeMode::TAGS))];

    fn definition() -> NodeDefinition {
        NodeDefinition::for_variant::<Self>(
            NodeCategory::Logic,
            "Merge",
            "Joins parallel branches",
        )
        .output("merged", ValueKind::Object)
        .output("inputs", ValueKind::Array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_condition_handles() {
        let def = ConditionConfig::definition();
        assert_eq!(def.output_handles.handles(&def.default_config), vec!["true", "false"]);
    }

    #[test]
    fn test_switch_handles_track_cases() {
        let def = SwitchConfig::definition();
        assert_eq!(def.output_handles.handles(&def.default_config), vec!["default"]);

        let config = SwitchConfig {
            label: None,
            value: "{{$input.n1.status}}".to_string(),
            cases: vec![
                SwitchCase {
                    value: "200".to_string(),
                    label: Some("ok".to_string()),
                },
                SwitchCase {
                    value: "404".to_string(),
                    label: None,
                },
            ],
        };
        let data = serde_json::to_value(&config).unwrap();
        assert_eq!(
            def.output_handles.handles(&data),
            vec!["case-0", "case-1", "default"]
        );
    }

    #[test]
    fn test_operator_tags() {
        for tag in ConditionOperator::TAGS {
            let op: ConditionOperator = serde_json::from_value(json!(tag)).unwrap();
            assert_eq!(serde_json::to_value(op).unwrap(), json!(tag));
        }
        assert!(!ConditionOperator::Exists.is_binary());
        assert!(ConditionOperator::GreaterThan.is_binary());
    }

    #[test]
    fn test_loop_default() {
        let def = LoopConfig::definition();
        assert_eq!(def.default_config["maxIterations"], 100);
        assert_eq!(def.category, NodeCategory::Logic);
    }
}
