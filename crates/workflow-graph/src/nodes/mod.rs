//! Node variants
//!
//! Typed configurations for every built-in node type, grouped by category.
//!
//! # Categories
//!
//! - **Trigger**: entry points (manual, webhook, schedule)
//! - **Browser**: page actions (navigate, click, type, extract, ...)
//! - **Logic**: control flow (condition, loop, switch, merge)
//! - **Data**: variables and scripts
//! - **Integration**: external HTTP calls
//! - **AI**: language model agents
//!
//! Graphs store node data as raw JSON. [`NodeConfig::parse`] is the typed
//! view an executor reads once the validator has accepted the graph.

pub mod ai;
pub mod browser;
pub mod data;
pub mod integration;
pub mod logic;
pub mod trigger;

pub use ai::*;
pub use browser::*;
pub use data::*;
pub use integration::*;
pub use logic::*;
pub use trigger::*;

use serde_json::Value;

use crate::descriptor::{NodeDefinition, NodeVariant};
use crate::error::{GraphError, Result};
use crate::types::NodeType;

/// Registry metadata for a built-in node type
pub fn definition_for(node_type: NodeType) -> NodeDefinition {
    match node_type {
        NodeType::ManualTrigger => ManualTriggerConfig::definition(),
        NodeType::Webhook => WebhookConfig::definition(),
        NodeType::Schedule => ScheduleConfig::definition(),
        NodeType::Navigate => NavigateConfig::definition(),
        NodeType::Click => ClickConfig::definition(),
        NodeType::TypeText => TypeTextConfig::definition(),
        NodeType::Extract => ExtractConfig::definition(),
        NodeType::Screenshot => ScreenshotConfig::definition(),
        NodeType::WaitFor => WaitForConfig::definition(),
        NodeType::Scroll => ScrollConfig::definition(),
        NodeType::Condition => ConditionConfig::definition(),
        NodeType::Loop => LoopConfig::definition(),
        NodeType::Switch => SwitchConfig::definition(),
        NodeType::Merge => MergeConfig::definition(),
        NodeType::SetVariable => SetVariableConfig::definition(),
        NodeType::Script => ScriptConfig::definition(),
        NodeType::HttpRequest => HttpRequestConfig::definition(),
        NodeType::AiAgent => AiAgentConfig::definition(),
    }
}

/// A node's configuration, typed by its node type
#[derive(Debug, Clone, PartialEq)]
pub enum NodeConfig {
    ManualTrigger(ManualTriggerConfig),
    Webhook(WebhookConfig),
    Schedule(ScheduleConfig),
    Navigate(NavigateConfig),
    Click(ClickConfig),
    TypeText(TypeTextConfig),
    Extract(ExtractConfig),
    Screenshot(ScreenshotConfig),
    WaitFor(WaitForConfig),
    Scroll(ScrollConfig),
    Condition(ConditionConfig),
    Loop(LoopConfig),
    Switch(SwitchConfig),
    Merge(MergeConfig),
    SetVariable(SetVariableConfig),
    Script(ScriptConfig),
    HttpRequest(HttpRequestConfig),
    AiAgent(AiAgentConfig),
}

fn typed<T: NodeVariant>(data: &Value) -> Result<T> {
    serde_json::from_value(data.clone()).map_err(|e| GraphError::InvalidConfig {
        node_type: T::NODE_TYPE.to_string(),
        reason: e.to_string(),
    })
}

impl NodeConfig {
    /// Read raw node data as the configuration of `node_type`
    pub fn parse(node_type: NodeType, data: &Value) -> Result<Self> {
        Ok(match node_type {
            NodeType::ManualTrigger => NodeConfig::ManualTrigger(typed(data)?),
            NodeType::Webhook => NodeConfig::Webhook(typed(data)?),
            NodeType::Schedule => NodeConfig::Schedule(typed(data)?),
            NodeType::Navigate => NodeConfig::Navigate(typed(data)?),
            NodeType::Click => NodeConfig::Click(typed(data)?),
            NodeType::TypeText => NodeConfig::TypeText(typed(data)?),
            NodeType::Extract => NodeConfig::Extract(typed(data)?),
            NodeType::Screenshot => NodeConfig::Screenshot(typed(data)?),
            NodeType::WaitFor => NodeConfig::WaitFor(typed(data)?),
            NodeType::Scroll => NodeConfig::Scroll(typed(data)?),
            NodeType::Condition => NodeConfig::Condition(typed(data)?),
            NodeType::Loop => NodeConfig::Loop(typed(data)?),
            NodeType::Switch => NodeConfig::Switch(typed(data)?),
            NodeType::Merge => NodeConfig::Merge(typed(data)?),
            NodeType::SetVariable => NodeConfig::SetVariable(typed(data)?),
            NodeType::Script => NodeConfig::Script(typed(data)?),
            NodeType::HttpRequest => NodeConfig::HttpRequest(typed(data)?),
            NodeType::AiAgent => NodeConfig::AiAgent(typed(data)?),
        })
    }

    /// The default configuration of `node_type`
    pub fn default_for(node_type: NodeType) -> Self {
        match node_type {
            NodeType::ManualTrigger => NodeConfig::ManualTrigger(Default::default()),
            NodeType::Webhook => NodeConfig::Webhook(Default::default()),
            NodeType::Schedule => NodeConfig::Schedule(Default::default()),
            NodeType::Navigate => NodeConfig::Navigate(Default::default()),
            NodeType::Click => NodeConfig::Click(Default::default()),
            NodeType::TypeText => NodeConfig::TypeText(Default::default()),
            NodeType::Extract => NodeConfig::Extract(Default::default()),
            NodeType::Screenshot => NodeConfig::Screenshot(Default::default()),
            NodeType::WaitFor => NodeConfig::WaitFor(Default::default()),
            NodeType::Scroll => NodeConfig::Scroll(Default::default()),
            NodeType::Condition => NodeConfig::Condition(Default::default()),
            NodeType::Loop => NodeConfig::Loop(Default::default()),
            NodeType::Switch => NodeConfig::Switch(Default::default()),
            NodeType::Merge => NodeConfig::Merge(Default::default()),
            NodeType::SetVariable => NodeConfig::SetVariable(Default::default()),
            NodeType::Script => NodeConfig::Script(Default::default()),
            NodeType::HttpRequest => NodeConfig::HttpRequest(Default::default()),
            NodeType::AiAgent => NodeConfig::AiAgent(Default::default()),
        }
    }

    /// The node type this configuration belongs to
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeConfig::ManualTrigger(_) => NodeType::ManualTrigger,
            NodeConfig::Webhook(_) => NodeType::Webhook,
            NodeConfig::Schedule(_) => NodeType::Schedule,
            NodeConfig::Navigate(_) => NodeType::Navigate,
            NodeConfig::Click(_) => NodeType::Click,
            NodeConfig::TypeText(_) => NodeType::TypeText,
            NodeConfig::Extract(_) => NodeType::Extract,
            NodeConfig::Screenshot(_) => NodeType::Screenshot,
            NodeConfig::WaitFor(_) => NodeType::WaitFor,
            NodeConfig::Scroll(_) => NodeType::Scroll,
            NodeConfig::Condition(_) => NodeType::Condition,
            NodeConfig::Loop(_) => NodeType::Loop,
            NodeConfig::Switch(_) => NodeType::Switch,
            NodeConfig::Merge(_) => NodeType::Merge,
            NodeConfig::SetVariable(_) => NodeType::SetVariable,
            NodeConfig::Script(_) => NodeType::Script,
            NodeConfig::HttpRequest(_) => NodeType::HttpRequest,
            NodeConfig::AiAgent(_) => NodeType::AiAgent,
        }
    }

    /// Serialize back to node data
    pub fn to_data(&self) -> Result<Value> {
        let value = match self {
            NodeConfig::ManualTrigger(c) => serde_json::to_value(c),
            NodeConfig::Webhook(c) => serde_json::to_value(c),
            NodeConfig::Schedule(c) => serde_json::to_value(c),
            NodeConfig::Navigate(c) => serde_json::to_value(c),
            NodeConfig::Click(c) => serde_json::to_value(c),
            NodeConfig::TypeText(c) => serde_json::to_value(c),
            NodeConfig::Extract(c) => serde_json::to_value(c),
            NodeConfig::Screenshot(c) => serde_json::to_value(c),
            NodeConfig::WaitFor(c) => serde_json::to_value(c),
            NodeConfig::Scroll(c) => serde_json::to_value(c),
            NodeConfig::Condition(c) => serde_json::to_value(c),
            NodeConfig::Loop(c) => serde_json::to_value(c),
            NodeConfig::Switch(c) => serde_json::to_value(c),
            NodeConfig::Merge(c) => serde_json::to_value(c),
            NodeConfig::SetVariable(c) => serde_json::to_value(c),
            NodeConfig::Script(c) => serde_json::to_value(c),
            NodeConfig::HttpRequest(c) => serde_json::to_value(c),
            NodeConfig::AiAgent(c) => serde_json::to_value(c),
        }?;
        Ok(value)
    }
}
