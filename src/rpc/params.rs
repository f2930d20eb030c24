//! Typed parameter objects decoded after schema validation.
//!
//! Identifiers arrive as plain strings and are converted into domain types by
//! the dispatcher, so a malformed identifier is reported as invalid params.

use crate::agent::domain::{SecurityScheme, SortDirection, SortField};
use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct RegisterAgentParams {
    pub id: Option<String>,
    pub name: String,
    pub description: String,
    pub version: String,
    pub capabilities: Vec<String>,
    pub methods: Vec<String>,
    pub endpoint: Option<String>,
    pub protocol_version: Option<String>,
    pub security: Option<SecurityScheme>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct AgentIdParams {
    pub id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct DiscoverAgentsParams {
    pub capabilities: Vec<String>,
    pub protocol_version: Option<String>,
    pub sort_by: SortField,
    pub sort_direction: SortDirection,
    pub offset: usize,
    pub limit: Option<usize>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct CreateTaskParams {
    pub owner: Option<String>,
    pub target: Option<String>,
    pub input: Value,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TaskIdParams {
    pub task_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateStateParams {
    pub task_id: String,
    pub state: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SetProgressParams {
    pub task_id: String,
    pub progress: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListTasksParams {
    pub owner: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PublishParams {
    pub channel: String,
    pub message: Value,
    #[serde(default)]
    pub sender: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SubscribePatternParams {
    pub connection_id: String,
    pub pattern: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub agent_id: Option<String>,
    #[serde(default)]
    pub event_types: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(crate) struct ListChannelsParams {
    pub pattern: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChannelNameParams {
    pub channel: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateChannelParams {
    pub channel: String,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}
