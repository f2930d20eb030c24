//! Method table and parameter schemas.

use super::{RpcError, RpcResult};
use crate::event::domain::EventType;
use crate::task::domain::TaskState;
use jsonschema::Validator;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Method served by the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    /// `agent.register`
    AgentRegister,
    /// `agent.unregister`
    AgentUnregister,
    /// `agent.get`
    AgentGet,
    /// `agent.discover`
    AgentDiscover,
    /// `task.create`
    TaskCreate,
    /// `task.get`
    TaskGet,
    /// `task.cancel`
    TaskCancel,
    /// `task.update_state`
    TaskUpdateState,
    /// `task.set_progress`
    TaskSetProgress,
    /// `task.list`
    TaskList,
    /// `channel.publish`
    ChannelPublish,
    /// `channel.subscribe_pattern`
    ChannelSubscribePattern,
    /// `channel.list`
    ChannelList,
    /// `channel.info`
    ChannelInfo,
    /// `channel.create`
    ChannelCreate,
    /// `channel.delete`
    ChannelDelete,
}

impl Method {
    /// Every served method.
    pub const ALL: [Self; 16] = [
        Self::AgentRegister,
        Self::AgentUnregister,
        Self::AgentGet,
        Self::AgentDiscover,
        Self::TaskCreate,
        Self::TaskGet,
        Self::TaskCancel,
        Self::TaskUpdateState,
        Self::TaskSetProgress,
        Self::TaskList,
        Self::ChannelPublish,
        Self::ChannelSubscribePattern,
        Self::ChannelList,
        Self::ChannelInfo,
        Self::ChannelCreate,
        Self::ChannelDelete,
    ];

    /// Returns the wire name of the method.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::AgentRegister => "agent.register",
            Self::AgentUnregister => "agent.unregister",
            Self::AgentGet => "agent.get",
            Self::AgentDiscover => "agent.discover",
            Self::TaskCreate => "task.create",
            Self::TaskGet => "task.get",
            Self::TaskCancel => "task.cancel",
            Self::TaskUpdateState => "task.update_state",
            Self::TaskSetProgress => "task.set_progress",
            Self::TaskList => "task.list",
            Self::ChannelPublish => "channel.publish",
            Self::ChannelSubscribePattern => "channel.subscribe_pattern",
            Self::ChannelList => "channel.list",
            Self::ChannelInfo => "channel.info",
            Self::ChannelCreate => "channel.create",
            Self::ChannelDelete => "channel.delete",
        }
    }

    /// Looks a method up by its exact wire name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|method| method.name() == name)
    }

    /// Returns the JSON Schema for the method's params object.
    #[must_use]
    pub fn params_schema(self) -> Value {
        match self {
            Self::AgentRegister => json!({
                "type": "object",
                "properties": {
                    "id": { "type": "string" },
                    "name": { "type": "string" },
                    "description": { "type": "string" },
                    "version": { "type": "string" },
                    "capabilities": { "type": "array", "items": { "type": "string" } },
                    "methods": { "type": "array", "items": { "type": "string" } },
                    "endpoint": { "type": "string" },
                    "protocol_version": { "type": "string" },
                    "security": {
                        "type": "object",
                        "properties": { "scheme": { "type": "string" } },
                        "required": ["scheme"]
                    }
                }
            }),
            Self::AgentUnregister | Self::AgentGet => json!({
                "type": "object",
                "properties": { "id": { "type": "string", "minLength": 1 } },
                "required": ["id"]
            }),
            Self::AgentDiscover => json!({
                "type": "object",
                "properties": {
                    "capabilities": { "type": "array", "items": { "type": "string" } },
                    "protocol_version": { "type": "string", "pattern": "\\S" },
                    "sort_by": { "enum": ["registered_at", "name", "id", "version"] },
                    "sort_direction": { "enum": ["asc", "desc"] },
                    "offset": { "type": "integer", "minimum": 0 },
                    "limit": { "type": "integer", "minimum": 1 }
                }
            }),
            Self::TaskCreate => json!({
                "type": "object",
                "properties": {
                    "owner": { "type": "string", "minLength": 1 },
                    "target": { "type": "string", "minLength": 1 }
                }
            }),
            Self::TaskGet | Self::TaskCancel => task_id_schema(),
            Self::TaskUpdateState => json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string" },
                    "state": { "enum": TaskState::ALL.map(TaskState::as_str) }
                },
                "required": ["task_id", "state"]
            }),
            Self::TaskSetProgress => json!({
                "type": "object",
                "properties": {
                    "task_id": { "type": "string" },
                    "progress": { "type": "number" }
                },
                "required": ["task_id", "progress"]
            }),
            Self::TaskList => json!({
                "type": "object",
                "properties": {
                    "owner": { "type": "string", "minLength": 1 },
                    "state": { "enum": TaskState::ALL.map(TaskState::as_str) }
                }
            }),
            Self::ChannelPublish => json!({
                "type": "object",
                "properties": {
                    "channel": { "type": "string" },
                    "sender": { "type": "string", "minLength": 1 }
                },
                "required": ["channel", "message"]
            }),
            Self::ChannelSubscribePattern => json!({
                "type": "object",
                "properties": {
                    "connection_id": { "type": "string" },
                    "pattern": { "type": "string" },
                    "task_id": { "type": "string" },
                    "agent_id": { "type": "string", "minLength": 1 },
                    "event_types": {
                        "type": "array",
                        "items": { "enum": EventType::ALL.map(EventType::as_str) }
                    }
                },
                "required": ["connection_id", "pattern"]
            }),
            Self::ChannelList => json!({
                "type": "object",
                "properties": { "pattern": { "type": "string" } }
            }),
            Self::ChannelInfo | Self::ChannelDelete => json!({
                "type": "object",
                "properties": { "channel": { "type": "string" } },
                "required": ["channel"]
            }),
            Self::ChannelCreate => json!({
                "type": "object",
                "properties": {
                    "channel": { "type": "string" },
                    "owner": { "type": "string", "minLength": 1 },
                    "metadata": { "type": "object" }
                },
                "required": ["channel"]
            }),
        }
    }
}

fn task_id_schema() -> Value {
    json!({
        "type": "object",
        "properties": { "task_id": { "type": "string" } },
        "required": ["task_id"]
    })
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A method schema failed to compile.
#[derive(Debug, Error)]
#[error("invalid params schema for {method}: {reason}")]
pub struct SchemaCompileError {
    /// Method whose schema was rejected.
    pub method: Method,
    /// Compiler message.
    pub reason: String,
}

/// Compiled params validators, one per method.
pub struct MethodRegistry {
    validators: HashMap<Method, Validator>,
}

impl MethodRegistry {
    /// Compiles the schema of every method.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaCompileError`] when a schema is not a valid JSON
    /// Schema document.
    pub fn new() -> Result<Self, SchemaCompileError> {
        let validators = Method::ALL
            .into_iter()
            .map(|method| {
                jsonschema::validator_for(&method.params_schema())
                    .map(|validator| (method, validator))
                    .map_err(|err| SchemaCompileError {
                        method,
                        reason: err.to_string(),
                    })
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { validators })
    }

    /// Validates `params` against the schema of `method`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcError::InvalidParams`] listing every violation as
    /// `{ "path", "message" }`.
    pub fn validate(&self, method: Method, params: &Value) -> RpcResult<()> {
        let Some(validator) = self.validators.get(&method) else {
            return Err(RpcError::MethodNotFound(method.name().to_owned()));
        };
        let violations: Vec<Value> = validator
            .iter_errors(params)
            .map(|error| {
                json!({
                    "path": error.instance_path.to_string(),
                    "message": error.to_string(),
                })
            })
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(RpcError::InvalidParams(Value::Array(violations)))
        }
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.validators.len())
            .finish()
    }
}
