//! JSON-RPC error codes and service error mapping.

use super::envelope::RpcErrorObject;
use crate::agent::services::AgentRegistryServiceError;
use crate::channel::services::ChannelBridgeError;
use crate::stream::ports::SubscriptionError;
use crate::task::{domain::TaskDomainError, services::TaskLedgerError};
use serde_json::{Value, json};
use std::fmt;
use thiserror::Error;

/// Numeric error codes.
pub mod codes {
    /// The body is not valid JSON.
    pub const PARSE_ERROR: i64 = -32700;
    /// The JSON is not a valid request envelope.
    pub const INVALID_REQUEST: i64 = -32600;
    /// The method is not registered.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// The params do not satisfy the method schema.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Unexpected server-side fault.
    pub const INTERNAL_ERROR: i64 = -32603;
    /// The addressed agent, task, channel or connection does not exist.
    pub const NOT_FOUND: i64 = -32001;
    /// The Agent Card is missing a required field or is malformed.
    pub const INVALID_CARD: i64 = -32002;
    /// The task state machine rejected the transition.
    pub const INVALID_STATE_TRANSITION: i64 = -32003;
    /// Progress was reported for a task that is not working.
    pub const PROGRESS_REQUIRES_WORKING: i64 = -32004;
    /// The channel name or subscription pattern is malformed.
    pub const INVALID_CHANNEL: i64 = -32005;
    /// The channel already exists.
    pub const CHANNEL_EXISTS: i64 = -32006;
    /// The caller may not invoke the method.
    pub const UNAUTHORIZED: i64 = -32010;
}

/// Result type for method handlers.
pub type RpcResult<T> = Result<T, RpcError>;

/// Error answered to an RPC caller.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RpcError {
    /// The body is not valid JSON.
    #[error("Parse error: {0}")]
    Parse(String),
    /// The JSON is not a valid request envelope.
    #[error("Invalid Request: {0}")]
    InvalidRequest(String),
    /// The method is not registered.
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    /// The params are invalid; the value lists the violations.
    #[error("Invalid params")]
    InvalidParams(Value),
    /// Unexpected fault. Details are logged, never returned.
    #[error("Internal error")]
    Internal,
    /// The addressed resource does not exist.
    #[error("{0}")]
    NotFound(String),
    /// The Agent Card is invalid.
    #[error("{0}")]
    InvalidCard(String),
    /// The task state machine rejected the transition.
    #[error("{0}")]
    InvalidStateTransition(String),
    /// Progress requires the task to be working.
    #[error("{0}")]
    ProgressRequiresWorking(String),
    /// The channel name or pattern is invalid.
    #[error("{0}")]
    InvalidChannel(String),
    /// The channel already exists.
    #[error("{0}")]
    ChannelExists(String),
    /// The caller is not authorized.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
}

impl RpcError {
    /// Creates an invalid request error.
    pub fn invalid_request(detail: impl Into<String>) -> Self {
        Self::InvalidRequest(detail.into())
    }

    /// Creates an invalid params error carrying one message.
    pub fn invalid_params(detail: &dyn fmt::Display) -> Self {
        Self::InvalidParams(json!([{ "path": "", "message": detail.to_string() }]))
    }

    /// Logs an internal fault and returns the generic error.
    pub fn internal(fault: &dyn fmt::Display) -> Self {
        tracing::error!(error = %fault, "internal fault while handling rpc request");
        Self::Internal
    }

    /// Returns the numeric error code.
    #[must_use]
    pub const fn code(&self) -> i64 {
        match self {
            Self::Parse(_) => codes::PARSE_ERROR,
            Self::InvalidRequest(_) => codes::INVALID_REQUEST,
            Self::MethodNotFound(_) => codes::METHOD_NOT_FOUND,
            Self::InvalidParams(_) => codes::INVALID_PARAMS,
            Self::Internal => codes::INTERNAL_ERROR,
            Self::NotFound(_) => codes::NOT_FOUND,
            Self::InvalidCard(_) => codes::INVALID_CARD,
            Self::InvalidStateTransition(_) => codes::INVALID_STATE_TRANSITION,
            Self::ProgressRequiresWorking(_) => codes::PROGRESS_REQUIRES_WORKING,
            Self::InvalidChannel(_) => codes::INVALID_CHANNEL,
            Self::ChannelExists(_) => codes::CHANNEL_EXISTS,
            Self::Unauthorized(_) => codes::UNAUTHORIZED,
        }
    }

    /// Returns whether the error reports a server fault rather than a bad
    /// request.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal)
    }

    pub(crate) fn to_object(&self) -> RpcErrorObject {
        let data = match self {
            Self::InvalidParams(violations) => Some(violations.clone()),
            _ => None,
        };
        RpcErrorObject {
            code: self.code(),
            message: self.to_string(),
            data,
        }
    }
}

impl From<AgentRegistryServiceError> for RpcError {
    fn from(err: AgentRegistryServiceError) -> Self {
        match err {
            AgentRegistryServiceError::Domain(domain) => Self::InvalidCard(domain.to_string()),
            AgentRegistryServiceError::InvalidFilter(_) => Self::invalid_params(&err),
            AgentRegistryServiceError::NotFound(_) => Self::NotFound(err.to_string()),
            AgentRegistryServiceError::Repository(fault) => Self::internal(&fault),
        }
    }
}

impl From<TaskLedgerError> for RpcError {
    fn from(err: TaskLedgerError) -> Self {
        match err {
            TaskLedgerError::Domain(domain) => domain.into(),
            TaskLedgerError::InvalidState(parse) => Self::invalid_params(&parse),
            TaskLedgerError::NotFound(_) => Self::NotFound(err.to_string()),
            TaskLedgerError::Repository(fault) => Self::internal(&fault),
        }
    }
}

impl From<TaskDomainError> for RpcError {
    fn from(err: TaskDomainError) -> Self {
        match err {
            TaskDomainError::InvalidStateTransition { .. } => {
                Self::InvalidStateTransition(err.to_string())
            }
            TaskDomainError::ProgressRequiresWorking { .. } => {
                Self::ProgressRequiresWorking(err.to_string())
            }
            TaskDomainError::NonFiniteProgress | TaskDomainError::InvalidTaskId(_) => {
                Self::invalid_params(&err)
            }
        }
    }
}

impl From<ChannelBridgeError> for RpcError {
    fn from(err: ChannelBridgeError) -> Self {
        match err {
            ChannelBridgeError::Domain(domain) => Self::InvalidChannel(domain.to_string()),
            ChannelBridgeError::Exists(_) => Self::ChannelExists(err.to_string()),
            ChannelBridgeError::NotFound(_) => Self::NotFound(err.to_string()),
            ChannelBridgeError::Subscription(subscription) => subscription.into(),
            ChannelBridgeError::Repository(fault) => Self::internal(&fault),
        }
    }
}

impl From<SubscriptionError> for RpcError {
    fn from(err: SubscriptionError) -> Self {
        match err {
            SubscriptionError::UnknownConnection(_) => Self::NotFound(err.to_string()),
            SubscriptionError::NotOwner(_) => Self::Unauthorized(err.to_string()),
            SubscriptionError::LockPoisoned => Self::internal(&err),
        }
    }
}
