//! Error types for Agent Card validation and parsing.

use thiserror::Error;

/// Errors returned while constructing Agent Card values.
///
/// Every variant describes an invalid card; the RPC boundary reports all of
/// them under a single `InvalidCard` code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AgentDomainError {
    /// The agent identifier is missing or empty after trimming.
    #[error("agent card id must not be empty")]
    MissingAgentId,

    /// The endpoint is missing or empty after trimming.
    #[error("agent card endpoint must not be empty")]
    MissingEndpoint,

    /// The endpoint is not an absolute URI.
    #[error("agent card endpoint '{0}' is not an absolute URI")]
    InvalidEndpoint(String),

    /// The protocol version is missing or empty after trimming.
    #[error("agent card protocol_version must not be empty")]
    MissingProtocolVersion,
}

/// Error returned while parsing a discovery sort field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown sort field: {0}")]
pub struct ParseSortFieldError(pub String);
