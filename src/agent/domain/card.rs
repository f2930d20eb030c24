//! Agent Card aggregate root and its validated fields.

use super::{AgentDomainError, AgentId};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Absolute URI at which an agent accepts RPC calls.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentEndpoint(String);

impl AgentEndpoint {
    /// Creates a validated endpoint.
    ///
    /// The value is trimmed and must parse as an absolute URI. The original
    /// spelling is preserved so peers see exactly what the agent announced.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::MissingEndpoint`] when the value is empty
    /// after trimming, or [`AgentDomainError::InvalidEndpoint`] when it is not
    /// an absolute URI.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AgentDomainError::MissingEndpoint);
        }
        Url::parse(trimmed).map_err(|_| AgentDomainError::InvalidEndpoint(raw.clone()))?;
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the endpoint as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AgentEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A2A protocol version announced by an agent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtocolVersion(String);

impl ProtocolVersion {
    /// Creates a validated protocol version.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError::MissingProtocolVersion`] when the value is
    /// empty after trimming.
    pub fn new(value: impl Into<String>) -> Result<Self, AgentDomainError> {
        let raw = value.into();
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(AgentDomainError::MissingProtocolVersion);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Security scheme an agent expects callers to use.
///
/// The core never verifies credentials itself; the descriptor is carried so
/// that peers know how to authenticate against the agent's endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Scheme name, for example `bearer` or `mtls`.
    pub scheme: String,
    /// Scheme-specific details.
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

/// Parameter object holding the fields of a new Agent Card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AgentCardParts {
    /// Unique agent identifier.
    pub id: AgentId,
    /// Human-readable agent name.
    pub name: String,
    /// Free-form description of what the agent does.
    pub description: String,
    /// Semantic version of the agent implementation.
    pub version: String,
    /// Capability tags used by discovery filters.
    pub capabilities: Vec<String>,
    /// RPC method names the agent serves.
    pub methods: Vec<String>,
    /// Reachable RPC endpoint.
    pub endpoint: AgentEndpoint,
    /// A2A protocol version spoken by the agent.
    pub protocol_version: ProtocolVersion,
    /// Optional security scheme descriptor.
    pub security: Option<SecurityScheme>,
}

/// Agent Card aggregate root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentCard {
    id: AgentId,
    name: String,
    description: String,
    version: String,
    capabilities: Vec<String>,
    methods: Vec<String>,
    endpoint: AgentEndpoint,
    protocol_version: ProtocolVersion,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    security: Option<SecurityScheme>,
    registered_at: DateTime<Utc>,
}

impl AgentCard {
    /// Creates a card stamped with the current registration time.
    #[must_use]
    pub fn new(parts: AgentCardParts, clock: &impl Clock) -> Self {
        Self::with_registration_time(parts, clock.utc())
    }

    /// Creates a card with an explicit registration time.
    #[must_use]
    pub fn with_registration_time(parts: AgentCardParts, registered_at: DateTime<Utc>) -> Self {
        let AgentCardParts {
            id,
            name,
            description,
            version,
            capabilities,
            methods,
            endpoint,
            protocol_version,
            security,
        } = parts;
        Self {
            id,
            name,
            description,
            version,
            capabilities,
            methods,
            endpoint,
            protocol_version,
            security,
            registered_at,
        }
    }

    /// Returns the agent identifier.
    #[must_use]
    pub const fn id(&self) -> &AgentId {
        &self.id
    }

    /// Returns the human-readable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the description.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Returns the agent implementation version.
    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    /// Returns the capability tags.
    #[must_use]
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Returns the supported RPC method names.
    #[must_use]
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Returns the RPC endpoint.
    #[must_use]
    pub const fn endpoint(&self) -> &AgentEndpoint {
        &self.endpoint
    }

    /// Returns the protocol version.
    #[must_use]
    pub const fn protocol_version(&self) -> &ProtocolVersion {
        &self.protocol_version
    }

    /// Returns the security scheme, if declared.
    #[must_use]
    pub const fn security(&self) -> Option<&SecurityScheme> {
        self.security.as_ref()
    }

    /// Returns the time of the most recent registration.
    #[must_use]
    pub const fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Returns whether the card declares every capability in `required`.
    #[must_use]
    pub fn has_capabilities(&self, required: &[String]) -> bool {
        required
            .iter()
            .all(|wanted| self.capabilities.iter().any(|tag| tag == wanted))
    }
}
