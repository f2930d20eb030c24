//! Service layer for Agent Card registration and discovery.
//!
//! Provides [`AgentRegistryService`] which coordinates registration,
//! unregistration, lookup, discovery and owner-driven expiry.

use crate::agent::{
    domain::{
        AgentCard, AgentCardParts, AgentDomainError, AgentEndpoint, AgentId, DiscoveryFilter,
        DiscoveryPage, DiscoveryQuery, PageRequest, ProtocolVersion, SecurityScheme,
        SortDirection, SortField, SortOrder,
    },
    ports::{AgentRepository, AgentRepositoryError},
};
use chrono::{DateTime, Utc};
use mockable::Clock;
use std::sync::Arc;
use thiserror::Error;

/// Request payload for registering an Agent Card.
///
/// Required fields are optional here so that a missing value is reported as
/// an invalid card rather than a decoding failure.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterAgentRequest {
    id: Option<String>,
    name: String,
    description: String,
    version: String,
    capabilities: Vec<String>,
    methods: Vec<String>,
    endpoint: Option<String>,
    protocol_version: Option<String>,
    security: Option<SecurityScheme>,
}

impl RegisterAgentRequest {
    /// Creates a request with the three required card fields.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        endpoint: impl Into<String>,
        protocol_version: impl Into<String>,
    ) -> Self {
        Self {
            id: Some(id.into()),
            endpoint: Some(endpoint.into()),
            protocol_version: Some(protocol_version.into()),
            ..Self::default()
        }
    }

    /// Creates a request from possibly missing required fields.
    #[must_use]
    pub fn from_optional(
        id: Option<String>,
        endpoint: Option<String>,
        protocol_version: Option<String>,
    ) -> Self {
        Self {
            id,
            endpoint,
            protocol_version,
            ..Self::default()
        }
    }

    /// Sets the human-readable name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Sets the agent implementation version.
    #[must_use]
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Sets the capability tags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Sets the supported RPC method names.
    #[must_use]
    pub fn with_methods(mut self, methods: impl IntoIterator<Item = String>) -> Self {
        self.methods = methods.into_iter().collect();
        self
    }

    /// Sets the security scheme descriptor.
    #[must_use]
    pub fn with_security(mut self, security: SecurityScheme) -> Self {
        self.security = Some(security);
        self
    }

    /// Validates the request into card parts.
    ///
    /// # Errors
    ///
    /// Returns [`AgentDomainError`] when a required field is missing or the
    /// endpoint is not an absolute URI.
    pub fn into_parts(self) -> Result<AgentCardParts, AgentDomainError> {
        let Self {
            id,
            name,
            description,
            version,
            capabilities,
            methods,
            endpoint,
            protocol_version,
            security,
        } = self;

        let agent_id = AgentId::new(id.ok_or(AgentDomainError::MissingAgentId)?)?;
        let agent_endpoint =
            AgentEndpoint::new(endpoint.ok_or(AgentDomainError::MissingEndpoint)?)?;
        let agent_protocol = ProtocolVersion::new(
            protocol_version.ok_or(AgentDomainError::MissingProtocolVersion)?,
        )?;

        Ok(AgentCardParts {
            id: agent_id,
            name,
            description,
            version,
            capabilities,
            methods,
            endpoint: agent_endpoint,
            protocol_version: agent_protocol,
            security,
        })
    }
}

/// Request payload for discovering registered agents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoverAgentsRequest {
    capabilities: Vec<String>,
    protocol_version: Option<String>,
    sort_field: SortField,
    sort_direction: SortDirection,
    offset: usize,
    limit: Option<usize>,
}

impl DiscoverAgentsRequest {
    /// Creates an unfiltered request with default ordering and paging.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requires every capability in `capabilities`.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: impl IntoIterator<Item = String>) -> Self {
        self.capabilities = capabilities.into_iter().collect();
        self
    }

    /// Requires an exact protocol version.
    #[must_use]
    pub fn with_protocol_version(mut self, protocol_version: impl Into<String>) -> Self {
        self.protocol_version = Some(protocol_version.into());
        self
    }

    /// Sets the sort field and direction.
    #[must_use]
    pub const fn sorted_by(mut self, field: SortField, direction: SortDirection) -> Self {
        self.sort_field = field;
        self.sort_direction = direction;
        self
    }

    /// Sets the page window. `None` selects the configured default limit.
    #[must_use]
    pub const fn with_page(mut self, offset: usize, limit: Option<usize>) -> Self {
        self.offset = offset;
        self.limit = limit;
        self
    }
}

/// Page size bounds applied to discovery requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryLimits {
    /// Limit used when the request does not specify one.
    pub default_limit: usize,
    /// Upper bound on any requested limit.
    pub max_limit: usize,
}

impl Default for DiscoveryLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
        }
    }
}

/// Service-level errors for agent registry operations.
#[derive(Debug, Error)]
pub enum AgentRegistryServiceError {
    /// The submitted card is invalid.
    #[error(transparent)]
    Domain(#[from] AgentDomainError),
    /// A discovery filter value is invalid.
    #[error("invalid discovery filter: {0}")]
    InvalidFilter(#[source] AgentDomainError),
    /// No agent with the identifier is registered.
    #[error("agent not found: {0}")]
    NotFound(AgentId),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] AgentRepositoryError),
}

/// Result type for agent registry service operations.
pub type AgentRegistryServiceResult<T> = Result<T, AgentRegistryServiceError>;

/// Agent Card registration and discovery service.
#[derive(Clone)]
pub struct AgentRegistryService<R, C>
where
    R: AgentRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    limits: DiscoveryLimits,
}

impl<R, C> AgentRegistryService<R, C>
where
    R: AgentRepository,
    C: Clock + Send + Sync,
{
    /// Creates a new registry service with default discovery limits.
    #[must_use]
    pub fn new(repository: Arc<R>, clock: Arc<C>) -> Self {
        Self::with_limits(repository, clock, DiscoveryLimits::default())
    }

    /// Creates a new registry service with explicit discovery limits.
    #[must_use]
    pub const fn with_limits(repository: Arc<R>, clock: Arc<C>, limits: DiscoveryLimits) -> Self {
        Self {
            repository,
            clock,
            limits,
        }
    }

    /// Registers a card, replacing any card with the same identifier.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::Domain`] when a required field is
    /// missing, or [`AgentRegistryServiceError::Repository`] when storage
    /// fails.
    pub async fn register(
        &self,
        request: RegisterAgentRequest,
    ) -> AgentRegistryServiceResult<AgentCard> {
        let card = AgentCard::new(request.into_parts()?, &*self.clock);
        let replaced = self.repository.upsert(&card).await?;
        tracing::info!(agent_id = %card.id(), replaced, "agent registered");
        Ok(card)
    }

    /// Removes a card. Unregistering an unknown agent is not an error.
    ///
    /// Returns whether a card was removed.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::Repository`] when storage fails.
    pub async fn unregister(&self, id: &AgentId) -> AgentRegistryServiceResult<bool> {
        let removed = self.repository.remove(id).await?;
        if removed {
            tracing::info!(agent_id = %id, "agent unregistered");
        }
        Ok(removed)
    }

    /// Returns the card registered under `id`.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::NotFound`] when no card is
    /// registered, or [`AgentRegistryServiceError::Repository`] when storage
    /// fails.
    pub async fn get(&self, id: &AgentId) -> AgentRegistryServiceResult<AgentCard> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AgentRegistryServiceError::NotFound(id.clone()))
    }

    /// Returns one page of cards matching the request.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::InvalidFilter`] when the protocol
    /// version filter is blank, or [`AgentRegistryServiceError::Repository`] when
    /// storage fails.
    pub async fn discover(
        &self,
        request: DiscoverAgentsRequest,
    ) -> AgentRegistryServiceResult<DiscoveryPage> {
        let query = self.build_query(request)?;
        let cards = self.repository.list_all().await?;
        Ok(query.apply(cards))
    }

    /// Removes every card whose latest registration predates `cutoff`.
    ///
    /// Heartbeat policy lives outside the core; its owner calls this to
    /// expire agents that stopped re-registering.
    ///
    /// # Errors
    ///
    /// Returns [`AgentRegistryServiceError::Repository`] when storage fails.
    pub async fn prune_registered_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AgentRegistryServiceResult<Vec<AgentId>> {
        let removed = self.repository.remove_registered_before(cutoff).await?;
        if !removed.is_empty() {
            tracing::info!(count = removed.len(), "expired stale agent registrations");
        }
        Ok(removed)
    }

    fn build_query(
        &self,
        request: DiscoverAgentsRequest,
    ) -> AgentRegistryServiceResult<DiscoveryQuery> {
        let DiscoverAgentsRequest {
            capabilities,
            protocol_version,
            sort_field,
            sort_direction,
            offset,
            limit,
        } = request;

        let protocol = protocol_version
            .map(ProtocolVersion::new)
            .transpose()
            .map_err(AgentRegistryServiceError::InvalidFilter)?;
        let effective_limit = limit
            .unwrap_or(self.limits.default_limit)
            .min(self.limits.max_limit);

        Ok(DiscoveryQuery {
            filter: DiscoveryFilter {
                capabilities,
                protocol_version: protocol,
            },
            sort: SortOrder {
                field: sort_field,
                direction: sort_direction,
            },
            page: PageRequest::new(offset, effective_limit),
        })
    }
}
