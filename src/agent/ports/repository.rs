//! Repository port for Agent Card storage and lookup.

use crate::agent::domain::{AgentCard, AgentId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;

/// Result type for agent repository operations.
pub type AgentRepositoryResult<T> = Result<T, AgentRepositoryError>;

/// Agent Card storage contract.
#[async_trait]
pub trait AgentRepository: Send + Sync {
    /// Inserts a card, replacing any card with the same identifier.
    ///
    /// Returns `true` when an existing card was replaced.
    async fn upsert(&self, card: &AgentCard) -> AgentRepositoryResult<bool>;

    /// Removes the card with the given identifier.
    ///
    /// Returns `false` when no such card exists.
    async fn remove(&self, id: &AgentId) -> AgentRepositoryResult<bool>;

    /// Finds a card by identifier.
    ///
    /// Returns `None` when the card does not exist.
    async fn find_by_id(&self, id: &AgentId) -> AgentRepositoryResult<Option<AgentCard>>;

    /// Returns every registered card in unspecified order.
    async fn list_all(&self) -> AgentRepositoryResult<Vec<AgentCard>>;

    /// Removes every card registered strictly before `cutoff` and returns
    /// their identifiers.
    async fn remove_registered_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AgentRepositoryResult<Vec<AgentId>>;
}

/// Errors returned by agent repository implementations.
#[derive(Debug, Clone, Error)]
pub enum AgentRepositoryError {
    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl AgentRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
