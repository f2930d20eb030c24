//! Thread-safe in-memory Agent Card repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::agent::{
    domain::{AgentCard, AgentId},
    ports::{AgentRepository, AgentRepositoryError, AgentRepositoryResult},
};

/// Thread-safe in-memory agent repository.
///
/// The registry is process-local; durability is left to an external
/// storage collaborator.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAgentRepository {
    state: Arc<RwLock<HashMap<AgentId, AgentCard>>>,
}

impl InMemoryAgentRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> AgentRepositoryError {
    AgentRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl AgentRepository for InMemoryAgentRepository {
    async fn upsert(&self, card: &AgentCard) -> AgentRepositoryResult<bool> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.insert(card.id().clone(), card.clone()).is_some())
    }

    async fn remove(&self, id: &AgentId) -> AgentRepositoryResult<bool> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.remove(id).is_some())
    }

    async fn find_by_id(&self, id: &AgentId) -> AgentRepositoryResult<Option<AgentCard>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(id).cloned())
    }

    async fn list_all(&self) -> AgentRepositoryResult<Vec<AgentCard>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.values().cloned().collect())
    }

    async fn remove_registered_before(
        &self,
        cutoff: DateTime<Utc>,
    ) -> AgentRepositoryResult<Vec<AgentId>> {
        let mut state = self.state.write().map_err(poisoned)?;
        let stale: Vec<AgentId> = state
            .values()
            .filter(|card| card.registered_at() < cutoff)
            .map(|card| card.id().clone())
            .collect();
        for id in &stale {
            state.remove(id);
        }
        Ok(stale)
    }
}
