//! Thread-safe in-memory channel table.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use crate::channel::{
    domain::{Channel, ChannelName},
    ports::{ChannelRepository, ChannelRepositoryError, ChannelRepositoryResult},
};

/// Thread-safe in-memory channel repository.
#[derive(Debug, Clone, Default)]
pub struct InMemoryChannelRepository {
    state: Arc<RwLock<BTreeMap<ChannelName, Channel>>>,
}

impl InMemoryChannelRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned(err: impl ToString) -> ChannelRepositoryError {
    ChannelRepositoryError::persistence(std::io::Error::other(err.to_string()))
}

#[async_trait]
impl ChannelRepository for InMemoryChannelRepository {
    async fn insert(&self, channel: &Channel) -> ChannelRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        if state.contains_key(channel.name()) {
            return Err(ChannelRepositoryError::Duplicate(channel.name().clone()));
        }
        state.insert(channel.name().clone(), channel.clone());
        Ok(())
    }

    async fn update(&self, channel: &Channel) -> ChannelRepositoryResult<()> {
        let mut state = self.state.write().map_err(poisoned)?;
        let Some(slot) = state.get_mut(channel.name()) else {
            return Err(ChannelRepositoryError::NotFound(channel.name().clone()));
        };
        *slot = channel.clone();
        Ok(())
    }

    async fn find(&self, name: &ChannelName) -> ChannelRepositoryResult<Option<Channel>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.get(name).cloned())
    }

    async fn list_all(&self) -> ChannelRepositoryResult<Vec<Channel>> {
        let state = self.state.read().map_err(poisoned)?;
        Ok(state.values().cloned().collect())
    }

    async fn remove(&self, name: &ChannelName) -> ChannelRepositoryResult<Option<Channel>> {
        let mut state = self.state.write().map_err(poisoned)?;
        Ok(state.remove(name))
    }
}
