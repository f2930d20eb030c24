//! Repository port for channel storage.

use crate::channel::domain::{Channel, ChannelName};
use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

/// Result type for channel repository operations.
pub type ChannelRepositoryResult<T> = Result<T, ChannelRepositoryError>;

/// Channel storage contract.
#[async_trait]
pub trait ChannelRepository: Send + Sync {
    /// Stores a new channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelRepositoryError::Duplicate`] when a channel with the
    /// same name already exists.
    async fn insert(&self, channel: &Channel) -> ChannelRepositoryResult<()>;

    /// Persists changes to an existing channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelRepositoryError::NotFound`] when the channel does not
    /// exist.
    async fn update(&self, channel: &Channel) -> ChannelRepositoryResult<()>;

    /// Finds a channel by name.
    async fn find(&self, name: &ChannelName) -> ChannelRepositoryResult<Option<Channel>>;

    /// Returns every channel ordered by name.
    async fn list_all(&self) -> ChannelRepositoryResult<Vec<Channel>>;

    /// Removes a channel and returns it, or `None` when it does not exist.
    async fn remove(&self, name: &ChannelName) -> ChannelRepositoryResult<Option<Channel>>;
}

/// Errors returned by channel repository implementations.
#[derive(Debug, Clone, Error)]
pub enum ChannelRepositoryError {
    /// A channel with the same name already exists.
    #[error("duplicate channel: {0}")]
    Duplicate(ChannelName),

    /// The channel was not found.
    #[error("channel not found: {0}")]
    NotFound(ChannelName),

    /// Persistence-layer failure.
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl ChannelRepositoryError {
    /// Wraps a persistence error.
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }
}
