//! Channel aggregate.

use super::ChannelName;
use crate::agent::domain::AgentId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Named pub/sub topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    name: ChannelName,
    owner: AgentId,
    created_at: DateTime<Utc>,
    message_count: u64,
    #[serde(default)]
    metadata: Map<String, Value>,
}

impl Channel {
    /// Creates an empty channel owned by `owner`.
    #[must_use]
    pub fn new(
        name: ChannelName,
        owner: AgentId,
        metadata: Map<String, Value>,
        clock: &impl Clock,
    ) -> Self {
        Self {
            name,
            owner,
            created_at: clock.utc(),
            message_count: 0,
            metadata,
        }
    }

    /// Returns the channel name.
    #[must_use]
    pub const fn name(&self) -> &ChannelName {
        &self.name
    }

    /// Returns the agent that created the channel.
    #[must_use]
    pub const fn owner(&self) -> &AgentId {
        &self.owner
    }

    /// Returns the creation timestamp.
    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns how many messages have been published.
    #[must_use]
    pub const fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Returns the free-form metadata.
    #[must_use]
    pub const fn metadata(&self) -> &Map<String, Value> {
        &self.metadata
    }

    /// Counts one published message and returns its sequence number.
    pub const fn record_message(&mut self) -> u64 {
        self.message_count = self.message_count.saturating_add(1);
        self.message_count
    }
}
