//! Service layer for channel publishing and pattern subscriptions.
//!
//! Provides [`ChannelBridge`], which owns the channel table, announces every
//! channel mutation on the event bus, and installs pattern subscriptions on
//! live connections.

use crate::agent::domain::AgentId;
use crate::channel::{
    domain::{Channel, ChannelDomainError, ChannelName, ChannelPattern},
    ports::{ChannelRepository, ChannelRepositoryError},
};
use crate::event::{
    domain::{EventType, StreamEvent},
    ports::EventSink,
};
use crate::stream::{
    domain::{ConnectionId, SubscriptionFilter},
    ports::{SubscriptionError, SubscriptionRegistry},
};
use crate::task::domain::TaskId;
use mockable::Clock;
use serde_json::{Map, Value};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

/// Request payload for publishing a message on a channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishRequest {
    channel: String,
    sender: AgentId,
    message: Value,
}

impl PublishRequest {
    /// Creates a publish request.
    #[must_use]
    pub fn new(channel: impl Into<String>, sender: AgentId, message: Value) -> Self {
        Self {
            channel: channel.into(),
            sender,
            message,
        }
    }
}

/// Outcome of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReceipt {
    /// Channel state after the publish.
    pub channel: Channel,
    /// Sequence number assigned to the message.
    pub sequence: u64,
    /// Whether the publish created the channel.
    pub created: bool,
}

/// Request payload for creating a channel explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateChannelRequest {
    channel: String,
    owner: AgentId,
    metadata: Map<String, Value>,
}

impl CreateChannelRequest {
    /// Creates a request for a channel without metadata.
    #[must_use]
    pub fn new(channel: impl Into<String>, owner: AgentId) -> Self {
        Self {
            channel: channel.into(),
            owner,
            metadata: Map::new(),
        }
    }

    /// Sets the channel metadata.
    #[must_use]
    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Request payload for installing a pattern subscription on a connection.
///
/// The resulting filter fully replaces the connection's previous filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscribePatternRequest {
    connection_id: ConnectionId,
    caller: Option<AgentId>,
    pattern: String,
    task_id: Option<TaskId>,
    agent_id: Option<AgentId>,
    event_types: Vec<EventType>,
}

impl SubscribePatternRequest {
    /// Creates a request subscribing `connection_id` to `pattern`.
    #[must_use]
    pub fn new(connection_id: ConnectionId, pattern: impl Into<String>) -> Self {
        Self {
            connection_id,
            caller: None,
            pattern: pattern.into(),
            task_id: None,
            agent_id: None,
            event_types: Vec::new(),
        }
    }

    /// Identifies the agent asking for the change.
    #[must_use]
    pub fn with_caller(mut self, caller: AgentId) -> Self {
        self.caller = Some(caller);
        self
    }

    /// Additionally restricts the subscription to one task.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Additionally restricts the subscription to one agent.
    #[must_use]
    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// Additionally restricts the subscription to the listed event types.
    #[must_use]
    pub fn with_event_types(mut self, event_types: impl IntoIterator<Item = EventType>) -> Self {
        self.event_types = event_types.into_iter().collect();
        self
    }
}

/// Service-level errors for channel operations.
#[derive(Debug, Error)]
pub enum ChannelBridgeError {
    /// The channel name or pattern is invalid.
    #[error(transparent)]
    Domain(#[from] ChannelDomainError),
    /// A channel with the name already exists.
    #[error("channel already exists: {0}")]
    Exists(ChannelName),
    /// No channel with the name exists.
    #[error("channel not found: {0}")]
    NotFound(ChannelName),
    /// The subscription could not be installed.
    #[error(transparent)]
    Subscription(#[from] SubscriptionError),
    /// Repository operation failed.
    #[error(transparent)]
    Repository(#[from] ChannelRepositoryError),
}

/// Result type for channel bridge operations.
pub type ChannelBridgeResult<T> = Result<T, ChannelBridgeError>;

/// Channel table owner and event publisher.
///
/// Mutations hold a write gate from the existence check until their events
/// are emitted, so subscribers observe channel events in the order the
/// mutations were applied. The repository lock itself is released before
/// any event is emitted.
pub struct ChannelBridge<R, C>
where
    R: ChannelRepository,
    C: Clock + Send + Sync,
{
    repository: Arc<R>,
    clock: Arc<C>,
    sink: Arc<dyn EventSink>,
    subscriptions: Arc<dyn SubscriptionRegistry>,
    gate: Mutex<()>,
}

impl<R, C> ChannelBridge<R, C>
where
    R: ChannelRepository,
    C: Clock + Send + Sync,
{
    /// Creates a bridge publishing to `sink` and installing subscriptions
    /// through `subscriptions`.
    #[must_use]
    pub fn new(
        repository: Arc<R>,
        clock: Arc<C>,
        sink: Arc<dyn EventSink>,
        subscriptions: Arc<dyn SubscriptionRegistry>,
    ) -> Self {
        Self {
            repository,
            clock,
            sink,
            subscriptions,
            gate: Mutex::new(()),
        }
    }

    /// Publishes a message, creating the channel first when it is absent.
    ///
    /// Emits `channel-created` (only when the channel is new) followed by
    /// `channel-message`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelBridgeError::Domain`] for an invalid channel name, or
    /// [`ChannelBridgeError::Repository`] when storage fails.
    pub async fn publish(&self, request: PublishRequest) -> ChannelBridgeResult<PublishReceipt> {
        let PublishRequest {
            channel,
            sender,
            message,
        } = request;
        let name = ChannelName::new(channel)?;

        let _gate = self.gate.lock().await;
        let (mut current, created) = match self.repository.find(&name).await? {
            Some(existing) => (existing, false),
            None => {
                let fresh = Channel::new(name, sender.clone(), Map::new(), &*self.clock);
                self.repository.insert(&fresh).await?;
                self.sink.emit(StreamEvent::channel_created(&fresh));
                tracing::info!(
                    channel = %fresh.name(),
                    owner = %fresh.owner(),
                    "channel created on publish"
                );
                (fresh, true)
            }
        };

        let sequence = current.record_message();
        self.repository.update(&current).await?;
        self.sink.emit(StreamEvent::channel_message(
            &current,
            sender,
            message,
            &*self.clock,
        ));
        tracing::debug!(
            channel = %current.name(),
            sequence,
            "channel message published"
        );

        Ok(PublishReceipt {
            channel: current,
            sequence,
            created,
        })
    }

    /// Creates an empty channel.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelBridgeError::Exists`] when the channel already exists,
    /// [`ChannelBridgeError::Domain`] for an invalid name, or
    /// [`ChannelBridgeError::Repository`] when storage fails.
    pub async fn create(&self, request: CreateChannelRequest) -> ChannelBridgeResult<Channel> {
        let CreateChannelRequest {
            channel,
            owner,
            metadata,
        } = request;
        let name = ChannelName::new(channel)?;

        let _gate = self.gate.lock().await;
        if self.repository.find(&name).await?.is_some() {
            return Err(ChannelBridgeError::Exists(name));
        }
        let created = Channel::new(name, owner, metadata, &*self.clock);
        self.repository.insert(&created).await?;
        self.sink.emit(StreamEvent::channel_created(&created));
        tracing::info!(
            channel = %created.name(),
            owner = %created.owner(),
            "channel created"
        );
        Ok(created)
    }

    /// Deletes a channel, emitting `channel-deleted` before removal.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelBridgeError::NotFound`] when the channel does not
    /// exist, [`ChannelBridgeError::Domain`] for an invalid name, or
    /// [`ChannelBridgeError::Repository`] when storage fails.
    pub async fn delete(&self, channel: &str) -> ChannelBridgeResult<Channel> {
        let name = ChannelName::new(channel)?;

        let _gate = self.gate.lock().await;
        let Some(existing) = self.repository.find(&name).await? else {
            return Err(ChannelBridgeError::NotFound(name));
        };
        self.sink
            .emit(StreamEvent::channel_deleted(&existing, &*self.clock));
        self.repository.remove(&name).await?;
        tracing::info!(channel = %name, "channel deleted");
        Ok(existing)
    }

    /// Returns the channel named `channel`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelBridgeError::NotFound`] when the channel does not
    /// exist, [`ChannelBridgeError::Domain`] for an invalid name, or
    /// [`ChannelBridgeError::Repository`] when storage fails.
    pub async fn info(&self, channel: &str) -> ChannelBridgeResult<Channel> {
        let name = ChannelName::new(channel)?;
        self.repository
            .find(&name)
            .await?
            .ok_or(ChannelBridgeError::NotFound(name))
    }

    /// Returns every channel, ordered by name, optionally restricted to
    /// names matching `pattern`.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelBridgeError::Domain`] for an invalid pattern, or
    /// [`ChannelBridgeError::Repository`] when storage fails.
    pub async fn list(&self, pattern: Option<&str>) -> ChannelBridgeResult<Vec<Channel>> {
        let parsed = pattern.map(ChannelPattern::parse).transpose()?;
        let channels = self.repository.list_all().await?;
        Ok(match parsed {
            Some(filter) => channels
                .into_iter()
                .filter(|channel| filter.matches(channel.name()))
                .collect(),
            None => channels,
        })
    }

    /// Replaces a connection's filter with a channel pattern subscription.
    ///
    /// Returns the installed filter.
    ///
    /// # Errors
    ///
    /// Returns [`ChannelBridgeError::Domain`] for an invalid pattern, or
    /// [`ChannelBridgeError::Subscription`] when the connection is not open
    /// or was opened by another agent.
    pub fn subscribe_pattern(
        &self,
        request: SubscribePatternRequest,
    ) -> ChannelBridgeResult<SubscriptionFilter> {
        let SubscribePatternRequest {
            connection_id,
            caller,
            pattern,
            task_id,
            agent_id,
            event_types,
        } = request;

        let mut filter = SubscriptionFilter::new()
            .with_channel_pattern(ChannelPattern::parse(pattern)?)
            .with_event_types(event_types);
        if let Some(task) = task_id {
            filter = filter.with_task(task);
        }
        if let Some(agent) = agent_id {
            filter = filter.with_agent(agent);
        }

        self.subscriptions
            .replace_filter(connection_id, caller.as_ref(), filter.clone())?;
        Ok(filter)
    }
}
