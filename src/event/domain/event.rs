//! Stream event record broadcast to subscribers.

use crate::agent::domain::AgentId;
use crate::channel::domain::{Channel, ChannelName};
use crate::task::domain::{StateChange, Task, TaskId, TaskState};
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;
use uuid::Uuid;

/// Kind of a stream event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventType {
    /// First event on every new connection.
    ConnectionEstablished,
    /// A task entered a non-terminal state.
    TaskStateChanged,
    /// A working task reported progress.
    TaskProgress,
    /// A task entered `completed`.
    TaskCompleted,
    /// A task entered `failed`.
    TaskFailed,
    /// A task entered `cancelled`.
    TaskCancelled,
    /// A message was published on a channel.
    ChannelMessage,
    /// A channel was created.
    ChannelCreated,
    /// A channel was deleted.
    ChannelDeleted,
    /// Periodic liveness frame.
    Keepalive,
}

impl EventType {
    /// Every event type.
    pub const ALL: [Self; 10] = [
        Self::ConnectionEstablished,
        Self::TaskStateChanged,
        Self::TaskProgress,
        Self::TaskCompleted,
        Self::TaskFailed,
        Self::TaskCancelled,
        Self::ChannelMessage,
        Self::ChannelCreated,
        Self::ChannelDeleted,
        Self::Keepalive,
    ];

    /// Returns the canonical wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConnectionEstablished => "connection-established",
            Self::TaskStateChanged => "task-state-changed",
            Self::TaskProgress => "task-progress",
            Self::TaskCompleted => "task-completed",
            Self::TaskFailed => "task-failed",
            Self::TaskCancelled => "task-cancelled",
            Self::ChannelMessage => "channel-message",
            Self::ChannelCreated => "channel-created",
            Self::ChannelDeleted => "channel-deleted",
            Self::Keepalive => "keepalive",
        }
    }

    /// Returns the event type reported for a transition into `state`.
    #[must_use]
    pub const fn for_task_state(state: TaskState) -> Self {
        match state {
            TaskState::Completed => Self::TaskCompleted,
            TaskState::Failed => Self::TaskFailed,
            TaskState::Cancelled => Self::TaskCancelled,
            TaskState::Submitted
            | TaskState::Working
            | TaskState::InputRequired
            | TaskState::Paused => Self::TaskStateChanged,
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for EventType {
    type Error = ParseEventTypeError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let normalized = value.trim().to_ascii_lowercase().replace('_', "-");
        match normalized.as_str() {
            "connection-established" => Ok(Self::ConnectionEstablished),
            "task-state-changed" => Ok(Self::TaskStateChanged),
            "task-progress" => Ok(Self::TaskProgress),
            "task-completed" => Ok(Self::TaskCompleted),
            "task-failed" => Ok(Self::TaskFailed),
            "task-cancelled" => Ok(Self::TaskCancelled),
            "channel-message" => Ok(Self::ChannelMessage),
            "channel-created" => Ok(Self::ChannelCreated),
            "channel-deleted" => Ok(Self::ChannelDeleted),
            "keepalive" => Ok(Self::Keepalive),
            _ => Err(ParseEventTypeError(value.to_owned())),
        }
    }
}

/// Error returned while parsing an event type name.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown event type: {0}")]
pub struct ParseEventTypeError(pub String);

/// Snapshot of a task carried by task events.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskEventPayload {
    /// Task the event is about.
    pub task_id: TaskId,
    /// Requesting agent.
    pub owner: AgentId,
    /// Agent performing the work, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<AgentId>,
    /// State after the change.
    pub state: TaskState,
    /// State before the change, for transitions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_state: Option<TaskState>,
    /// Progress after the change.
    pub progress: f64,
    /// Result payload of a completed task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error payload of a failed task.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
}

impl TaskEventPayload {
    fn snapshot(task: &Task, previous_state: Option<TaskState>) -> Self {
        Self {
            task_id: task.id(),
            owner: task.owner().clone(),
            target: task.target().cloned(),
            state: task.state(),
            previous_state,
            progress: task.progress(),
            result: task.result().cloned(),
            error: task.error().cloned(),
        }
    }
}

/// Message published on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelMessagePayload {
    /// Channel the message was published on.
    pub channel: ChannelName,
    /// Publishing agent.
    pub sender: AgentId,
    /// Position of the message in the channel, starting at 1.
    pub sequence: u64,
    /// Opaque message body.
    pub message: Value,
}

/// Channel metadata carried by lifecycle events.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChannelEventPayload {
    /// Channel the event is about.
    pub channel: ChannelName,
    /// Agent owning the channel.
    pub owner: AgentId,
    /// Messages published so far.
    pub message_count: u64,
    /// Free-form channel metadata.
    pub metadata: Map<String, Value>,
}

impl ChannelEventPayload {
    fn snapshot(channel: &Channel) -> Self {
        Self {
            channel: channel.name().clone(),
            owner: channel.owner().clone(),
            message_count: channel.message_count(),
            metadata: channel.metadata().clone(),
        }
    }
}

/// Typed payload of a stream event.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EventPayload {
    /// Payload of `connection-established`.
    Connection {
        /// Identifier of the new connection.
        connection_id: Uuid,
    },
    /// Payload of every task event.
    Task(TaskEventPayload),
    /// Payload of `channel-message`.
    ChannelMessage(ChannelMessagePayload),
    /// Payload of `channel-created` and `channel-deleted`.
    Channel(ChannelEventPayload),
    /// Payload of `keepalive`.
    Keepalive {},
}

/// Immutable event broadcast to stream subscribers.
///
/// Every event carries the task, agent and channel identifiers needed for
/// filter matching, so routing never consults the ledger or the channel
/// table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StreamEvent {
    #[serde(rename = "type")]
    event_type: EventType,
    timestamp: DateTime<Utc>,
    payload: EventPayload,
}

impl StreamEvent {
    /// Creates the synthetic first event of a connection.
    #[must_use]
    pub fn connection_established(connection_id: Uuid, clock: &impl Clock) -> Self {
        Self {
            event_type: EventType::ConnectionEstablished,
            timestamp: clock.utc(),
            payload: EventPayload::Connection { connection_id },
        }
    }

    /// Creates the event reporting `change`, applied to `task`.
    #[must_use]
    pub fn task_transition(task: &Task, change: StateChange) -> Self {
        Self {
            event_type: EventType::for_task_state(change.to),
            timestamp: change.at,
            payload: EventPayload::Task(TaskEventPayload::snapshot(task, Some(change.from))),
        }
    }

    /// Creates the event reporting the current progress of `task`.
    #[must_use]
    pub fn task_progress(task: &Task) -> Self {
        Self {
            event_type: EventType::TaskProgress,
            timestamp: task.updated_at(),
            payload: EventPayload::Task(TaskEventPayload::snapshot(task, None)),
        }
    }

    /// Creates the event reporting a message published on `channel`.
    ///
    /// The channel's message count must already include the message.
    #[must_use]
    pub fn channel_message(
        channel: &Channel,
        sender: AgentId,
        message: Value,
        clock: &impl Clock,
    ) -> Self {
        Self {
            event_type: EventType::ChannelMessage,
            timestamp: clock.utc(),
            payload: EventPayload::ChannelMessage(ChannelMessagePayload {
                channel: channel.name().clone(),
                sender,
                sequence: channel.message_count(),
                message,
            }),
        }
    }

    /// Creates the event reporting that `channel` was created.
    #[must_use]
    pub fn channel_created(channel: &Channel) -> Self {
        Self {
            event_type: EventType::ChannelCreated,
            timestamp: channel.created_at(),
            payload: EventPayload::Channel(ChannelEventPayload::snapshot(channel)),
        }
    }

    /// Creates the event reporting that `channel` is being deleted.
    #[must_use]
    pub fn channel_deleted(channel: &Channel, clock: &impl Clock) -> Self {
        Self {
            event_type: EventType::ChannelDeleted,
            timestamp: clock.utc(),
            payload: EventPayload::Channel(ChannelEventPayload::snapshot(channel)),
        }
    }

    /// Creates a keepalive event.
    #[must_use]
    pub fn keepalive(clock: &impl Clock) -> Self {
        Self {
            event_type: EventType::Keepalive,
            timestamp: clock.utc(),
            payload: EventPayload::Keepalive {},
        }
    }

    /// Returns the event type.
    #[must_use]
    pub const fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Returns when the event occurred.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the typed payload.
    #[must_use]
    pub const fn payload(&self) -> &EventPayload {
        &self.payload
    }

    /// Returns whether this is a keepalive frame.
    #[must_use]
    pub const fn is_keepalive(&self) -> bool {
        matches!(self.event_type, EventType::Keepalive)
    }

    /// Returns the task the event is about, if any.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        match &self.payload {
            EventPayload::Task(task) => Some(task.task_id),
            EventPayload::Connection { .. }
            | EventPayload::ChannelMessage(_)
            | EventPayload::Channel(_)
            | EventPayload::Keepalive {} => None,
        }
    }

    /// Returns the channel the event is about, if any.
    #[must_use]
    pub const fn channel(&self) -> Option<&ChannelName> {
        match &self.payload {
            EventPayload::ChannelMessage(message) => Some(&message.channel),
            EventPayload::Channel(channel) => Some(&channel.channel),
            EventPayload::Connection { .. }
            | EventPayload::Task(_)
            | EventPayload::Keepalive {} => None,
        }
    }

    /// Returns the agents taking part in the event.
    ///
    /// Task events involve the owner and the target; channel messages
    /// involve the sender; channel lifecycle events involve the owner.
    #[must_use]
    pub fn agent_ids(&self) -> Vec<&AgentId> {
        match &self.payload {
            EventPayload::Task(task) => std::iter::once(&task.owner)
                .chain(task.target.as_ref())
                .collect(),
            EventPayload::ChannelMessage(message) => vec![&message.sender],
            EventPayload::Channel(channel) => vec![&channel.owner],
            EventPayload::Connection { .. } | EventPayload::Keepalive {} => Vec::new(),
        }
    }

    /// Returns whether `agent` takes part in the event.
    #[must_use]
    pub fn involves_agent(&self, agent: &AgentId) -> bool {
        self.agent_ids().contains(&agent)
    }
}
