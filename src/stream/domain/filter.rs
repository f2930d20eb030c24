//! Per-connection subscription filter.

use crate::agent::domain::AgentId;
use crate::channel::domain::ChannelPattern;
use crate::event::domain::{EventType, StreamEvent};
use crate::task::domain::TaskId;
use std::collections::HashSet;

/// Filter deciding which events a connection receives.
///
/// Unset dimensions match everything. A set dimension that the event does
/// not carry (for example a task filter against a channel event) does not
/// match. Keepalive events match every filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubscriptionFilter {
    task_id: Option<TaskId>,
    agent_id: Option<AgentId>,
    event_types: Option<HashSet<EventType>>,
    channel_pattern: Option<ChannelPattern>,
}

impl SubscriptionFilter {
    /// Creates a filter that matches every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restricts the filter to events about `task_id`.
    #[must_use]
    pub const fn with_task(mut self, task_id: TaskId) -> Self {
        self.task_id = Some(task_id);
        self
    }

    /// Restricts the filter to events involving `agent_id`.
    #[must_use]
    pub fn with_agent(mut self, agent_id: AgentId) -> Self {
        self.agent_id = Some(agent_id);
        self
    }

    /// Restricts the filter to the listed event types.
    ///
    /// An empty list leaves the dimension unset.
    #[must_use]
    pub fn with_event_types(mut self, event_types: impl IntoIterator<Item = EventType>) -> Self {
        let types: HashSet<EventType> = event_types.into_iter().collect();
        self.event_types = (!types.is_empty()).then_some(types);
        self
    }

    /// Restricts the filter to channels matching `pattern`.
    #[must_use]
    pub fn with_channel_pattern(mut self, pattern: ChannelPattern) -> Self {
        self.channel_pattern = Some(pattern);
        self
    }

    /// Returns the task dimension.
    #[must_use]
    pub const fn task_id(&self) -> Option<TaskId> {
        self.task_id
    }

    /// Returns the agent dimension.
    #[must_use]
    pub const fn agent_id(&self) -> Option<&AgentId> {
        self.agent_id.as_ref()
    }

    /// Returns the event type dimension.
    #[must_use]
    pub const fn event_types(&self) -> Option<&HashSet<EventType>> {
        self.event_types.as_ref()
    }

    /// Returns the channel pattern dimension.
    #[must_use]
    pub const fn channel_pattern(&self) -> Option<&ChannelPattern> {
        self.channel_pattern.as_ref()
    }

    /// Returns whether `event` satisfies every set dimension.
    #[must_use]
    pub fn matches(&self, event: &StreamEvent) -> bool {
        if event.is_keepalive() {
            return true;
        }

        let task_matches = self
            .task_id
            .is_none_or(|task_id| event.task_id() == Some(task_id));
        let agent_matches = self
            .agent_id
            .as_ref()
            .is_none_or(|agent_id| event.involves_agent(agent_id));
        let type_matches = self
            .event_types
            .as_ref()
            .is_none_or(|types| types.contains(&event.event_type()));
        let in_channel = |pattern: &ChannelPattern| {
            event.channel().is_some_and(|name| pattern.matches(name))
        };
        let channel_matches = self.channel_pattern.as_ref().is_none_or(in_channel);

        task_matches && agent_matches && type_matches && channel_matches
    }
}
