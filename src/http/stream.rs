//! `GET /stream`: one Server-Sent Events connection per request.

use super::{AppState, CALLER_HEADER};
use crate::agent::domain::{AgentDomainError, AgentId};
use crate::channel::domain::{ChannelDomainError, ChannelPattern};
use crate::event::domain::{EventType, ParseEventTypeError, StreamEvent};
use crate::stream::domain::SubscriptionFilter;
use crate::task::domain::{TaskDomainError, TaskId};
use axum::{
    Json,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{
        IntoResponse, Response,
        sse::{Event, Sse},
    },
};
use futures::StreamExt;
use serde::Deserialize;
use serde_json::json;
use std::convert::Infallible;
use thiserror::Error;

/// Query parameters selecting the events of a connection.
///
/// Blank values are ignored. `event_types` is a comma-separated list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamQuery {
    /// Only events about this task.
    pub task_id: Option<String>,
    /// Only events involving this agent.
    pub agent_id: Option<String>,
    /// Only these event types.
    pub event_types: Option<String>,
    /// Only channel events whose channel matches this pattern.
    pub channel: Option<String>,
}

/// A query parameter could not be parsed.
#[derive(Debug, Error)]
pub enum StreamQueryError {
    /// `task_id` is not a UUID.
    #[error(transparent)]
    Task(#[from] TaskDomainError),
    /// `agent_id` is blank.
    #[error(transparent)]
    Agent(#[from] AgentDomainError),
    /// `event_types` names an unknown type.
    #[error(transparent)]
    EventType(#[from] ParseEventTypeError),
    /// `channel` is not a valid pattern.
    #[error(transparent)]
    Channel(#[from] ChannelDomainError),
}

impl StreamQuery {
    /// Builds the subscription filter the query describes.
    ///
    /// # Errors
    ///
    /// Returns [`StreamQueryError`] for the first value that does not parse.
    pub fn to_filter(&self) -> Result<SubscriptionFilter, StreamQueryError> {
        let mut filter = SubscriptionFilter::new();
        if let Some(raw) = non_blank(self.task_id.as_deref()) {
            filter = filter.with_task(TaskId::parse(raw)?);
        }
        if let Some(raw) = non_blank(self.agent_id.as_deref()) {
            filter = filter.with_agent(AgentId::new(raw)?);
        }
        if let Some(raw) = non_blank(self.event_types.as_deref()) {
            let types = raw
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(EventType::try_from)
                .collect::<Result<Vec<_>, _>>()?;
            filter = filter.with_event_types(types);
        }
        if let Some(raw) = non_blank(self.channel.as_deref()) {
            filter = filter.with_channel_pattern(ChannelPattern::parse(raw)?);
        }
        Ok(filter)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

/// Connections opened with the caller header are owned by that agent, so
/// only it may re-subscribe them through `channel.subscribe_pattern`.
pub(super) async fn open_stream(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<StreamQuery>,
) -> Response {
    let filter = match query.to_filter() {
        Ok(filter) => filter,
        Err(err) => {
            tracing::warn!(error = %err, "rejected stream subscription");
            return (StatusCode::BAD_REQUEST, Json(json!({ "error": err.to_string() })))
                .into_response();
        }
    };

    let owner = headers
        .get(CALLER_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|raw| AgentId::new(raw).ok());
    let opened = match owner {
        Some(agent) => state.streams.create_owned_connection(agent, filter),
        None => state.streams.create_connection(filter),
    };
    let handle = match opened {
        Ok(handle) => handle,
        Err(err) => {
            tracing::error!(error = %err, "failed to open stream connection");
            return (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "error": "stream unavailable" })),
            )
                .into_response();
        }
    };

    let frames = handle
        .into_stream()
        .enumerate()
        .map(|(index, event)| Ok::<_, Infallible>(frame(index.saturating_add(1), &event)));
    Sse::new(frames).into_response()
}

/// Encodes one event as `event: <type>`, `id: <sequence>`, `data: <json>`.
fn frame(sequence: usize, event: &StreamEvent) -> Event {
    let event_type = event.event_type();
    Event::default()
        .event(event_type.as_str())
        .id(sequence.to_string())
        .json_data(event)
        .unwrap_or_else(|err| {
            tracing::error!(error = %err, %event_type, "failed to encode stream event");
            Event::default().comment("event could not be encoded")
        })
}
