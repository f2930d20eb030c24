//! Discovery document and health check.

use super::AppState;
use crate::agent::domain::AgentCard;
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthReport {
    /// `ok`, or `degraded` when the connection index is unavailable.
    pub status: String,
    /// Crate version.
    pub version: String,
    /// Open streaming connections.
    pub connections: usize,
}

pub(super) async fn agent_card(State(state): State<AppState>) -> Json<AgentCard> {
    Json(AgentCard::clone(&state.local_card))
}

pub(super) async fn health(State(state): State<AppState>) -> Response {
    let version = env!("CARGO_PKG_VERSION").to_owned();
    match state.streams.connection_count() {
        Ok(connections) => Json(HealthReport {
            status: "ok".to_owned(),
            version,
            connections,
        })
        .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "health check could not count connections");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthReport {
                    status: "degraded".to_owned(),
                    version,
                    connections: 0,
                }),
            )
                .into_response()
        }
    }
}
