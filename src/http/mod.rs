//! HTTP surface: JSON-RPC endpoint, event stream and discovery document.
//!
//! | Route                          | Purpose                                 |
//! |--------------------------------|-----------------------------------------|
//! | `POST /rpc`                    | JSON-RPC 2.0 requests and batches       |
//! | `GET /stream`                  | Server-Sent Events filtered by query    |
//! | `GET /.well-known/agent.json`  | Agent Card of this hub                  |
//! | `GET /health`                  | Liveness and open connection count      |
//!
//! Callers are identified by the [`CALLER_HEADER`] set by the authenticating
//! proxy in front of the hub.

mod discovery;
mod rpc;
mod stream;

use crate::agent::domain::AgentCard;
use crate::hub::{HubDispatcher, HubStreams};
use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

pub use discovery::HealthReport;
pub use stream::{StreamQuery, StreamQueryError};

/// Header carrying the verified caller agent identifier.
pub const CALLER_HEADER: &str = "x-a2a-caller";

/// Shared state handed to every route.
#[derive(Clone)]
pub struct AppState {
    dispatcher: Arc<HubDispatcher>,
    streams: Arc<HubStreams>,
    local_card: Arc<AgentCard>,
}

impl AppState {
    /// Creates the route state.
    #[must_use]
    pub const fn new(
        dispatcher: Arc<HubDispatcher>,
        streams: Arc<HubStreams>,
        local_card: Arc<AgentCard>,
    ) -> Self {
        Self {
            dispatcher,
            streams,
            local_card,
        }
    }
}

/// Builds the axum router for the hub.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/rpc", post(rpc::handle_rpc))
        .route("/stream", get(stream::open_stream))
        .route("/.well-known/agent.json", get(discovery::agent_card))
        .route("/health", get(discovery::health))
        .with_state(state)
}

#[cfg(test)]
mod tests;
