//! `POST /rpc`

use super::{AppState, CALLER_HEADER};
use crate::rpc::CallerContext;
use axum::{
    Json,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};

/// Answers `204 No Content` when the body held only notifications.
pub(super) async fn handle_rpc(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let caller = CallerContext::from_header(
        headers
            .get(CALLER_HEADER)
            .and_then(|value| value.to_str().ok()),
    );
    match state.dispatcher.handle(&body, &caller).await {
        Some(reply) => Json(reply).into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    }
}
