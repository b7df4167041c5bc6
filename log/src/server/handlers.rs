//! HTTP route handlers for the log server.
//!
//! Request bodies are parsed from raw bytes so that malformed JSON maps to
//! the log's own error body rather than the framework's rejection.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use serde::de::DeserializeOwned;

use super::error::ApiError;
use super::metrics::Metrics;
use super::proto::{
    CommitOffsetsRequest, ListCommittedOffsetsRequest, PollRequest, Request, Response,
    SendRequest,
};
use crate::CommitLog;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub log: Arc<CommitLog>,
    pub metrics: Arc<Metrics>,
}

fn parse_body<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    Ok(serde_json::from_slice(body)?)
}

async fn send(state: &AppState, request: SendRequest) -> Result<Response, ApiError> {
    let offset = state.log.send(&request.key, request.msg).await?;
    state.metrics.log_send_total.inc();
    Ok(Response::SendOk { offset })
}

async fn poll(state: &AppState, request: PollRequest) -> Result<Response, ApiError> {
    let msgs = state.log.poll(request.offsets).await?;
    let returned: usize = msgs.values().map(Vec::len).sum();
    state.metrics.log_poll_messages_total.inc_by(returned as u64);
    Ok(Response::poll_ok(msgs))
}

async fn commit_offsets(
    state: &AppState,
    request: CommitOffsetsRequest,
) -> Result<Response, ApiError> {
    let count = request.offsets.len();
    state.log.commit_offsets(request.offsets).await?;
    state.metrics.log_commit_offsets_total.inc_by(count as u64);
    Ok(Response::CommitOffsetsOk {})
}

async fn list_committed_offsets(
    state: &AppState,
    request: ListCommittedOffsetsRequest,
) -> Result<Response, ApiError> {
    let offsets = state.log.list_committed_offsets(&request.keys).await?;
    Ok(Response::ListCommittedOffsetsOk { offsets })
}

/// Handle POST /api/v1/log/send
pub async fn handle_send(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Response>, ApiError> {
    let request = parse_body(&body)?;
    Ok(Json(send(&state, request).await?))
}

/// Handle POST /api/v1/log/poll
pub async fn handle_poll(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Response>, ApiError> {
    let request = parse_body(&body)?;
    Ok(Json(poll(&state, request).await?))
}

/// Handle POST /api/v1/log/commit_offsets
pub async fn handle_commit_offsets(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Response>, ApiError> {
    let request = parse_body(&body)?;
    Ok(Json(commit_offsets(&state, request).await?))
}

/// Handle POST /api/v1/log/list_committed_offsets
pub async fn handle_list_committed_offsets(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Response>, ApiError> {
    let request = parse_body(&body)?;
    Ok(Json(list_committed_offsets(&state, request).await?))
}

/// Handle POST /api/v1/rpc
///
/// Accepts any request body tagged with its `type` and replies with the
/// matching `*_ok` body.
pub async fn handle_rpc(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<Response>, ApiError> {
    let response = match parse_body(&body)? {
        Request::Send(request) => send(&state, request).await?,
        Request::Poll(request) => poll(&state, request).await?,
        Request::CommitOffsets(request) => commit_offsets(&state, request).await?,
        Request::ListCommittedOffsets(request) => {
            list_committed_offsets(&state, request).await?
        }
    };
    Ok(Json(response))
}

/// Handle GET /metrics
pub async fn handle_metrics(State(state): State<AppState>) -> String {
    state.metrics.encode()
}

/// Handle GET /-/healthy
pub async fn handle_healthy() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}

/// Handle GET /-/ready
pub async fn handle_ready() -> (StatusCode, &'static str) {
    (StatusCode::OK, "OK")
}
