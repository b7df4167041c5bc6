//! HTTP error types for the log server.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use super::proto;
use crate::Error;

/// Error code for requests that could not be understood.
pub const MALFORMED_REQUEST: u32 = 12;

/// Error code for operations that gave up under contention and may be
/// retried.
pub const TEMPORARILY_UNAVAILABLE: u32 = 11;

/// Error code for failures with unknown effect.
pub const CRASH: u32 = 13;

/// Error wrapper for converting log errors to HTTP responses.
///
/// Error responses have the format:
/// ```json
/// { "type": "error", "code": 13, "text": "..." }
/// ```
#[derive(Debug)]
pub struct ApiError(pub Error);

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, u32) {
        match &self.0 {
            Error::InvalidInput(_) => (StatusCode::BAD_REQUEST, MALFORMED_REQUEST),
            Error::Contention(_) => (StatusCode::SERVICE_UNAVAILABLE, TEMPORARILY_UNAVAILABLE),
            Error::Storage(_) | Error::Encoding(_) | Error::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, CRASH)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, "request failed");
        }
        let body = proto::Response::Error {
            code,
            text: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError(Error::InvalidInput(format!("malformed request body: {}", err)))
    }
}
