//! Response envelopes shared by the JSON endpoints.
//!
//! Every command outcome is either `{"status": "ok"}` or
//! `{"status": "error", "message": ...}`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

/// JSON envelope for command outcomes.
#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ApiResponse {
    /// Request succeeded.
    Ok,
    /// Request failed.
    Error {
        /// Human-readable failure description.
        message: String,
    },
}

/// Returns `200 {"status": "ok"}`.
pub fn api_ok() -> impl IntoResponse {
    (StatusCode::OK, Json(ApiResponse::Ok))
}

/// Returns `{"status": "error", "message": ...}` with the given status code.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::Error {
            message: message.into(),
        }),
    )
}
