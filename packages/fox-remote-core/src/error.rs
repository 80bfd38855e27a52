//! Centralized error types for the control surface.
//!
//! This module provides a unified error handling system that:
//! - Defines structured error types using `thiserror`
//! - Maps errors to appropriate HTTP status codes
//! - Implements `IntoResponse` for the `{"status": "error", ...}` payload

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::api::response::api_error;
use crate::player::PlayerError;

/// Errors surfaced by the HTTP endpoints.
///
/// The `Display` text is what clients see in the `message` field.
#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    /// Request body could not be read or parsed.
    #[error("{0}")]
    InvalidRequest(String),

    /// Command was given the wrong number of arguments.
    #[error("invalid args")]
    InvalidArgs,

    /// `set_play_mode` argument does not name a settable mode.
    #[error("invalid play mode")]
    InvalidPlayMode,

    /// Command name is not recognized.
    #[error("unknown command")]
    UnknownCommand,

    /// The player reported a failure.
    #[error("{0}")]
    Player(#[from] PlayerError),

    /// Status could not be encoded.
    #[error("failed to encode status: {0}")]
    Serialization(String),

    /// The connection cannot carry an incrementally flushed stream.
    #[error("streaming unsupported")]
    StreamingUnsupported,
}

impl ControlError {
    /// Returns a machine-readable error code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidRequest(_) => "invalid_request",
            Self::InvalidArgs => "invalid_args",
            Self::InvalidPlayMode => "invalid_play_mode",
            Self::UnknownCommand => "unknown_command",
            Self::Player(_) => "player_error",
            Self::Serialization(_) => "serialization_error",
            Self::StreamingUnsupported => "streaming_unsupported",
        }
    }

    /// Maps the error to an appropriate HTTP status code.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidRequest(_)
            | Self::InvalidArgs
            | Self::InvalidPlayMode
            | Self::UnknownCommand => StatusCode::BAD_REQUEST,
            Self::Player(_) | Self::Serialization(_) | Self::StreamingUnsupported => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// Convenient Result alias for endpoint operations.
pub type ControlResult<T> = Result<T, ControlError>;

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("[API] {} ({}): {}", status, self.code(), self);
        } else {
            log::debug!("[API] {} ({}): {}", status, self.code(), self);
        }
        api_error(status, self.to_string()).into_response()
    }
}
