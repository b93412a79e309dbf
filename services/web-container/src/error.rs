//! Client-facing error types
//!
//! Downstream token-exchange failures are not represented here: they happen
//! after the redirect has been answered and only reach logs and metrics.

use axum::http::StatusCode;
use axum::http::header::WWW_AUTHENTICATE;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Challenge sent with every 401.
pub const BASIC_CHALLENGE: &str = "Basic realm=\"Authorization Required\"";

/// Per-request errors surfaced to the caller.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("state_mismatch")]
    StateMismatch { code: String },

    #[error("invalid request body: {0}")]
    InvalidBody(String),

    #[error("authorization required")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::StateMismatch { code } => crate::json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "code": code, "error": "state_mismatch" }),
            ),
            ApiError::InvalidBody(message) => crate::json_response(
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": "invalid_body", "message": message }),
            ),
            ApiError::Unauthorized => {
                (StatusCode::UNAUTHORIZED, [(WWW_AUTHENTICATE, BASIC_CHALLENGE)]).into_response()
            }
        }
    }
}
