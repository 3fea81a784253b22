//! Error responses of the stub API.
//!
//! [`ApiError`] implements [`IntoResponse`] so handlers can return
//! `Result<…, ApiError>` directly. Some variants answer with a JSON
//! `{"error": …}` body, others with plain text, matching what the real
//! backend sends for the same failure.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

/// Failure modes of the stub handlers.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed or expired bearer token.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Malformed request, answered as JSON.
    #[error("{0}")]
    BadRequest(String),

    /// Malformed request, answered as plain text.
    #[error("{0}")]
    BadRequestText(String),

    /// Unknown resource.
    #[error("{0}")]
    NotFound(String),

    /// Stub switched to unavailable.
    #[error("service unavailable")]
    Unavailable,

    /// Token signing failed.
    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let (status, plain) = match &self {
            Self::Unauthorized(_) => (StatusCode::UNAUTHORIZED, true),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, false),
            Self::BadRequest(_) => (StatusCode::BAD_REQUEST, false),
            Self::BadRequestText(_) => (StatusCode::BAD_REQUEST, true),
            Self::NotFound(_) => (StatusCode::NOT_FOUND, false),
            Self::Unavailable => (StatusCode::SERVICE_UNAVAILABLE, true),
            Self::Token(_) => (StatusCode::INTERNAL_SERVER_ERROR, false),
        };

        tracing::debug!(%status, error = %message, "request failed");
        if plain {
            (status, message).into_response()
        } else {
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}
