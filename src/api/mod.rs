//! HTTP API for the engine
//!
//! Thin axum layer over [`crate::engine::Engine`]: request/response DTOs,
//! the caller-identity extractor, and the error-to-status mapping that
//! keeps "no permission" (403) distinguishable from "doesn't exist" (404).

pub mod auth;
pub mod server;

use crate::error::EngineError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// HTTP-facing wrapper for engine errors
#[derive(Debug)]
pub struct ApiError(pub EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

/// Result alias for handlers
pub type ApiResult<T> = std::result::Result<Json<T>, ApiError>;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,

    /// Machine-readable denial reason for 403 responses
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, reason) = match &self.0 {
            EngineError::Unauthenticated => (StatusCode::UNAUTHORIZED, None),
            EngineError::RelationshipNotFound(_) => (StatusCode::NOT_FOUND, None),
            EngineError::RelationshipNotActive { .. } => (StatusCode::BAD_REQUEST, None),
            EngineError::PermissionDenied { reason } => {
                (StatusCode::FORBIDDEN, Some(reason.as_str()))
            }
            EngineError::NotAuthorized(_) => (StatusCode::FORBIDDEN, None),
            EngineError::Validation(_) | EngineError::InvalidId(_) => {
                (StatusCode::BAD_REQUEST, None)
            }
            EngineError::Database(_)
            | EngineError::Config(_)
            | EngineError::Serialization(_)
            | EngineError::Io(_)
            | EngineError::Other(_) => {
                error!("Internal error serving request: {}", self.0);
                (StatusCode::INTERNAL_SERVER_ERROR, None)
            }
        };

        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            "internal server error".to_string()
        } else {
            self.0.to_string()
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                reason,
            }),
        )
            .into_response()
    }
}
