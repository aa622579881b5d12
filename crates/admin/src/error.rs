//! Unified error handling for admin.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::mirror::MirrorError;
use crate::remote::RemoteError;

/// Application-level error type for the admin panel.
///
/// Migration outcomes are never turned into an `AppError`; handlers return
/// them as results.
#[derive(Debug, Error)]
pub enum AppError {
    /// Local mirror could not be persisted.
    #[error("Mirror error: {0}")]
    Mirror(#[from] MirrorError),

    /// Remote store operation failed.
    #[error("Remote store error: {0}")]
    Remote(#[from] RemoteError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log server errors with Sentry
        if matches!(self, Self::Mirror(_) | Self::Internal(_) | Self::Remote(_)) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Admin request error"
            );
        }

        let status = match &self {
            Self::Mirror(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Remote(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Mirror(_) | Self::Internal(_) => "Internal server error".to_string(),
            Self::Remote(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}
