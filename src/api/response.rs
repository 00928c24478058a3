//! JSON response envelope and error mapping.
//!
//! Every endpoint answers `{success, data?, error?}`. Domain errors map to
//! 400/401/403/404; anything else is a 500 whose detail is only shown in
//! debug builds.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::errors::Error;

/// Uniform response body.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded
    pub success: bool,
    /// Payload on success
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Message on failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Handler result: an enveloped payload or an [`Error`].
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, Error>;

/// Wraps a payload in a successful envelope.
#[allow(clippy::unnecessary_wraps)]
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data: Some(data),
        error: None,
    }))
}

/// Acknowledgement body for endpoints with nothing to return.
#[derive(Debug, Serialize)]
pub struct Ack {
    /// Human-readable confirmation
    pub message: &'static str,
}

/// Shorthand for an [`Ack`] envelope.
#[allow(clippy::unnecessary_wraps)]
pub fn ack(message: &'static str) -> ApiResult<Ack> {
    ok(Ack { message })
}

impl Error {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation { .. }
            | Self::InvalidQuantity { .. }
            | Self::InvalidInput { .. }
            | Self::Conflict { .. }
            | Self::InvalidState { .. }
            | Self::InsufficientStock { .. } => StatusCode::BAD_REQUEST,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Config { .. }
            | Self::Database(_)
            | Self::PasswordHash { .. }
            | Self::Token(_)
            | Self::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "Request error");
            if cfg!(debug_assertions) {
                self.to_string()
            } else {
                "Internal server error".to_string()
            }
        } else {
            self.to_string()
        };

        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(message),
        };
        (status, Json(body)).into_response()
    }
}
