//! Maps domain failures onto HTTP statuses with a `{"detail": ...}` body.

use crate::domain::DomainError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// Missing or wrong `X-API-Key`.
    #[error("Invalid API key")]
    Unauthorized,

    /// Query string or body could not be interpreted.
    #[error("{0}")]
    BadRequest(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Domain(e) => match e {
                DomainError::Validation(_) => StatusCode::BAD_REQUEST,
                DomainError::Forbidden(_) => StatusCode::FORBIDDEN,
                DomainError::NotConnected(_) => StatusCode::CONFLICT,
                DomainError::UpstreamStatus { status: 404, .. } => StatusCode::NOT_FOUND,
                DomainError::Upstream { .. }
                | DomainError::UpstreamStatus { .. }
                | DomainError::Auth(_) => StatusCode::BAD_GATEWAY,
                DomainError::Config(_) | DomainError::SecretStore(_) | DomainError::Crypto(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            // Key material problems stay in the log.
            ApiError::Domain(e @ (DomainError::SecretStore(_) | DomainError::Crypto(_))) => {
                error!(error = %e, "secret handling failed");
                "Internal server error".to_string()
            }
            other => {
                if status.is_server_error() {
                    warn!(status = %status, error = %other, "request failed");
                }
                other.to_string()
            }
        };
        (status, Json(ErrorBody { detail })).into_response()
    }
}
