//! Shared-secret check for every route except `/health`.

use super::AppState;
use super::error::ApiError;
use crate::domain::DomainError;
use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Use with `axum::middleware::from_fn_with_state`. An unset server key fails every
/// request with 500 rather than letting them through.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return ApiError::from(DomainError::Config("HUB_API_KEY missing".to_string()))
            .into_response();
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if provided != expected {
        return ApiError::Unauthorized.into_response();
    }

    next.run(request).await
}
