//! Shared plumbing for upstream REST calls: client construction and response checks.

use crate::domain::DomainError;
use reqwest::{Client, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::warn;

/// Bytes of an error body kept in `UpstreamStatus`.
const ERROR_BODY_LIMIT: usize = 200;

/// HTTP client with the fixed per-request timeout. Exceeding it is a fetch failure.
pub fn build_client(provider: &'static str, timeout: Duration) -> Result<Client, DomainError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| DomainError::upstream(provider, format!("client init failed: {e}")))
}

/// `base` with `segments` appended as percent-encoded path segments.
///
/// Ids from config or callers may carry `#`, `/` or `?`; each stays inside its own segment.
pub fn endpoint(provider: &'static str, base: &str, segments: &[&str]) -> Result<Url, DomainError> {
    let mut url = Url::parse(base)
        .map_err(|e| DomainError::upstream(provider, format!("invalid base url {base:?}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| DomainError::upstream(provider, format!("base url {base:?} cannot carry a path")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Send the request and fail on transport errors or non-success statuses.
pub async fn send(provider: &'static str, request: RequestBuilder) -> Result<Response, DomainError> {
    let response = request.send().await.map_err(|e| {
        if e.is_timeout() {
            DomainError::upstream(provider, "request timed out")
        } else {
            DomainError::upstream(provider, e)
        }
    })?;

    if !response.status().is_success() {
        let status = response.status();
        let text = response.text().await.unwrap_or_default();
        warn!(provider, status = %status, "upstream returned error");
        return Err(DomainError::UpstreamStatus {
            provider,
            status: status.as_u16(),
            body: text.chars().take(ERROR_BODY_LIMIT).collect(),
        });
    }

    Ok(response)
}

/// [`send`] and decode the JSON body.
pub async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, DomainError> {
    send(provider, request)
        .await?
        .json()
        .await
        .map_err(|e| DomainError::upstream(provider, format!("failed to parse response: {e}")))
}

/// [`send`] and return the body as text.
pub async fn send_text(provider: &'static str, request: RequestBuilder) -> Result<String, DomainError> {
    send(provider, request)
        .await?
        .text()
        .await
        .map_err(|e| DomainError::upstream(provider, format!("failed to read body: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_keeps_ids_in_one_segment() {
        let url = endpoint(
            "test",
            "https://api.example.com/v3/",
            &["calendars", "en.austrian#holiday@group.v.calendar.google.com", "events"],
        )
        .unwrap();
        assert_eq!(
            url.path(),
            "/v3/calendars/en.austrian%23holiday@group.v.calendar.google.com/events"
        );
        assert!(url.fragment().is_none());

        let url = endpoint("test", "http://127.0.0.1:9000", &["events", "a/b?x=1"]).unwrap();
        assert_eq!(url.path(), "/events/a%2Fb%3Fx=1");
        assert!(url.query().is_none());
    }

    #[test]
    fn test_endpoint_rejects_bad_base() {
        assert!(matches!(
            endpoint("test", "not a url", &["x"]),
            Err(DomainError::Upstream { .. })
        ));
    }
}
