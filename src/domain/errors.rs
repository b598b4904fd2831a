//! Domain errors. Used by ports, adapters and use cases.
//!
//! Adapters map infrastructure errors into these.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    /// Required credential, base URL or id is not configured.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Personal calendar has no stored credential yet.
    #[error("Not connected: {0}")]
    NotConnected(String),

    /// Caller input rejected before any upstream call.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Transport failure, timeout or unparseable upstream body.
    #[error("{provider} request failed: {message}")]
    Upstream {
        provider: &'static str,
        message: String,
    },

    /// Upstream answered with a non-success status.
    #[error("{provider} API error {status}: {body}")]
    UpstreamStatus {
        provider: &'static str,
        status: u16,
        body: String,
    },

    /// Operation switched off by configuration.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Token refresh rejected by the authorization server.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Secret store error: {0}")]
    SecretStore(String),

    #[error("Crypto error: {0}")]
    Crypto(String),
}

impl DomainError {
    pub fn upstream(provider: &'static str, message: impl ToString) -> Self {
        DomainError::Upstream {
            provider,
            message: message.to_string(),
        }
    }

    /// True when the upstream reported that the addressed record does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, DomainError::UpstreamStatus { status: 404, .. })
    }
}
