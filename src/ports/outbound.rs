//! Outbound infrastructure ports other than the providers.
//!
//! Implemented by adapters.

use crate::domain::DomainError;

/// Opaque key/value persistence for long-lived credentials.
#[async_trait::async_trait]
pub trait SecretStorePort: Send + Sync {
    /// Returns `None` when the key was never set.
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError>;

    /// Insert or overwrite.
    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError>;

    async fn delete(&self, key: &str) -> Result<(), DomainError>;
}

/// Symmetric cipher keyed by one process-wide secret.
pub trait CipherPort: Send + Sync {
    fn encrypt(&self, plaintext: &str) -> Result<String, DomainError>;

    fn decrypt(&self, ciphertext: &str) -> Result<String, DomainError>;
}
