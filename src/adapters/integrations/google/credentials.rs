//! Stored OAuth credential for the personal calendar.
//!
//! The credential set lives encrypted in the secret store. Reads go through
//! [`CredentialVault::access_token`], which refreshes an expiring token and writes
//! the refreshed set back before returning. One async mutex serializes the
//! load → refresh → save sequence so concurrent requests never race on a refresh.

use crate::adapters::upstream;
use crate::domain::DomainError;
use crate::ports::{CipherPort, SecretStorePort};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Secret-store key of the encrypted credential set.
pub const TOKEN_KEY: &str = "google_token";

const PROVIDER: &str = "google-oauth";
const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";
/// Refresh this long before the recorded expiry.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

/// Everything needed to call the calendar API and to refresh access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoogleCredential {
    pub token: Option<String>,
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
}

impl GoogleCredential {
    /// An unknown expiry counts as expired so the first use records one.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        if self.refresh_token.is_none() {
            return false;
        }
        if self.token.is_none() {
            return true;
        }
        match self.expiry {
            Some(expiry) => expiry <= now + Duration::seconds(EXPIRY_SKEW_SECS),
            None => true,
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: Option<i64>,
    refresh_token: Option<String>,
    scope: Option<String>,
}

pub struct CredentialVault {
    store: Arc<dyn SecretStorePort>,
    cipher: Arc<dyn CipherPort>,
    client: Client,
    lock: Mutex<()>,
}

impl CredentialVault {
    pub fn new(
        store: Arc<dyn SecretStorePort>,
        cipher: Arc<dyn CipherPort>,
        client: Client,
    ) -> Self {
        Self {
            store,
            cipher,
            client,
            lock: Mutex::new(()),
        }
    }

    /// Decrypt the stored credential, if any.
    pub async fn load(&self) -> Result<Option<GoogleCredential>, DomainError> {
        let Some(sealed) = self.store.get(TOKEN_KEY).await? else {
            return Ok(None);
        };
        let json = self.cipher.decrypt(&sealed)?;
        let credential = serde_json::from_str(&json)
            .map_err(|e| DomainError::Crypto(format!("stored credential is corrupt: {e}")))?;
        Ok(Some(credential))
    }

    /// Encrypt and persist, replacing any previous credential.
    pub async fn save(&self, credential: &GoogleCredential) -> Result<(), DomainError> {
        let json = serde_json::to_string(credential)
            .map_err(|e| DomainError::Crypto(e.to_string()))?;
        let sealed = self.cipher.encrypt(&json)?;
        self.store.set(TOKEN_KEY, &sealed).await
    }

    pub async fn clear(&self) -> Result<(), DomainError> {
        self.store.delete(TOKEN_KEY).await
    }

    /// Current access token, refreshed and re-persisted first when it is about to expire.
    pub async fn access_token(&self) -> Result<String, DomainError> {
        let _guard = self.lock.lock().await;

        let mut credential = self.load().await?.ok_or_else(|| {
            DomainError::NotConnected(
                "Google not connected. Complete the OAuth flow first.".to_string(),
            )
        })?;

        if credential.needs_refresh(Utc::now()) {
            credential = self.refresh(credential).await?;
            self.save(&credential).await?;
            info!(expiry = ?credential.expiry, "google credential refreshed");
        }

        credential
            .token
            .ok_or_else(|| DomainError::NotConnected("stored credential has no access token".into()))
    }

    async fn refresh(&self, credential: GoogleCredential) -> Result<GoogleCredential, DomainError> {
        let refresh_token = credential
            .refresh_token
            .clone()
            .ok_or_else(|| DomainError::Auth("no refresh token".to_string()))?;

        let mut form = vec![
            ("grant_type", "refresh_token".to_string()),
            ("refresh_token", refresh_token),
        ];
        if let Some(id) = &credential.client_id {
            form.push(("client_id", id.clone()));
        }
        if let Some(secret) = &credential.client_secret {
            form.push(("client_secret", secret.clone()));
        }

        let request = self.client.post(&credential.token_uri).form(&form);
        let response: TokenResponse = match upstream::send_json(PROVIDER, request).await {
            Ok(r) => r,
            Err(DomainError::UpstreamStatus { status, body, .. }) => {
                return Err(DomainError::Auth(format!(
                    "token refresh rejected ({status}): {body}"
                )));
            }
            Err(e) => return Err(e),
        };

        Ok(GoogleCredential {
            token: Some(response.access_token),
            refresh_token: response.refresh_token.or(credential.refresh_token),
            expiry: response
                .expires_in
                .map(|secs| Utc::now() + Duration::seconds(secs)),
            scopes: response
                .scope
                .map(|s| s.split_whitespace().map(String::from).collect())
                .unwrap_or(credential.scopes),
            ..credential
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::crypto::AesGcmCipher;
    use crate::adapters::persistence::MemorySecretStore;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn vault() -> (CredentialVault, Arc<MemorySecretStore>) {
        let store = Arc::new(MemorySecretStore::new());
        let cipher =
            AesGcmCipher::from_master_key(Some(&AesGcmCipher::generate_key())).unwrap();
        let vault = CredentialVault::new(store.clone(), Arc::new(cipher), Client::new());
        (vault, store)
    }

    fn credential(token_uri: &str, expiry: Option<DateTime<Utc>>) -> GoogleCredential {
        GoogleCredential {
            token: Some("old-access".into()),
            refresh_token: Some("refresh-1".into()),
            token_uri: token_uri.into(),
            client_id: Some("client".into()),
            client_secret: Some("shh".into()),
            scopes: vec!["https://www.googleapis.com/auth/calendar".into()],
            expiry,
        }
    }

    #[tokio::test]
    async fn test_stored_encrypted() {
        let (vault, store) = vault();
        let cred = credential(DEFAULT_TOKEN_URI, None);
        vault.save(&cred).await.unwrap();

        let raw = store.get(TOKEN_KEY).await.unwrap().unwrap();
        assert!(!raw.contains("refresh-1"));
        assert_eq!(vault.load().await.unwrap(), Some(cred));
    }

    #[tokio::test]
    async fn test_clear_disconnects() {
        let (vault, store) = vault();
        let expiry = Utc::now() + Duration::hours(1);
        vault
            .save(&credential(DEFAULT_TOKEN_URI, Some(expiry)))
            .await
            .unwrap();
        vault.clear().await.unwrap();
        assert_eq!(store.get(TOKEN_KEY).await.unwrap(), None);
        assert!(matches!(
            vault.access_token().await,
            Err(DomainError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_not_connected() {
        let (vault, _) = vault();
        assert!(matches!(
            vault.access_token().await,
            Err(DomainError::NotConnected(_))
        ));
    }

    #[tokio::test]
    async fn test_fresh_token_used_as_is() {
        let (vault, _) = vault();
        let expiry = Utc::now() + Duration::hours(1);
        vault
            .save(&credential("http://127.0.0.1:9/never", Some(expiry)))
            .await
            .unwrap();
        assert_eq!(vault.access_token().await.unwrap(), "old-access");
    }

    #[tokio::test]
    async fn test_expired_token_refreshed_and_persisted() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("grant_type=refresh_token"))
            .and(body_string_contains("refresh_token=refresh-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "new-access",
                "expires_in": 3600,
                "token_type": "Bearer"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let (vault, _) = vault();
        let expired = Utc::now() - Duration::minutes(5);
        vault
            .save(&credential(&format!("{}/token", server.uri()), Some(expired)))
            .await
            .unwrap();

        assert_eq!(vault.access_token().await.unwrap(), "new-access");
        let stored = vault.load().await.unwrap().unwrap();
        assert_eq!(stored.token.as_deref(), Some("new-access"));
        assert_eq!(stored.refresh_token.as_deref(), Some("refresh-1"));
        assert!(stored.expiry.unwrap() > Utc::now());
        // Second call uses the persisted token without another refresh.
        assert_eq!(vault.access_token().await.unwrap(), "new-access");
    }

    #[tokio::test]
    async fn test_rejected_refresh_is_auth_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid_grant"})))
            .mount(&server)
            .await;

        let (vault, _) = vault();
        vault
            .save(&credential(&format!("{}/token", server.uri()), None))
            .await
            .unwrap();
        assert!(matches!(vault.access_token().await, Err(DomainError::Auth(_))));
    }
}
