//! AES-256-GCM implementation of CipherPort.
//!
//! Output is `base64(nonce || ciphertext)` with a fresh 96-bit nonce per call.
//! The key is a base64 (standard or URL-safe) encoding of 32 bytes.

use crate::domain::DomainError;
use crate::ports::CipherPort;
use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Nonce};
use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE};

const NONCE_LEN: usize = 12;
const KEY_LEN: usize = 32;

/// Cipher for credentials at rest. Without a key every call fails with a config error.
pub struct AesGcmCipher {
    cipher: Option<Aes256Gcm>,
}

impl std::fmt::Debug for AesGcmCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AesGcmCipher")
            .field("key", &"[REDACTED]")
            .field("configured", &self.cipher.is_some())
            .finish()
    }
}

impl AesGcmCipher {
    /// Build from the configured master key. `None` yields an unconfigured cipher;
    /// a key that is not 32 bytes of base64 is rejected immediately.
    pub fn from_master_key(master_key: Option<&str>) -> Result<Self, DomainError> {
        let Some(encoded) = master_key else {
            return Ok(Self { cipher: None });
        };
        let encoded = encoded.trim();
        let key = STANDARD
            .decode(encoded)
            .or_else(|_| URL_SAFE.decode(encoded))
            .map_err(|e| DomainError::Config(format!("MASTER_KEY is not valid base64: {e}")))?;
        Self::from_bytes(&key).map(|c| Self {
            cipher: Some(c),
        })
    }

    fn from_bytes(key: &[u8]) -> Result<Aes256Gcm, DomainError> {
        if key.len() != KEY_LEN {
            return Err(DomainError::Config(format!(
                "MASTER_KEY must decode to {KEY_LEN} bytes, got {}",
                key.len()
            )));
        }
        Aes256Gcm::new_from_slice(key)
            .map_err(|e| DomainError::Config(format!("invalid MASTER_KEY: {e}")))
    }

    /// Random key, base64-encoded, suitable for MASTER_KEY.
    pub fn generate_key() -> String {
        STANDARD.encode(Aes256Gcm::generate_key(&mut OsRng))
    }

    fn cipher(&self) -> Result<&Aes256Gcm, DomainError> {
        self.cipher
            .as_ref()
            .ok_or_else(|| DomainError::Config("MASTER_KEY is missing".to_string()))
    }
}

impl CipherPort for AesGcmCipher {
    fn encrypt(&self, plaintext: &str) -> Result<String, DomainError> {
        let cipher = self.cipher()?;
        let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
        let ciphertext = cipher
            .encrypt(&nonce, plaintext.as_bytes())
            .map_err(|e| DomainError::Crypto(format!("encryption failed: {e}")))?;

        let mut payload = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        payload.extend_from_slice(&nonce);
        payload.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(payload))
    }

    fn decrypt(&self, ciphertext: &str) -> Result<String, DomainError> {
        let cipher = self.cipher()?;
        let payload = STANDARD
            .decode(ciphertext.trim())
            .map_err(|e| DomainError::Crypto(format!("base64 decode failed: {e}")))?;
        if payload.len() <= NONCE_LEN {
            return Err(DomainError::Crypto("ciphertext too short".to_string()));
        }
        let (nonce, body) = payload.split_at(NONCE_LEN);
        let plain = cipher
            .decrypt(Nonce::from_slice(nonce), body)
            .map_err(|e| DomainError::Crypto(format!("decryption failed: {e}")))?;
        String::from_utf8(plain).map_err(|e| DomainError::Crypto(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encrypt_decrypt() {
        let key = AesGcmCipher::generate_key();
        let cipher = AesGcmCipher::from_master_key(Some(&key)).unwrap();
        let sealed = cipher.encrypt(r#"{"token":"abc"}"#).unwrap();
        assert!(!sealed.contains("abc"));
        assert_eq!(cipher.decrypt(&sealed).unwrap(), r#"{"token":"abc"}"#);
    }

    #[test]
    fn test_nonce_differs_per_call() {
        let key = AesGcmCipher::generate_key();
        let cipher = AesGcmCipher::from_master_key(Some(&key)).unwrap();
        assert_ne!(cipher.encrypt("x").unwrap(), cipher.encrypt("x").unwrap());
    }

    #[test]
    fn test_wrong_key_fails() {
        let a = AesGcmCipher::from_master_key(Some(&AesGcmCipher::generate_key())).unwrap();
        let b = AesGcmCipher::from_master_key(Some(&AesGcmCipher::generate_key())).unwrap();
        let sealed = a.encrypt("secret").unwrap();
        assert!(matches!(b.decrypt(&sealed), Err(DomainError::Crypto(_))));
    }

    #[test]
    fn test_url_safe_key_accepted() {
        let raw = [0xfbu8; 32];
        let key = URL_SAFE.encode(raw);
        assert!(key.contains('-') || key.contains('_'));
        assert!(AesGcmCipher::from_master_key(Some(&key)).is_ok());
    }

    #[test]
    fn test_missing_or_short_key() {
        let unconfigured = AesGcmCipher::from_master_key(None).unwrap();
        assert!(matches!(unconfigured.encrypt("x"), Err(DomainError::Config(_))));
        let short = STANDARD.encode([1u8; 16]);
        assert!(matches!(
            AesGcmCipher::from_master_key(Some(&short)),
            Err(DomainError::Config(_))
        ));
    }
}
