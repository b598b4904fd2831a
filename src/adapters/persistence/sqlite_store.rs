//! SQLite-backed secret store via libsql. Implements SecretStorePort.
//!
//! Single `kv` table keyed by name; `set` is an upsert. Values are stored as given:
//! callers encrypt before writing.

use crate::domain::DomainError;
use crate::ports::SecretStorePort;
use libsql::{Database, params};
use std::path::Path;
use tracing::{debug, info};

const KV_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS kv (
    k TEXT PRIMARY KEY,
    v TEXT NOT NULL
)"#;

/// Key/value secret store in one database file.
pub struct SqliteSecretStore {
    db: Database,
}

impl SqliteSecretStore {
    /// Open (or create) the database file and ensure the schema exists.
    /// Call once at startup; the returned store is safe to share via Arc.
    pub async fn connect(db_path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let db_path = db_path.as_ref();
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| DomainError::SecretStore(e.to_string()))?;
        }
        let path_str = db_path.to_string_lossy();
        let db = libsql::Builder::new_local(path_str.as_ref())
            .build()
            .await
            .map_err(|e| DomainError::SecretStore(e.to_string()))?;
        let conn = db
            .connect()
            .map_err(|e| DomainError::SecretStore(e.to_string()))?;
        conn.execute(KV_TABLE, ())
            .await
            .map_err(|e| DomainError::SecretStore(e.to_string()))?;

        info!(path = %db_path.display(), "secret store opened");

        Ok(Self { db })
    }

    fn conn(&self) -> Result<libsql::Connection, DomainError> {
        self.db
            .connect()
            .map_err(|e| DomainError::SecretStore(e.to_string()))
    }
}

#[async_trait::async_trait]
impl SecretStorePort for SqliteSecretStore {
    async fn get(&self, key: &str) -> Result<Option<String>, DomainError> {
        let conn = self.conn()?;
        let mut rows = conn
            .query("SELECT v FROM kv WHERE k = ?1", params![key])
            .await
            .map_err(|e| DomainError::SecretStore(e.to_string()))?;

        if let Some(row) = rows
            .next()
            .await
            .map_err(|e| DomainError::SecretStore(e.to_string()))?
        {
            let value: String = row
                .get(0)
                .map_err(|e| DomainError::SecretStore(e.to_string()))?;
            Ok(Some(value))
        } else {
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute(
            r#"
            INSERT INTO kv (k, v) VALUES (?1, ?2)
            ON CONFLICT (k) DO UPDATE SET v = excluded.v
            "#,
            params![key, value],
        )
        .await
        .map_err(|e| DomainError::SecretStore(e.to_string()))?;
        debug!(key, "secret stored");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), DomainError> {
        let conn = self.conn()?;
        conn.execute("DELETE FROM kv WHERE k = ?1", params![key])
            .await
            .map_err(|e| DomainError::SecretStore(e.to_string()))?;
        Ok(())
    }
}
