//! Secret persistence adapters. Implement SecretStorePort.

pub mod memory_store;
pub mod sqlite_store;

pub use memory_store::MemorySecretStore;
pub use sqlite_store::SqliteSecretStore;
