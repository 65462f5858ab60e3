//! `Database` trait — the async storage interface used by the engine.

use async_trait::async_trait;

use crate::error::DatabaseError;

/// Backend-agnostic settings storage.
///
/// Values are JSON, scoped by an owner id and a key.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run all pending schema migrations.
    async fn run_migrations(&self) -> Result<(), DatabaseError>;

    /// Read a setting. `Ok(None)` when the key has never been written.
    async fn get_setting(
        &self,
        owner_id: &str,
        key: &str,
    ) -> Result<Option<serde_json::Value>, DatabaseError>;

    /// Insert or overwrite a setting.
    async fn set_setting(
        &self,
        owner_id: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError>;

    /// Delete a setting. Returns whether a row was removed.
    async fn delete_setting(&self, owner_id: &str, key: &str) -> Result<bool, DatabaseError>;
}
