//! Persistence bridge — the per-institution completion marker.
//!
//! Only one value outlives a page reload: `onboarding_completed_<id>` set to
//! `"true"`. Step and collection state is never written.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::DatabaseError;
use crate::store::Database;

use super::session::OnboardingSession;

/// Value written under the marker key when onboarding is complete.
pub const MARKER_VALUE: &str = "true";

/// Settings owner under which markers are stored.
pub const SETTINGS_OWNER: &str = "portal";

/// Storage key of the completion marker for an institution.
pub fn marker_key(institution_id: &str) -> String {
    format!("onboarding_completed_{institution_id}")
}

/// Durable string key/value storage for completion markers.
#[async_trait]
pub trait CompletionMarkerStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<String>, DatabaseError>;

    async fn write(&self, key: &str, value: &str) -> Result<(), DatabaseError>;

    /// Remove a marker. Returns whether one existed.
    async fn remove(&self, key: &str) -> Result<bool, DatabaseError>;
}

/// Process-local marker store, for tests and ephemeral hosts.
#[derive(Default)]
pub struct InMemoryMarkerStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryMarkerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompletionMarkerStore for InMemoryMarkerStore {
    async fn read(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<bool, DatabaseError> {
        Ok(self.values.write().await.remove(key).is_some())
    }
}

/// Marker store backed by the settings table.
pub struct SettingsMarkerStore {
    db: Arc<dyn Database>,
}

impl SettingsMarkerStore {
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CompletionMarkerStore for SettingsMarkerStore {
    async fn read(&self, key: &str) -> Result<Option<String>, DatabaseError> {
        let value = self.db.get_setting(SETTINGS_OWNER, key).await?;
        // Markers are always written as JSON strings.
        Ok(value.and_then(|v| v.as_str().map(String::from)))
    }

    async fn write(&self, key: &str, value: &str) -> Result<(), DatabaseError> {
        self.db
            .set_setting(SETTINGS_OWNER, key, &serde_json::Value::from(value))
            .await
    }

    async fn remove(&self, key: &str) -> Result<bool, DatabaseError> {
        self.db.delete_setting(SETTINGS_OWNER, key).await
    }
}

/// Reads and writes completion markers on behalf of the hosting component.
#[derive(Clone)]
pub struct PersistenceBridge {
    store: Arc<dyn CompletionMarkerStore>,
}

impl PersistenceBridge {
    pub fn new(store: Arc<dyn CompletionMarkerStore>) -> Self {
        Self { store }
    }

    /// Whether the marker for `institution_id` reads `"true"`.
    pub async fn is_marked(&self, institution_id: &str) -> Result<bool, DatabaseError> {
        let value = self.store.read(&marker_key(institution_id)).await?;
        Ok(value.as_deref() == Some(MARKER_VALUE))
    }

    /// Whether the wizard should be bypassed.
    ///
    /// A failed read counts as "not complete", so the wizard is shown again.
    pub async fn is_onboarding_complete(
        &self,
        institution_id: Option<&str>,
        session_complete: bool,
    ) -> bool {
        if session_complete {
            return true;
        }
        let Some(id) = institution_id else {
            return false;
        };
        match self.is_marked(id).await {
            Ok(marked) => marked,
            Err(e) => {
                warn!(institution_id = id, "Failed to read onboarding marker: {}", e);
                false
            }
        }
    }

    /// Write the marker if `session` is complete. Returns whether it was written.
    ///
    /// Without an institution id nothing is written and the completion only
    /// lives as long as the session.
    pub async fn record_completion(
        &self,
        session: &OnboardingSession,
        institution_id: Option<&str>,
    ) -> bool {
        if !session.is_complete() {
            return false;
        }
        let Some(id) = institution_id else {
            warn!("Onboarding completed without an institution id; marker not written");
            return false;
        };
        match self.write_marker(id).await {
            Ok(()) => true,
            Err(e) => {
                warn!(institution_id = id, "Failed to persist onboarding marker: {}", e);
                false
            }
        }
    }

    /// Mark onboarding done without completing any step.
    pub async fn skip_to_dashboard(&self, institution_id: &str) -> Result<(), DatabaseError> {
        info!(institution_id, "Skipping onboarding to dashboard");
        self.write_marker(institution_id).await
    }

    /// Delete the marker so the wizard is shown again.
    pub async fn clear(&self, institution_id: &str) -> Result<bool, DatabaseError> {
        let removed = self.store.remove(&marker_key(institution_id)).await?;
        debug!(institution_id, removed, "Cleared onboarding marker");
        Ok(removed)
    }

    async fn write_marker(&self, institution_id: &str) -> Result<(), DatabaseError> {
        self.store
            .write(&marker_key(institution_id), MARKER_VALUE)
            .await?;
        debug!(institution_id, "Onboarding marker written");
        Ok(())
    }
}
