//! Configuration types.

use std::path::PathBuf;

use crate::error::{ConfigError, Result};
use crate::onboarding::AuthContext;

/// Portal host configuration, built from environment variables.
#[derive(Debug, Clone)]
pub struct PortalConfig {
    /// Path of the libSQL database holding completion markers.
    pub db_path: PathBuf,
    /// Whether the configured user counts as signed in.
    pub authenticated: bool,
    /// Role string of the configured user.
    pub role: String,
    /// Institution the user belongs to, if any.
    pub institution_id: Option<String>,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("./data/portal.db"),
            authenticated: true,
            role: "institution_admin".to_string(),
            institution_id: None,
        }
    }
}

impl PortalConfig {
    /// Build config from `PORTAL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let db_path = lookup("PORTAL_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or(defaults.db_path);

        let authenticated = match lookup("PORTAL_AUTHENTICATED") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| ConfigError::InvalidValue {
                key: "PORTAL_AUTHENTICATED".to_string(),
                message: format!("expected true or false, got {raw:?}"),
            })?,
            None => defaults.authenticated,
        };

        let role = lookup("PORTAL_ROLE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(defaults.role);

        let institution_id = lookup("PORTAL_INSTITUTION_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        Ok(Self {
            db_path,
            authenticated,
            role,
            institution_id,
        })
    }

    /// Authentication state the router sees for the configured user.
    pub fn auth_context(&self) -> AuthContext {
        if !self.authenticated {
            return AuthContext::anonymous();
        }
        AuthContext::signed_in(self.role.clone(), self.institution_id.clone())
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
