//! Error types for the onboarding engine.

use crate::onboarding::catalog::StepId;

/// Top-level error type for the portal onboarding engine.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Step navigation guard failures.
///
/// Store commands never fail; these come from the step controllers, which
/// refuse to advance a step whose required fields are not filled in.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OnboardingError {
    #[error("Step {step} is missing required information")]
    StepIncomplete { step: StepId },

    #[error("Step {step} cannot be skipped")]
    NotSkippable { step: StepId },

    #[error("Step {step} has no previous step")]
    NoPreviousStep { step: StepId },

    #[error("Onboarding cannot be launched from step {step}")]
    NotLaunchable { step: StepId },

    #[error("Onboarding is already complete")]
    AlreadyComplete,

    #[error("No institution id is known for this session")]
    MissingInstitutionId,
}

/// Result type alias for the engine.
pub type Result<T> = std::result::Result<T, Error>;
