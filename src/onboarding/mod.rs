//! Institution onboarding — the guided, resumable setup workflow.
//!
//! A new institution admin walks through a fixed sequence of steps that
//! collect the institution's profile, services, templates, signature policy,
//! roles and registries. Once launched, a completion marker keyed by the
//! institution id lets the router send the admin straight to the main shell.

pub mod catalog;
pub mod manager;
pub mod model;
pub mod navigation;
pub mod persistence;
pub mod router;
pub mod session;

pub use catalog::{StepDescriptor, StepId};
pub use manager::{OnboardingManager, OnboardingStatus};
pub use model::{
    FieldKind, InstitutionProfile, RecordId, RegistryField, RegistryRecord, RoleRecord,
    ServiceRecord, SignatureMode, SignaturePolicy, TemplateFormat, TemplateRecord,
};
pub use persistence::{
    CompletionMarkerStore, InMemoryMarkerStore, PersistenceBridge, SettingsMarkerStore,
    marker_key,
};
pub use router::{AuthContext, AuthUser, LoginReason, Role, Route, route};
pub use session::{OnboardingSession, Progress, SessionCommand, SessionSummary};
