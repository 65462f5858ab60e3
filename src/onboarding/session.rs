//! Onboarding session — the in-memory state of one onboarding attempt.
//!
//! The session is a plain value. Every command consumes the current snapshot
//! and returns the next one; nothing here touches storage or routing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::catalog::{StepDescriptor, StepId, initial_steps};
use super::model::{InstitutionProfile, RegistryRecord, RoleRecord, ServiceRecord, TemplateRecord};

/// A discrete mutation of the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SessionCommand {
    SetCurrentStep { index: usize },
    UpdateProfile { patch: Map<String, Value> },
    ReplaceServices { services: Vec<ServiceRecord> },
    ReplaceTemplates { templates: Vec<TemplateRecord> },
    ReplaceRoles { roles: Vec<RoleRecord> },
    ReplaceRegistries { registries: Vec<RegistryRecord> },
    CompleteStep { step_id: String },
    CompleteOnboarding,
    Reset,
}

/// Completion progress over the step catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    /// Whole-number percentage of completed steps.
    pub percent: u8,
    /// Required steps not yet completed, in catalog order.
    pub required_remaining: Vec<StepId>,
}

/// Counts shown on the review step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub institution_name: Option<String>,
    pub services: usize,
    pub templates: usize,
    pub roles: usize,
    pub registries: usize,
    pub signature_configured: bool,
}

/// The aggregate root of an onboarding attempt.
///
/// Deserialization rejects snapshots whose steps differ from the catalog or
/// whose index points past the last step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SessionSnapshot")]
pub struct OnboardingSession {
    current_step_index: usize,
    steps: Vec<StepDescriptor>,
    pub profile: InstitutionProfile,
    pub services: Vec<ServiceRecord>,
    pub templates: Vec<TemplateRecord>,
    pub roles: Vec<RoleRecord>,
    pub registries: Vec<RegistryRecord>,
    is_complete: bool,
}

/// Unchecked wire shape of [`OnboardingSession`].
#[derive(Deserialize)]
struct SessionSnapshot {
    current_step_index: usize,
    steps: Vec<StepDescriptor>,
    #[serde(default)]
    profile: InstitutionProfile,
    #[serde(default)]
    services: Vec<ServiceRecord>,
    #[serde(default)]
    templates: Vec<TemplateRecord>,
    #[serde(default)]
    roles: Vec<RoleRecord>,
    #[serde(default)]
    registries: Vec<RegistryRecord>,
    #[serde(default)]
    is_complete: bool,
}

impl TryFrom<SessionSnapshot> for OnboardingSession {
    type Error = String;

    fn try_from(raw: SessionSnapshot) -> Result<Self, Self::Error> {
        let catalog = initial_steps();
        let same_shape = raw.steps.len() == catalog.len()
            && raw
                .steps
                .iter()
                .zip(&catalog)
                .all(|(s, c)| s.id == c.id && s.order == c.order && s.required == c.required);
        if !same_shape {
            return Err("steps do not match the onboarding catalog".to_string());
        }
        if raw.current_step_index >= raw.steps.len() {
            return Err(format!(
                "current_step_index {} is out of range for {} steps",
                raw.current_step_index,
                raw.steps.len()
            ));
        }
        Ok(Self {
            current_step_index: raw.current_step_index,
            steps: raw.steps,
            profile: raw.profile,
            services: raw.services,
            templates: raw.templates,
            roles: raw.roles,
            registries: raw.registries,
            is_complete: raw.is_complete,
        })
    }
}

impl Default for OnboardingSession {
    fn default() -> Self {
        Self::new()
    }
}

impl OnboardingSession {
    /// A fresh session: every step incomplete, empty collections, first step.
    pub fn new() -> Self {
        Self {
            current_step_index: 0,
            steps: initial_steps(),
            profile: InstitutionProfile::default(),
            services: Vec::new(),
            templates: Vec::new(),
            roles: Vec::new(),
            registries: Vec::new(),
            is_complete: false,
        }
    }

    /// Apply one command and return the resulting snapshot.
    pub fn apply(self, command: SessionCommand) -> Self {
        match command {
            SessionCommand::SetCurrentStep { index } => self.set_current_step(index),
            SessionCommand::UpdateProfile { patch } => self.update_profile(patch),
            SessionCommand::ReplaceServices { services } => self.replace_services(services),
            SessionCommand::ReplaceTemplates { templates } => self.replace_templates(templates),
            SessionCommand::ReplaceRoles { roles } => self.replace_roles(roles),
            SessionCommand::ReplaceRegistries { registries } => {
                self.replace_registries(registries)
            }
            SessionCommand::CompleteStep { step_id } => self.complete_step(&step_id),
            SessionCommand::CompleteOnboarding => self.complete_onboarding(),
            SessionCommand::Reset => self.reset(),
        }
    }

    // ── Commands ────────────────────────────────────────────────────

    /// Move the step pointer. Out-of-range targets are clamped to the last step.
    pub fn set_current_step(mut self, index: usize) -> Self {
        let last = self.steps.len() - 1;
        if index > last {
            warn!(index, last, "Step index out of range, clamping");
        }
        self.current_step_index = index.min(last);
        self
    }

    pub fn update_profile(mut self, patch: Map<String, Value>) -> Self {
        self.profile.merge(patch);
        self
    }

    pub fn replace_services(mut self, services: Vec<ServiceRecord>) -> Self {
        self.services = services;
        self
    }

    pub fn replace_templates(mut self, templates: Vec<TemplateRecord>) -> Self {
        self.templates = templates;
        self
    }

    pub fn replace_roles(mut self, roles: Vec<RoleRecord>) -> Self {
        self.roles = roles;
        self
    }

    pub fn replace_registries(mut self, registries: Vec<RegistryRecord>) -> Self {
        self.registries = registries;
        self
    }

    /// Mark the step with `step_id` completed. Unknown ids are ignored.
    pub fn complete_step(mut self, step_id: &str) -> Self {
        match self.steps.iter_mut().find(|s| s.id.as_str() == step_id) {
            Some(step) => step.completed = true,
            None => debug!(step_id, "Ignoring completion of unknown step"),
        }
        self
    }

    pub fn complete_onboarding(mut self) -> Self {
        self.is_complete = true;
        self
    }

    pub fn reset(self) -> Self {
        Self::new()
    }

    // ── Queries ─────────────────────────────────────────────────────

    pub fn current_step_index(&self) -> usize {
        self.current_step_index
    }

    pub fn current_step(&self) -> &StepDescriptor {
        &self.steps[self.current_step_index]
    }

    pub fn steps(&self) -> &[StepDescriptor] {
        &self.steps
    }

    pub fn step(&self, id: StepId) -> Option<&StepDescriptor> {
        self.steps.iter().find(|s| s.id == id)
    }

    /// Position of `id` in the step list.
    pub fn index_of(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn progress(&self) -> Progress {
        let total = self.steps.len();
        let completed = self.steps.iter().filter(|s| s.completed).count();
        let percent = if total == 0 {
            0
        } else {
            (completed * 100 / total) as u8
        };
        Progress {
            completed,
            total,
            percent,
            required_remaining: self
                .steps
                .iter()
                .filter(|s| s.required && !s.completed)
                .map(|s| s.id)
                .collect(),
        }
    }

    /// Whether every required step before the review has been completed.
    pub fn is_ready_to_launch(&self) -> bool {
        self.steps
            .iter()
            .filter(|s| s.id != StepId::Review)
            .all(|s| s.completed || !s.required)
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            institution_name: self.profile.text("name").map(String::from),
            services: self.services.len(),
            templates: self.templates.len(),
            roles: self.roles.len(),
            registries: self.registries.len(),
            signature_configured: self.profile.signature_policy().is_some(),
        }
    }
}
