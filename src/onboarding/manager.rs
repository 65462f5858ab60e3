//! OnboardingManager — hosts one onboarding attempt.
//!
//! The manager owns the session for a single institution, runs the step
//! controllers against it, and hands every new snapshot to the persistence
//! bridge so the completion marker is written as soon as the session
//! finishes.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::error::{OnboardingError, Result};

use super::catalog::StepId;
use super::navigation;
use super::persistence::{CompletionMarkerStore, PersistenceBridge};
use super::router::{self, AuthContext, Role, Route};
use super::session::{OnboardingSession, Progress, SessionCommand, SessionSummary};

struct ManagerState {
    session: OnboardingSession,
    completed_at: Option<DateTime<Utc>>,
    /// Set once the marker for a completed session is durably stored.
    marker_written: bool,
}

/// Coordinates one institution's onboarding session and its marker.
pub struct OnboardingManager {
    bridge: PersistenceBridge,
    institution_id: Option<String>,
    state: RwLock<ManagerState>,
}

impl OnboardingManager {
    pub fn new(markers: Arc<dyn CompletionMarkerStore>, institution_id: Option<String>) -> Self {
        Self {
            bridge: PersistenceBridge::new(markers),
            institution_id,
            state: RwLock::new(ManagerState {
                session: OnboardingSession::new(),
                completed_at: None,
                marker_written: false,
            }),
        }
    }

    pub fn institution_id(&self) -> Option<&str> {
        self.institution_id.as_deref()
    }

    pub fn bridge(&self) -> &PersistenceBridge {
        &self.bridge
    }

    /// Snapshot of the current session.
    pub async fn session(&self) -> OnboardingSession {
        self.state.read().await.session.clone()
    }

    pub async fn current_step(&self) -> StepId {
        self.state.read().await.session.current_step().id
    }

    /// Apply a raw store command.
    pub async fn dispatch(&self, command: SessionCommand) -> OnboardingSession {
        let mut state = self.state.write().await;
        let next = state.session.clone().apply(command);
        self.commit(&mut state, next).await
    }

    /// "Next" on the current step.
    pub async fn advance(&self) -> Result<OnboardingSession> {
        self.navigate(navigation::advance).await
    }

    /// "Skip" on the current step.
    pub async fn skip(&self) -> Result<OnboardingSession> {
        self.navigate(navigation::skip).await
    }

    /// "Previous" on the current step.
    pub async fn back(&self) -> Result<OnboardingSession> {
        self.navigate(navigation::back).await
    }

    /// "Launch" on the review step.
    pub async fn launch(&self) -> Result<OnboardingSession> {
        self.navigate(navigation::launch).await
    }

    /// Write the completion marker without finishing the steps.
    pub async fn skip_to_dashboard(&self) -> Result<()> {
        let id = self
            .institution_id
            .as_deref()
            .ok_or(OnboardingError::MissingInstitutionId)?;
        self.bridge.skip_to_dashboard(id).await?;
        Ok(())
    }

    /// Start the session over. The marker is left alone.
    pub async fn reset(&self) -> OnboardingSession {
        let mut state = self.state.write().await;
        state.session = OnboardingSession::new();
        state.completed_at = None;
        state.marker_written = false;
        info!("Onboarding session reset");
        state.session.clone()
    }

    /// Delete the marker so the wizard is shown on the next visit.
    pub async fn clear_marker(&self) -> Result<bool> {
        let id = self
            .institution_id
            .as_deref()
            .ok_or(OnboardingError::MissingInstitutionId)?;
        Ok(self.bridge.clear(id).await?)
    }

    /// Route for `auth`, reading the marker of the user's institution.
    ///
    /// The hosted session only counts when `auth` belongs to the same
    /// institution as this manager.
    pub async fn resolve_route(&self, auth: &AuthContext) -> Route {
        let own_institution = auth.institution_id() == self.institution_id();
        let session_complete = own_institution && self.state.read().await.session.is_complete();
        let needs_marker = auth
            .user
            .as_ref()
            .and_then(|u| Role::parse(&u.role))
            .is_some_and(|role| role.requires_onboarding());
        let persisted_complete = needs_marker
            && self
                .bridge
                .is_onboarding_complete(auth.institution_id(), false)
                .await;
        router::route(auth, persisted_complete, session_complete)
    }

    /// Current onboarding status.
    pub async fn get_status(&self) -> OnboardingStatus {
        let state = self.state.read().await;
        let session = &state.session;
        let onboarding_completed = self
            .bridge
            .is_onboarding_complete(self.institution_id(), session.is_complete())
            .await;
        OnboardingStatus {
            onboarding_completed,
            current_step: session.current_step().id,
            current_step_index: session.current_step_index(),
            can_advance: navigation::can_advance(session, session.current_step().id),
            progress: session.progress(),
            summary: session.summary(),
            completed_at: state.completed_at,
        }
    }

    async fn navigate<F>(&self, step_fn: F) -> Result<OnboardingSession>
    where
        F: FnOnce(OnboardingSession) -> std::result::Result<OnboardingSession, OnboardingError>,
    {
        let mut state = self.state.write().await;
        let from = state.session.current_step().id;
        let next = step_fn(state.session.clone())?;
        info!(from = %from, to = %next.current_step().id, "Onboarding step changed");
        Ok(self.commit(&mut state, next).await)
    }

    /// Store `next` and write the marker while the session is complete and
    /// no write has succeeded yet.
    async fn commit(&self, state: &mut ManagerState, next: OnboardingSession) -> OnboardingSession {
        let newly_complete = next.is_complete() && !state.session.is_complete();
        state.session = next;
        if newly_complete {
            state.completed_at = Some(Utc::now());
            info!(institution_id = ?self.institution_id, "Onboarding completed");
        }
        let retry = self.institution_id.is_some() && !state.marker_written;
        if state.session.is_complete() && (newly_complete || retry) {
            state.marker_written = self
                .bridge
                .record_completion(&state.session, self.institution_id())
                .await;
        }
        state.session.clone()
    }
}

/// Onboarding status for hosts.
#[derive(Debug, Clone, Serialize)]
pub struct OnboardingStatus {
    pub onboarding_completed: bool,
    pub current_step: StepId,
    pub current_step_index: usize,
    /// Whether "Next" is enabled on the current step.
    pub can_advance: bool,
    pub progress: Progress,
    pub summary: SessionSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}
