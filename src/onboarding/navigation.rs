//! Step controllers — how each step advances, skips and goes back.
//!
//! Targets come from a transition table keyed by step id and are resolved to
//! an index through the session's own step list, so moving a step in the
//! catalog cannot desynchronise navigation.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::OnboardingError;

use super::catalog::StepId;
use super::session::OnboardingSession;

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid")
});

/// Outgoing edges of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub next: Option<StepId>,
    pub previous: Option<StepId>,
    pub skippable: bool,
}

/// The transition table.
pub fn transition(step: StepId) -> Transition {
    use StepId::*;
    let (previous, next, skippable) = match step {
        Welcome => (None, Some(Profile), false),
        Profile => (Some(Welcome), Some(Services), false),
        Services => (Some(Profile), Some(Templates), true),
        Templates => (Some(Services), Some(Signatures), true),
        Signatures => (Some(Templates), Some(Roles), true),
        Roles => (Some(Signatures), Some(Registry), false),
        Registry => (Some(Roles), Some(Review), true),
        Review => (Some(Registry), None, false),
    };
    Transition {
        next,
        previous,
        skippable,
    }
}

/// Whether the step's required fields are filled in, i.e. "Next" is enabled.
pub fn can_advance(session: &OnboardingSession, step: StepId) -> bool {
    match step {
        StepId::Welcome | StepId::Templates | StepId::Signatures => true,
        StepId::Profile => {
            let profile = &session.profile;
            profile.text("name").is_some()
                && profile.text("institution_type").is_some()
                && profile.text("email").is_some_and(|e| EMAIL_RE.is_match(e))
        }
        StepId::Services => session.services.iter().any(|s| !s.name.trim().is_empty()),
        StepId::Roles => session.roles.iter().any(|r| !r.permissions.is_empty()),
        StepId::Registry => session.registries.iter().any(|r| !r.fields.is_empty()),
        StepId::Review => session.is_ready_to_launch(),
    }
}

/// Complete the current step and move to its successor.
pub fn advance(session: OnboardingSession) -> Result<OnboardingSession, OnboardingError> {
    ensure_open(&session)?;
    let step = session.current_step().id;
    if !can_advance(&session, step) {
        return Err(OnboardingError::StepIncomplete { step });
    }
    Ok(complete_and_move(session, step))
}

/// Same as [`advance`] without the required-field check. Only some steps
/// offer it, and a skipped step still counts as completed.
pub fn skip(session: OnboardingSession) -> Result<OnboardingSession, OnboardingError> {
    ensure_open(&session)?;
    let step = session.current_step().id;
    if !transition(step).skippable {
        return Err(OnboardingError::NotSkippable { step });
    }
    Ok(complete_and_move(session, step))
}

/// Return to the previous step. Completion flags are untouched.
pub fn back(session: OnboardingSession) -> Result<OnboardingSession, OnboardingError> {
    ensure_open(&session)?;
    let step = session.current_step().id;
    let target = transition(step)
        .previous
        .and_then(|prev| session.index_of(prev))
        .ok_or(OnboardingError::NoPreviousStep { step })?;
    Ok(session.set_current_step(target))
}

/// Finish the workflow from the review step.
pub fn launch(session: OnboardingSession) -> Result<OnboardingSession, OnboardingError> {
    ensure_open(&session)?;
    let step = session.current_step().id;
    if step != StepId::Review {
        return Err(OnboardingError::NotLaunchable { step });
    }
    if !can_advance(&session, step) {
        return Err(OnboardingError::StepIncomplete { step });
    }
    Ok(session
        .complete_step(StepId::Review.as_str())
        .complete_onboarding())
}

fn ensure_open(session: &OnboardingSession) -> Result<(), OnboardingError> {
    if session.is_complete() {
        return Err(OnboardingError::AlreadyComplete);
    }
    Ok(())
}

fn complete_and_move(session: OnboardingSession, step: StepId) -> OnboardingSession {
    let session = session.complete_step(step.as_str());
    match transition(step).next.and_then(|next| session.index_of(next)) {
        Some(target) => session.set_current_step(target),
        None => session,
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use serde_json::json;

    use super::*;
    use crate::onboarding::model::{FieldKind, RegistryField, RegistryRecord, RoleRecord, ServiceRecord};

    fn at(step: StepId) -> OnboardingSession {
        let session = OnboardingSession::new();
        let index = session.index_of(step).unwrap();
        session.set_current_step(index)
    }

    fn filled_profile(session: OnboardingSession) -> OnboardingSession {
        session.update_profile(
            json!({
                "name": "University of Ghana",
                "institution_type": "university",
                "email": "registrar@ug.edu.gh"
            })
            .as_object()
            .cloned()
            .unwrap(),
        )
    }

    #[test]
    fn transition_table_follows_catalog_order() {
        let ids = StepId::ALL;
        for pair in ids.windows(2) {
            assert_eq!(transition(pair[0]).next, Some(pair[1]));
            assert_eq!(transition(pair[1]).previous, Some(pair[0]));
        }
        assert_eq!(transition(StepId::Welcome).previous, None);
        assert_eq!(transition(StepId::Review).next, None);
    }

    #[test]
    fn skippable_steps() {
        let skippable: Vec<StepId> = StepId::ALL
            .into_iter()
            .filter(|id| transition(*id).skippable)
            .collect();
        assert_eq!(
            skippable,
            vec![StepId::Services, StepId::Templates, StepId::Signatures, StepId::Registry]
        );
    }

    #[test]
    fn welcome_advances_to_profile() {
        let session = advance(OnboardingSession::new()).unwrap();
        assert_eq!(session.current_step().id, StepId::Profile);
        assert!(session.step(StepId::Welcome).unwrap().completed);
    }

    #[test]
    fn profile_requires_name_type_and_valid_email() {
        let session = at(StepId::Profile);
        assert_eq!(
            advance(session.clone()).unwrap_err(),
            OnboardingError::StepIncomplete { step: StepId::Profile }
        );

        let bad_email = session.clone().update_profile(
            json!({"name": "UG", "institution_type": "university", "email": "not-an-email"})
                .as_object()
                .cloned()
                .unwrap(),
        );
        assert!(!can_advance(&bad_email, StepId::Profile));

        let session = advance(filled_profile(session)).unwrap();
        assert_eq!(session.current_step().id, StepId::Services);
    }

    #[test]
    fn skip_on_services_completes_and_advances() {
        let session = at(StepId::Services);
        let before = session.current_step_index();

        let skipped = skip(session.clone()).unwrap();
        assert!(skipped.step(StepId::Services).unwrap().completed);
        assert_eq!(skipped.current_step_index(), before + 1);

        let advanced = advance(session.replace_services(vec![ServiceRecord::new(
            "Transcript",
            dec!(100),
            5,
        )]))
        .unwrap();
        assert_eq!(advanced.current_step_index(), skipped.current_step_index());
        assert_eq!(advanced.steps(), skipped.steps());
    }

    #[test]
    fn required_steps_without_skip_reject_skip() {
        for step in [StepId::Welcome, StepId::Profile, StepId::Roles, StepId::Review] {
            assert_eq!(
                skip(at(step)).unwrap_err(),
                OnboardingError::NotSkippable { step }
            );
        }
    }

    #[test]
    fn back_keeps_completion() {
        let session = advance(OnboardingSession::new()).unwrap();
        let session = back(session).unwrap();
        assert_eq!(session.current_step().id, StepId::Welcome);
        assert!(session.step(StepId::Welcome).unwrap().completed);

        assert_eq!(
            back(session).unwrap_err(),
            OnboardingError::NoPreviousStep { step: StepId::Welcome }
        );
    }

    #[test]
    fn roles_and_registry_predicates() {
        let session = at(StepId::Roles).replace_roles(vec![RoleRecord::new("Viewer", vec![])]);
        assert!(!can_advance(&session, StepId::Roles));
        let session = session.replace_roles(vec![RoleRecord::new("Registrar", vec!["verify".into()])]);
        let session = advance(session).unwrap();
        assert_eq!(session.current_step().id, StepId::Registry);

        assert!(!can_advance(&session, StepId::Registry));
        let session = session.replace_registries(vec![RegistryRecord::new(
            "Graduates",
            vec![RegistryField {
                name: "index_number".into(),
                kind: FieldKind::Text,
                required: true,
            }],
        )]);
        assert!(can_advance(&session, StepId::Registry));
    }

    #[test]
    fn launch_only_from_ready_review() {
        assert_eq!(
            launch(at(StepId::Roles)).unwrap_err(),
            OnboardingError::NotLaunchable { step: StepId::Roles }
        );
        assert_eq!(
            launch(at(StepId::Review)).unwrap_err(),
            OnboardingError::StepIncomplete { step: StepId::Review }
        );
    }

    #[test]
    fn full_walk_with_skips_launches() {
        let mut session = advance(OnboardingSession::new()).unwrap();
        session = advance(filled_profile(session)).unwrap();
        session = skip(session).unwrap(); // services
        session = skip(session).unwrap(); // templates
        session = skip(session).unwrap(); // signatures
        session = advance(
            session.replace_roles(vec![RoleRecord::new("Registrar", vec!["verify".into()])]),
        )
        .unwrap();
        session = skip(session).unwrap(); // registry
        assert_eq!(session.current_step().id, StepId::Review);

        let session = launch(session).unwrap();
        assert!(session.is_complete());
        assert!(session.steps().iter().all(|s| s.completed));

        assert_eq!(advance(session).unwrap_err(), OnboardingError::AlreadyComplete);
    }
}
