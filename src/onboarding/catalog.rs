//! Step catalog — the fixed, ordered list of onboarding steps.

use serde::{Deserialize, Serialize};

/// Stable identifier of an onboarding step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepId {
    Welcome,
    Profile,
    Services,
    Templates,
    Signatures,
    Roles,
    Registry,
    Review,
}

impl StepId {
    /// All step ids in catalog order.
    pub const ALL: [StepId; 8] = [
        StepId::Welcome,
        StepId::Profile,
        StepId::Services,
        StepId::Templates,
        StepId::Signatures,
        StepId::Roles,
        StepId::Registry,
        StepId::Review,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Profile => "profile",
            Self::Services => "services",
            Self::Templates => "templates",
            Self::Signatures => "signatures",
            Self::Roles => "roles",
            Self::Registry => "registry",
            Self::Review => "review",
        }
    }

    /// Look up a step id by its string key.
    pub fn parse(s: &str) -> Option<StepId> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of the onboarding workflow.
///
/// Only `completed` changes during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepDescriptor {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub completed: bool,
    pub required: bool,
    pub order: u32,
}

struct CatalogEntry {
    id: StepId,
    title: &'static str,
    description: &'static str,
    required: bool,
}

static CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        id: StepId::Welcome,
        title: "Welcome",
        description: "Introduction to the institution setup",
        required: true,
    },
    CatalogEntry {
        id: StepId::Profile,
        title: "Institution Profile",
        description: "Identity, contact details and branding",
        required: true,
    },
    CatalogEntry {
        id: StepId::Services,
        title: "Services Setup",
        description: "Verification services offered and their fees",
        required: true,
    },
    CatalogEntry {
        id: StepId::Templates,
        title: "Document Templates",
        description: "Templates used for issued documents",
        required: false,
    },
    CatalogEntry {
        id: StepId::Signatures,
        title: "Signature Settings",
        description: "Who signs issued documents and how",
        required: false,
    },
    CatalogEntry {
        id: StepId::Roles,
        title: "User Roles",
        description: "Staff roles and their permissions",
        required: true,
    },
    CatalogEntry {
        id: StepId::Registry,
        title: "Registry Schema",
        description: "Fields stored for each data registry",
        required: true,
    },
    CatalogEntry {
        id: StepId::Review,
        title: "Review & Launch",
        description: "Confirm the configuration and go live",
        required: true,
    },
];

/// Build the step list for a fresh session: every step incomplete.
pub fn initial_steps() -> Vec<StepDescriptor> {
    CATALOG
        .iter()
        .enumerate()
        .map(|(i, entry)| StepDescriptor {
            id: entry.id,
            title: entry.title.to_string(),
            description: entry.description.to_string(),
            completed: false,
            required: entry.required,
            order: i as u32 + 1,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_has_eight_steps_in_order() {
        let steps = initial_steps();
        let ids: Vec<StepId> = steps.iter().map(|s| s.id).collect();
        assert_eq!(ids, StepId::ALL.to_vec());
        for (i, step) in steps.iter().enumerate() {
            assert_eq!(step.order, i as u32 + 1);
            assert!(!step.completed);
        }
    }

    #[test]
    fn optional_steps_are_templates_and_signatures() {
        let optional: Vec<StepId> = initial_steps()
            .into_iter()
            .filter(|s| !s.required)
            .map(|s| s.id)
            .collect();
        assert_eq!(optional, vec![StepId::Templates, StepId::Signatures]);
    }

    #[test]
    fn display_matches_serde() {
        for id in StepId::ALL {
            let json = serde_json::to_string(&id).unwrap();
            assert_eq!(format!("\"{id}\""), json, "Display and serde should match for {id:?}");
        }
    }

    #[test]
    fn parse_roundtrips_and_rejects_unknown() {
        for id in StepId::ALL {
            assert_eq!(StepId::parse(id.as_str()), Some(id));
        }
        assert_eq!(StepId::parse("payments"), None);
    }
}
