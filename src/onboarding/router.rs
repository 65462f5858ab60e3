//! Session router — picks the shell a user lands in.

use serde::{Deserialize, Serialize};

/// Roles known to the portal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    BaccheckerAdmin,
    SystemAdmin,
    TertiaryInstitution,
    InstitutionUser,
    InstitutionAdmin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BaccheckerAdmin => "bacchecker_admin",
            Self::SystemAdmin => "system_admin",
            Self::TertiaryInstitution => "tertiary_institution",
            Self::InstitutionUser => "institution_user",
            Self::InstitutionAdmin => "institution_admin",
        }
    }

    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "bacchecker_admin" => Some(Self::BaccheckerAdmin),
            "system_admin" => Some(Self::SystemAdmin),
            "tertiary_institution" => Some(Self::TertiaryInstitution),
            "institution_user" => Some(Self::InstitutionUser),
            "institution_admin" => Some(Self::InstitutionAdmin),
            _ => None,
        }
    }

    /// Whether users with this role ever go through onboarding.
    pub fn requires_onboarding(&self) -> bool {
        matches!(self, Self::InstitutionAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The authenticated user as seen by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthUser {
    /// Raw role string; unknown roles are routed to login.
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub institution_id: Option<String>,
}

/// Authentication state consumed by the router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthContext {
    pub is_authenticated: bool,
    pub user: Option<AuthUser>,
}

impl AuthContext {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn signed_in(role: impl Into<String>, institution_id: Option<String>) -> Self {
        Self {
            is_authenticated: true,
            user: Some(AuthUser {
                role: role.into(),
                institution_id,
            }),
        }
    }

    pub fn institution_id(&self) -> Option<&str> {
        self.user.as_ref()?.institution_id.as_deref()
    }
}

/// Why the login surface is shown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum LoginReason {
    Unauthenticated,
    UnrecognizedRole { role: String },
}

/// Where the user lands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "route", rename_all = "snake_case")]
pub enum Route {
    Login(LoginReason),
    AdminShell,
    UserShell,
    Onboarding,
    InstitutionShell,
}

/// Decide the route from authentication and completion state.
pub fn route(auth: &AuthContext, persisted_complete: bool, session_complete: bool) -> Route {
    let user = match (&auth.user, auth.is_authenticated) {
        (Some(user), true) => user,
        _ => return Route::Login(LoginReason::Unauthenticated),
    };

    match Role::parse(&user.role) {
        Some(Role::BaccheckerAdmin | Role::SystemAdmin) => Route::AdminShell,
        Some(Role::TertiaryInstitution | Role::InstitutionUser) => Route::UserShell,
        Some(Role::InstitutionAdmin) => {
            if persisted_complete || session_complete {
                Route::InstitutionShell
            } else {
                Route::Onboarding
            }
        }
        None => {
            tracing::warn!(role = %user.role, "Unrecognized role, redirecting to login");
            Route::Login(LoginReason::UnrecognizedRole {
                role: user.role.clone(),
            })
        }
    }
}
