use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::Role;

/// Front-end screens whose access depends on session and onboarding state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Login,
    Directory,
    CreatorProfile,
    SponsorProfile,
    Dashboard,
    Onboarding,
    CreatorSettings,
    SponsorSettings,
}

impl Screen {
    fn requires_session(self) -> bool {
        matches!(
            self,
            Screen::Dashboard | Screen::Onboarding | Screen::CreatorSettings | Screen::SponsorSettings
        )
    }
}

/// What the caller knows about the visitor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Visitor {
    pub has_session: bool,
    pub connected: bool,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NavigationDecision {
    pub screen: Screen,
    /// Path to send the visitor to instead, if the screen is not available
    pub redirect: Option<String>,
    /// Signed in but the social profile has not been synced yet
    pub needs_sync: bool,
}

pub fn resolve(screen: Screen, visitor: Visitor) -> NavigationDecision {
    let redirect = if screen.requires_session() && !visitor.has_session {
        Some("/login")
    } else {
        match screen {
            Screen::Dashboard if visitor.role.is_none() => Some("/onboarding"),
            Screen::Onboarding if visitor.role.is_some() => Some("/dashboard"),
            Screen::Login if visitor.has_session => Some("/dashboard"),
            _ => None,
        }
    };

    NavigationDecision {
        screen,
        redirect: redirect.map(str::to_string),
        needs_sync: visitor.has_session && !visitor.connected,
    }
}

/// Where to go right after choosing a role.
pub fn post_onboarding_path(role: Role) -> &'static str {
    match role {
        Role::Creator | Role::Both => "/dashboard/settings?setup=true",
        Role::Sponsor => "/sponsor/settings?setup=true",
    }
}
