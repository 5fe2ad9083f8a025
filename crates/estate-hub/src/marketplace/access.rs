use serde::Serialize;
use tracing::debug;

use super::domain::{Principal, Role};

pub const LOGIN_PATH: &str = "/login";

/// Per-session authentication state. Logout or a restart returns to `Unauthenticated`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum SessionState {
    #[default]
    Unauthenticated,
    Authenticated(Principal),
}

impl SessionState {
    pub fn principal(&self) -> Option<&Principal> {
        match self {
            SessionState::Authenticated(principal) => Some(principal),
            SessionState::Unauthenticated => None,
        }
    }

    pub fn login(self, principal: Principal) -> Self {
        SessionState::Authenticated(principal)
    }

    pub fn logout(self) -> Self {
        SessionState::Unauthenticated
    }
}

impl From<Option<Principal>> for SessionState {
    fn from(value: Option<Principal>) -> Self {
        value.map_or(SessionState::Unauthenticated, SessionState::Authenticated)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    NotAuthenticated,
    WrongRole,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    Allow(&'a Principal),
    Deny(DenialReason),
}

pub fn require_role(principal: Option<&Principal>, role: Role) -> Decision<'_> {
    match principal {
        None => Decision::Deny(DenialReason::NotAuthenticated),
        Some(principal) if principal.role == role => Decision::Allow(principal),
        Some(_) => Decision::Deny(DenialReason::WrongRole),
    }
}

/// Role-restricted actions. Each carries its own denial wording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardedAction {
    BuyerDashboard,
    SellerDashboard,
    PostProperty,
    EditProperty,
    DeleteProperty,
    ShowInterest,
}

impl GuardedAction {
    pub const fn required_role(self) -> Role {
        match self {
            GuardedAction::BuyerDashboard | GuardedAction::ShowInterest => Role::Buyer,
            GuardedAction::SellerDashboard
            | GuardedAction::PostProperty
            | GuardedAction::EditProperty
            | GuardedAction::DeleteProperty => Role::Seller,
        }
    }

    pub const fn denial_message(self) -> &'static str {
        match self {
            GuardedAction::BuyerDashboard => "You must be logged in as a buyer to view this page",
            GuardedAction::SellerDashboard => {
                "You must be logged in as a seller to view this page"
            }
            GuardedAction::PostProperty => "You must be logged in as a seller to post a property",
            GuardedAction::EditProperty => "You must be logged in as a seller to edit a property",
            GuardedAction::DeleteProperty => {
                "You must be logged in as a seller to delete a property"
            }
            GuardedAction::ShowInterest => "You must be logged in as a buyer to show interest",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("{}", .action.denial_message())]
pub struct AccessDenied {
    pub action: GuardedAction,
    pub reason: DenialReason,
}

impl AccessDenied {
    pub const fn redirect(&self) -> &'static str {
        LOGIN_PATH
    }
}

/// Gate `action` on the session's principal holding the action's role.
pub fn authorize(
    session: &SessionState,
    action: GuardedAction,
) -> Result<&Principal, AccessDenied> {
    match require_role(session.principal(), action.required_role()) {
        Decision::Allow(principal) => Ok(principal),
        Decision::Deny(reason) => {
            debug!(?action, ?reason, "access denied");
            Err(AccessDenied { action, reason })
        }
    }
}
