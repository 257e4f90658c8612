//! Console session states and the snapshot published to observers.

use serde::Serialize;

use warden_core::error::AppError;
use warden_entity::identity::Identity;
use warden_entity::role::Role;

use crate::rbac::PermissionSet;

/// Where the console session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No identity; nothing is granted.
    Anonymous,
    /// A login or impersonation is in flight.
    Authenticating,
    /// Identity set and permissions evaluated.
    Authenticated,
}

/// Immutable view of the session at one point in time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    /// Lifecycle state.
    pub state: SessionState,
    /// Increments whenever the identity changes or is torn down.
    pub generation: u64,
    /// The signed-in identity.
    pub identity: Option<Identity>,
    /// First assigned role that resolved. Display only; never used for checks.
    pub primary_role: Option<Role>,
    /// Union of the permissions of every held role.
    pub permissions: PermissionSet,
    /// Reason the last login attempt failed.
    #[serde(skip)]
    pub last_error: Option<AppError>,
}

impl SessionSnapshot {
    /// The anonymous snapshot for `generation`.
    pub fn anonymous(generation: u64) -> Self {
        Self {
            state: SessionState::Anonymous,
            generation,
            identity: None,
            primary_role: None,
            permissions: PermissionSet::empty(),
            last_error: None,
        }
    }

    /// Whether an identity is signed in.
    pub fn is_authenticated(&self) -> bool {
        self.state == SessionState::Authenticated
    }

    /// Whether the signed-in identity holds `permission`. Always false
    /// unless authenticated.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.is_authenticated() && self.permissions.has(permission)
    }

    /// Id of the signed-in user.
    pub fn user_id(&self) -> Option<i64> {
        self.identity.as_ref().map(|i| i.id)
    }
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self::anonymous(0)
    }
}
