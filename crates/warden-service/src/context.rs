//! Request context carrying the caller's identity and evaluated permissions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use warden_auth::rbac::PermissionSet;

/// Context for the current authenticated request.
///
/// Built fresh for every request from the bearer token plus the caller's
/// current role assignment, then passed into every service method.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestContext {
    /// The caller's user id.
    pub user_id: i64,
    /// The caller's login name.
    pub name: String,
    /// The caller's assigned role ids, in assignment order.
    pub role_ids: Vec<i64>,
    /// Union of the permissions of every assigned role.
    pub permissions: PermissionSet,
    /// Administrator who opened this session by impersonation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<i64>,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context.
    pub fn new(user_id: i64, name: impl Into<String>, role_ids: Vec<i64>, permissions: PermissionSet) -> Self {
        Self {
            user_id,
            name: name.into(),
            role_ids,
            permissions,
            impersonated_by: None,
            request_time: Utc::now(),
        }
    }

    /// Marks the context as opened by `admin_id` through impersonation.
    pub fn impersonated_by(mut self, admin_id: Option<i64>) -> Self {
        self.impersonated_by = admin_id;
        self
    }

    /// Whether the caller holds `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.has(permission)
    }
}
