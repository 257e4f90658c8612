//! Response DTOs.

use serde::{Deserialize, Serialize};

use warden_service::RequestContext;

/// The caller's identity and effective permissions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    /// User id.
    pub id: i64,
    /// Login name.
    pub name: String,
    /// Assigned role ids.
    pub role_ids: Vec<i64>,
    /// Union of the permissions of every assigned role.
    pub permissions: Vec<String>,
    /// Administrator who opened this session by impersonation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impersonated_by: Option<i64>,
}

impl From<&RequestContext> for SessionResponse {
    fn from(ctx: &RequestContext) -> Self {
        Self {
            id: ctx.user_id,
            name: ctx.name.clone(),
            role_ids: ctx.role_ids.clone(),
            permissions: ctx.permissions.to_vec(),
            impersonated_by: ctx.impersonated_by,
        }
    }
}
