//! Request DTOs with validation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use validator::Validate;

use warden_entity::menu::LocalHideSet;
use warden_service::permission::CreatePermissionRequest;
use warden_service::role::RoleRequest;
use warden_service::user::CreateUserRequest;

/// Login request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LoginRequest {
    /// Login name.
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    /// Password.
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Impersonation request body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LoginAsRequest {
    /// The user to act as.
    #[validate(range(min = 1, message = "userId must be positive"))]
    pub user_id: i64,
}

/// Create user request.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    /// Login name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// Initial password. Length is checked against the configured policy.
    pub password: String,
    /// Initial roles, in order.
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

impl From<CreateUserBody> for CreateUserRequest {
    fn from(body: CreateUserBody) -> Self {
        Self {
            name: body.name,
            password: body.password,
            role_ids: body.role_ids,
        }
    }
}

/// Replace a user's roles.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceRolesBody {
    /// The complete new role list, in order.
    pub role_ids: Vec<i64>,
}

/// Create or replace a role.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleBody {
    /// Role name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// The complete permission set.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl From<RoleBody> for RoleRequest {
    fn from(body: RoleBody) -> Self {
        Self {
            name: body.name,
            permissions: body.permissions,
        }
    }
}

/// Create a permission node.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionBody {
    /// Unique name.
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,
    /// Parent node id.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

impl From<CreatePermissionBody> for CreatePermissionRequest {
    fn from(body: CreatePermissionBody) -> Self {
        Self {
            name: body.name,
            parent_id: body.parent_id,
        }
    }
}

/// Resolve the menu with the caller's personal hide list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct ResolveMenuBody {
    /// Node ids the caller has hidden.
    #[serde(default)]
    pub hidden: Vec<String>,
}

impl ResolveMenuBody {
    /// The submitted ids as a hide set.
    pub fn hide_set(&self) -> LocalHideSet {
        self.hidden.iter().map(String::as_str).collect()
    }
}
