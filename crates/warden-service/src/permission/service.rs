//! Permission catalog maintenance.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use warden_auth::rbac::{Capability, RbacEnforcer};
use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::repositories::PermissionRepository;
use warden_entity::permission::{CreatePermission, Permission, PermissionNode};

use crate::context::RequestContext;

/// Request to add a permission to the catalog.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePermissionRequest {
    /// Unique permission name.
    pub name: String,
    /// Parent node, or `None` for a new root.
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Reads and maintains the permission tree.
#[derive(Debug, Clone)]
pub struct PermissionService {
    permissions: Arc<PermissionRepository>,
    rbac: Arc<RbacEnforcer>,
    admin_role_name: String,
}

impl PermissionService {
    /// Creates a new permission service.
    pub fn new(
        permissions: Arc<PermissionRepository>,
        rbac: Arc<RbacEnforcer>,
        admin_role_name: impl Into<String>,
    ) -> Self {
        Self {
            permissions,
            rbac,
            admin_role_name: admin_role_name.into(),
        }
    }

    /// Flat list in id order. Open to any authenticated caller.
    pub async fn list(&self, _ctx: &RequestContext) -> AppResult<Vec<Permission>> {
        self.permissions.find_all().await
    }

    /// Nested tree. Open to any authenticated caller.
    pub async fn tree(&self, _ctx: &RequestContext) -> AppResult<Vec<PermissionNode>> {
        Ok(self.permissions.load_tree().await?.nested())
    }

    /// Adds a permission. The administrator role is granted it in the same
    /// transaction.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        req: CreatePermissionRequest,
    ) -> AppResult<Permission> {
        self.rbac.require(&ctx.permissions, Capability::MenuManage)?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("Permission name must not be empty"));
        }
        if let Some(parent_id) = req.parent_id {
            if self.permissions.find_by_id(parent_id).await?.is_none() {
                return Err(AppError::validation(format!(
                    "Parent permission {parent_id} does not exist"
                )));
            }
        }

        let permission = self
            .permissions
            .create(
                &CreatePermission {
                    name: name.to_string(),
                    parent_id: req.parent_id,
                },
                &self.admin_role_name,
            )
            .await?;

        info!(
            actor = ctx.user_id,
            permission_id = permission.id,
            name = %permission.name,
            parent_id = ?permission.parent_id,
            "Permission created"
        );
        Ok(permission)
    }

    /// Deletes a leaf permission.
    pub async fn delete(&self, ctx: &RequestContext, permission_id: i64) -> AppResult<()> {
        self.rbac.require(&ctx.permissions, Capability::MenuManage)?;
        self.permissions.delete(permission_id).await?;
        info!(actor = ctx.user_id, permission_id, "Permission deleted");
        Ok(())
    }
}
