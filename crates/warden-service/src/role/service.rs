//! Role administration with administrator-role protection.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use warden_auth::rbac::{Capability, RbacEnforcer};
use warden_core::error::AppError;
use warden_core::events::{DomainEvent, EventBus, EventPayload, RoleEvent};
use warden_core::result::AppResult;
use warden_database::repositories::{PermissionRepository, RoleRepository};
use warden_entity::permission::PermissionTree;
use warden_entity::role::{Role, RoleDraft};

use crate::context::RequestContext;

/// Body for creating or replacing a role.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleRequest {
    /// Role name.
    pub name: String,
    /// The complete permission set the role should hold.
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

/// A stored role plus submitted names that matched no permission.
#[derive(Debug, Clone, Serialize)]
pub struct RoleResult {
    /// The role as stored.
    #[serde(flatten)]
    pub role: Role,
    /// Submitted permission names that were not linked.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub unresolved: Vec<String>,
}

/// Handles role administration.
///
/// The administrator role cannot be deleted or renamed, and every update to
/// it stores the full permission catalog whatever was submitted.
#[derive(Debug, Clone)]
pub struct RoleService {
    roles: Arc<RoleRepository>,
    permissions: Arc<PermissionRepository>,
    rbac: Arc<RbacEnforcer>,
    events: EventBus,
    admin_role_name: String,
}

impl RoleService {
    /// Creates a new role service.
    pub fn new(
        roles: Arc<RoleRepository>,
        permissions: Arc<PermissionRepository>,
        rbac: Arc<RbacEnforcer>,
        events: EventBus,
        admin_role_name: impl Into<String>,
    ) -> Self {
        Self {
            roles,
            permissions,
            rbac,
            events,
            admin_role_name: admin_role_name.into(),
        }
    }

    /// Lists every role with its permissions.
    pub async fn list_roles(&self, ctx: &RequestContext) -> AppResult<Vec<Role>> {
        self.rbac.require(&ctx.permissions, Capability::RoleRead)?;
        self.roles.find_all().await
    }

    /// Gets a single role. Callers may always read roles assigned to them.
    pub async fn get_role(&self, ctx: &RequestContext, role_id: i64) -> AppResult<Role> {
        if !ctx.role_ids.contains(&role_id) {
            self.rbac.require(&ctx.permissions, Capability::RoleRead)?;
        }
        self.find(role_id).await
    }

    /// Creates a role.
    pub async fn create_role(&self, ctx: &RequestContext, req: RoleRequest) -> AppResult<RoleResult> {
        self.rbac.require(&ctx.permissions, Capability::RoleCreate)?;

        let draft = RoleDraft {
            name: validate_name(&req.name)?,
            permission_names: req.permissions,
        };
        let write = self.roles.create(&draft).await?;

        info!(
            actor = ctx.user_id,
            role_id = write.role.id,
            name = %write.role.name,
            permissions = write.role.permission_names.len(),
            "Role created"
        );
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::Role(RoleEvent::Created {
                role_id: write.role.id,
                name: write.role.name.clone(),
            }),
        ));

        Ok(RoleResult {
            role: write.role,
            unresolved: write.unresolved,
        })
    }

    /// Replaces a role's name and entire permission set.
    pub async fn update_role(
        &self,
        ctx: &RequestContext,
        role_id: i64,
        req: RoleRequest,
    ) -> AppResult<RoleResult> {
        self.rbac.require(&ctx.permissions, Capability::RoleManage)?;

        let existing = self.find(role_id).await?;
        let catalog = self.permissions.load_tree().await?;
        let draft = prepare_update(&existing, &self.admin_role_name, req, &catalog)?;

        let write = self.roles.update(role_id, &draft).await?;

        info!(
            actor = ctx.user_id,
            role_id,
            name = %write.role.name,
            permissions = write.role.permission_names.len(),
            "Role permissions replaced"
        );
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::Role(RoleEvent::PermissionsReplaced {
                role_id,
                name: write.role.name.clone(),
                permission_count: write.role.permission_names.len(),
            }),
        ));

        Ok(RoleResult {
            role: write.role,
            unresolved: write.unresolved,
        })
    }

    /// Deletes a role. The administrator role is refused.
    pub async fn delete_role(&self, ctx: &RequestContext, role_id: i64) -> AppResult<()> {
        self.rbac.require(&ctx.permissions, Capability::RoleManage)?;

        let existing = self.find(role_id).await?;
        ensure_deletable(&existing, &self.admin_role_name)?;

        self.roles.delete(role_id).await?;

        info!(actor = ctx.user_id, role_id, name = %existing.name, "Role deleted");
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::Role(RoleEvent::Deleted {
                role_id,
                name: existing.name,
            }),
        ));
        Ok(())
    }

    async fn find(&self, role_id: i64) -> AppResult<Role> {
        self.roles
            .find_by_id(role_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Role {role_id} not found")))
    }
}

fn validate_name(name: &str) -> AppResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Role name must not be empty"));
    }
    Ok(name.to_string())
}

fn ensure_deletable(role: &Role, admin_role_name: &str) -> AppResult<()> {
    if role.name == admin_role_name {
        return Err(AppError::conflict(format!(
            "The administrator role '{admin_role_name}' cannot be deleted"
        )));
    }
    Ok(())
}

/// Turns an update request into the draft to store.
///
/// For the administrator role the name must stay as is and the permission
/// set is always the full catalog.
fn prepare_update(
    existing: &Role,
    admin_role_name: &str,
    req: RoleRequest,
    catalog: &PermissionTree,
) -> AppResult<RoleDraft> {
    let name = validate_name(&req.name)?;

    if existing.name == admin_role_name {
        if name != admin_role_name {
            return Err(AppError::conflict(format!(
                "The administrator role '{admin_role_name}' cannot be renamed"
            )));
        }
        let full: BTreeSet<String> = catalog.names().map(str::to_string).collect();
        if req.permissions != full {
            warn!(
                role_id = existing.id,
                submitted = req.permissions.len(),
                catalog = full.len(),
                "Administrator role update ignores the submitted set and keeps the full catalog"
            );
        }
        return Ok(RoleDraft {
            name,
            permission_names: full,
        });
    }

    Ok(RoleDraft {
        name,
        permission_names: req.permissions,
    })
}

#[cfg(test)]
mod tests {
    use warden_core::error::ErrorKind;
    use warden_entity::permission::Permission;

    use super::*;

    const ADMIN: &str = "管理员";

    fn catalog() -> PermissionTree {
        PermissionTree::from_flat(vec![
            Permission::new(1, "用户管理", None),
            Permission::new(2, "角色管理", None),
            Permission::new(3, "查询用户", Some(1)),
        ])
        .unwrap()
    }

    fn request(name: &str, permissions: &[&str]) -> RoleRequest {
        RoleRequest {
            name: name.to_string(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    #[test]
    fn test_admin_update_stores_full_catalog() {
        let admin = Role::new(1, ADMIN, ["用户管理"]);
        let draft = prepare_update(&admin, ADMIN, request(ADMIN, &[]), &catalog()).unwrap();
        assert_eq!(draft.permission_names.len(), 3);
        assert!(draft.permission_names.contains("查询用户"));
    }

    #[test]
    fn test_admin_cannot_be_renamed() {
        let admin = Role::new(1, ADMIN, ["用户管理"]);
        let err = prepare_update(&admin, ADMIN, request("Root", &[]), &catalog()).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Conflict);
    }

    #[test]
    fn test_regular_update_replaces_set() {
        let viewer = Role::new(2, "Viewer", ["查询用户"]);
        let draft =
            prepare_update(&viewer, ADMIN, request(" Auditor ", &["角色管理"]), &catalog()).unwrap();
        assert_eq!(draft.name, "Auditor");
        assert_eq!(draft.permission_names.len(), 1);
        assert!(draft.permission_names.contains("角色管理"));
    }

    #[test]
    fn test_admin_cannot_be_deleted() {
        let admin = Role::new(1, ADMIN, Vec::<String>::new());
        assert_eq!(ensure_deletable(&admin, ADMIN).unwrap_err().kind, ErrorKind::Conflict);
        assert!(ensure_deletable(&Role::new(2, "Viewer", ["查询用户"]), ADMIN).is_ok());
    }

    #[test]
    fn test_blank_name_rejected() {
        assert_eq!(validate_name("  ").unwrap_err().kind, ErrorKind::Validation);
    }
}
