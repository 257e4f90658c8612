//! User administration: list, create, replace roles, delete.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use warden_auth::password::{PasswordHasher, PasswordPolicy};
use warden_auth::rbac::{Capability, RbacEnforcer};
use warden_core::error::AppError;
use warden_core::events::{DomainEvent, EventBus, EventPayload, UserEvent};
use warden_core::result::AppResult;
use warden_database::repositories::UserRepository;
use warden_entity::user::{CreateUser, User};

use crate::context::RequestContext;

/// Request to create a new user.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    /// Login name (unique).
    pub name: String,
    /// Initial password.
    pub password: String,
    /// Initial role assignment, in order.
    #[serde(default)]
    pub role_ids: Vec<i64>,
}

/// Handles user administration.
#[derive(Debug, Clone)]
pub struct UserService {
    users: Arc<UserRepository>,
    hasher: Arc<PasswordHasher>,
    policy: Arc<PasswordPolicy>,
    rbac: Arc<RbacEnforcer>,
    events: EventBus,
}

impl UserService {
    /// Creates a new user service.
    pub fn new(
        users: Arc<UserRepository>,
        hasher: Arc<PasswordHasher>,
        policy: Arc<PasswordPolicy>,
        rbac: Arc<RbacEnforcer>,
        events: EventBus,
    ) -> Self {
        Self {
            users,
            hasher,
            policy,
            rbac,
            events,
        }
    }

    /// Lists every user, newest first.
    pub async fn list_users(&self, ctx: &RequestContext) -> AppResult<Vec<User>> {
        self.rbac.require(&ctx.permissions, Capability::UserRead)?;
        self.users.find_all().await
    }

    /// Gets a single user.
    pub async fn get_user(&self, ctx: &RequestContext, user_id: i64) -> AppResult<User> {
        self.rbac.require(&ctx.permissions, Capability::UserRead)?;
        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    /// Creates a user with a hashed password and its initial roles.
    pub async fn create_user(&self, ctx: &RequestContext, req: CreateUserRequest) -> AppResult<User> {
        self.rbac.require(&ctx.permissions, Capability::UserCreate)?;

        let name = req.name.trim();
        if name.is_empty() {
            return Err(AppError::validation("User name must not be empty"));
        }
        self.policy.validate(&req.password)?;

        let role_ids = dedup_preserving_order(&req.role_ids);
        let password_hash = self.hasher.hash_password(&req.password)?;

        let user = self
            .users
            .create(&CreateUser {
                name: name.to_string(),
                password_hash,
                role_ids: role_ids.clone(),
            })
            .await?;

        info!(
            actor = ctx.user_id,
            user_id = user.id,
            name = %user.name,
            role_ids = ?role_ids,
            "User created"
        );
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::User(UserEvent::Created {
                user_id: user.id,
                name: user.name.clone(),
                role_ids,
            }),
        ));

        Ok(user)
    }

    /// Replaces a user's entire role list.
    pub async fn replace_roles(
        &self,
        ctx: &RequestContext,
        user_id: i64,
        role_ids: Vec<i64>,
    ) -> AppResult<User> {
        self.rbac.require(&ctx.permissions, Capability::UserUpdate)?;

        let role_ids = dedup_preserving_order(&role_ids);
        self.users.replace_roles(user_id, &role_ids).await?;

        info!(actor = ctx.user_id, user_id, role_ids = ?role_ids, "User roles replaced");
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::User(UserEvent::RolesReplaced { user_id, role_ids }),
        ));

        self.users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id} not found")))
    }

    /// Deletes a user. Callers cannot delete themselves.
    pub async fn delete_user(&self, ctx: &RequestContext, user_id: i64) -> AppResult<()> {
        self.rbac.require(&ctx.permissions, Capability::UserDelete)?;
        ensure_not_self(ctx, user_id)?;

        self.users.delete(user_id).await?;

        info!(actor = ctx.user_id, user_id, "User deleted");
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::User(UserEvent::Deleted { user_id }),
        ));
        Ok(())
    }
}

fn ensure_not_self(ctx: &RequestContext, user_id: i64) -> AppResult<()> {
    if ctx.user_id == user_id {
        return Err(AppError::conflict("You cannot delete your own account"));
    }
    Ok(())
}

/// Drops repeated ids, keeping the first occurrence.
fn dedup_preserving_order(ids: &[i64]) -> Vec<i64> {
    let mut out = Vec::with_capacity(ids.len());
    for id in ids {
        if !out.contains(id) {
            out.push(*id);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use warden_auth::rbac::PermissionSet;
    use warden_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_dedup_keeps_first_position() {
        assert_eq!(dedup_preserving_order(&[3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert!(dedup_preserving_order(&[]).is_empty());
    }

    #[test]
    fn test_cannot_delete_self() {
        let ctx = RequestContext::new(5, "admin", vec![1], PermissionSet::empty());
        assert_eq!(ensure_not_self(&ctx, 5).unwrap_err().kind, ErrorKind::Conflict);
        assert!(ensure_not_self(&ctx, 6).is_ok());
    }
}
