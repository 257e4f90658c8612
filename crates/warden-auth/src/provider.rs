//! Database-backed session collaborators.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_database::repositories::{RoleRepository, UserRepository};
use warden_entity::identity::Identity;
use warden_entity::role::Role;

use crate::password::PasswordHasher;
use crate::session::{Authenticator, RoleDirectory, SignIn};

/// Checks credentials against the `users` table.
#[derive(Debug, Clone)]
pub struct DatabaseAuthenticator {
    users: Arc<UserRepository>,
    hasher: Arc<PasswordHasher>,
}

impl DatabaseAuthenticator {
    /// Creates a new authenticator.
    pub fn new(users: Arc<UserRepository>, hasher: Arc<PasswordHasher>) -> Self {
        Self { users, hasher }
    }

    async fn identity_for(&self, user_id: i64) -> AppResult<Identity> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::authentication(format!("User {user_id} does not exist")))?;
        Ok(Identity::new(user.id, user.name, user.role_ids))
    }
}

#[async_trait]
impl Authenticator for DatabaseAuthenticator {
    async fn authenticate(&self, name: &str, credential: &str) -> AppResult<SignIn> {
        let Some(stored) = self.users.find_credentials_by_name(name).await? else {
            debug!(name, "Unknown login name");
            return Err(AppError::authentication("Invalid name or password"));
        };

        if !self.hasher.verify_password(credential, &stored.password_hash)? {
            debug!(name, "Password mismatch");
            return Err(AppError::authentication("Invalid name or password"));
        }

        let role_ids = self.users.role_ids_for_user(stored.id).await?;
        Ok(SignIn::new(Identity::new(stored.id, stored.name, role_ids)))
    }

    async fn reload(&self, identity: &Identity) -> AppResult<Identity> {
        self.identity_for(identity.id).await
    }

    async fn impersonate(&self, user_id: i64) -> AppResult<SignIn> {
        self.identity_for(user_id).await.map(SignIn::new)
    }
}

/// Loads roles through the role repository.
#[derive(Debug, Clone)]
pub struct RepositoryRoleDirectory {
    roles: Arc<RoleRepository>,
}

impl RepositoryRoleDirectory {
    /// Creates a new directory.
    pub fn new(roles: Arc<RoleRepository>) -> Self {
        Self { roles }
    }
}

#[async_trait]
impl RoleDirectory for RepositoryRoleDirectory {
    async fn roles_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Role>> {
        self.roles.find_by_ids(ids).await
    }
}
