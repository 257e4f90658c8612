//! In-process directory of users and roles.
//!
//! Implements both session collaborators without a backend. Credentials are
//! compared as given; use it for tests and local demos only.

use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::identity::Identity;
use warden_entity::role::Role;

use super::directory::{Authenticator, RoleDirectory, SignIn};

#[derive(Debug, Clone)]
struct MemoryUser {
    identity: Identity,
    credential: String,
}

#[derive(Debug, Default)]
struct DirectoryData {
    users: Vec<MemoryUser>,
    roles: Vec<Role>,
}

/// Users and roles held in memory.
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    data: RwLock<DirectoryData>,
    offline: AtomicBool,
}

impl InMemoryDirectory {
    /// Empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a role.
    pub fn put_role(&self, role: Role) {
        if let Ok(mut data) = self.data.write() {
            data.roles.retain(|r| r.id != role.id);
            data.roles.push(role);
        }
    }

    /// Remove a role. Users keep the dangling id.
    pub fn remove_role(&self, role_id: i64) {
        if let Ok(mut data) = self.data.write() {
            data.roles.retain(|r| r.id != role_id);
        }
    }

    /// Add or replace a user.
    pub fn put_user(&self, id: i64, name: &str, credential: &str, role_ids: Vec<i64>) {
        if let Ok(mut data) = self.data.write() {
            data.users.retain(|u| u.identity.id != id);
            data.users.push(MemoryUser {
                identity: Identity::new(id, name, role_ids),
                credential: credential.to_string(),
            });
        }
    }

    /// Replace a user's role list.
    pub fn set_user_roles(&self, id: i64, role_ids: Vec<i64>) {
        if let Ok(mut data) = self.data.write() {
            if let Some(user) = data.users.iter_mut().find(|u| u.identity.id == id) {
                user.identity.role_ids = role_ids;
            }
        }
    }

    /// Simulate the backend becoming unreachable (or reachable again).
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    fn ensure_online(&self) -> AppResult<()> {
        if self.offline.load(Ordering::SeqCst) {
            Err(AppError::service_unavailable("Directory is offline"))
        } else {
            Ok(())
        }
    }

    fn read(&self) -> AppResult<std::sync::RwLockReadGuard<'_, DirectoryData>> {
        self.data
            .read()
            .map_err(|_| AppError::internal("Directory lock poisoned"))
    }

    fn find_user(&self, id: i64) -> AppResult<Identity> {
        self.read()?
            .users
            .iter()
            .find(|u| u.identity.id == id)
            .map(|u| u.identity.clone())
            .ok_or_else(|| AppError::authentication(format!("User {id} does not exist")))
    }
}

#[async_trait]
impl Authenticator for InMemoryDirectory {
    async fn authenticate(&self, name: &str, credential: &str) -> AppResult<SignIn> {
        self.ensure_online()?;
        self.read()?
            .users
            .iter()
            .find(|u| u.identity.name == name && u.credential == credential)
            .map(|u| SignIn::new(u.identity.clone()))
            .ok_or_else(|| AppError::authentication("Invalid name or password"))
    }

    async fn reload(&self, identity: &Identity) -> AppResult<Identity> {
        self.ensure_online()?;
        self.find_user(identity.id)
    }

    async fn impersonate(&self, user_id: i64) -> AppResult<SignIn> {
        self.ensure_online()?;
        self.find_user(user_id).map(SignIn::new)
    }
}

#[async_trait]
impl RoleDirectory for InMemoryDirectory {
    async fn roles_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Role>> {
        self.ensure_online()?;
        Ok(self
            .read()?
            .roles
            .iter()
            .filter(|r| ids.contains(&r.id))
            .cloned()
            .collect())
    }
}
