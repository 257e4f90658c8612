//! Collaborators the session depends on.

use std::fmt;

use async_trait::async_trait;

use warden_core::result::AppResult;
use warden_entity::identity::Identity;
use warden_entity::role::Role;

/// A successful credential exchange.
///
/// `credential` is bearer material issued by the backend. It is staged only:
/// nothing uses it for later calls until the session commits the sign-in and
/// hands it to [`Authenticator::adopt`].
#[derive(Clone, PartialEq, Eq)]
pub struct SignIn {
    /// Who signed in, with their ordered role ids.
    pub identity: Identity,
    /// Credential issued for this sign-in, if the backend issues one.
    pub credential: Option<String>,
}

impl SignIn {
    /// A sign-in that carries no credential material.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            credential: None,
        }
    }

    /// A sign-in that carries a backend-issued credential.
    pub fn with_credential(identity: Identity, credential: impl Into<String>) -> Self {
        Self {
            identity,
            credential: Some(credential.into()),
        }
    }
}

impl fmt::Debug for SignIn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignIn")
            .field("identity", &self.identity)
            .field("credential", &self.credential.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Checks credentials and reloads identities.
///
/// A credential mismatch or unknown identity is an `Authentication` error;
/// an unreachable backend is a connectivity error (`ServiceUnavailable`).
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Verify `name` and `credential`, returning the identity and its roles.
    async fn authenticate(&self, name: &str, credential: &str) -> AppResult<SignIn>;

    /// Fetch the current role assignment for an already signed-in identity.
    async fn reload(&self, identity: &Identity) -> AppResult<Identity>;

    /// Switch to another user's identity without their credential.
    async fn impersonate(&self, user_id: i64) -> AppResult<SignIn>;

    /// Use `credential` for every later call. Only called for a sign-in that
    /// was committed to the current session.
    fn adopt(&self, _credential: String) {}

    /// Drop any credential material held for the current identity.
    fn sign_out(&self) {}
}

/// Looks up roles by id.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Roles for the given ids. Ids with no role are left out of the result.
    async fn roles_by_ids(&self, ids: &[i64]) -> AppResult<Vec<Role>>;

    /// Like [`roles_by_ids`](Self::roles_by_ids), but on behalf of a sign-in
    /// whose credential has not been adopted yet.
    async fn roles_with_credential(
        &self,
        ids: &[i64],
        _credential: Option<&str>,
    ) -> AppResult<Vec<Role>> {
        self.roles_by_ids(ids).await
    }
}
