//! Console session lifecycle: login, impersonation, refresh, logout.

use std::fmt;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{info, warn};

use warden_core::error::AppError;
use warden_core::result::AppResult;
use warden_entity::identity::Identity;
use warden_entity::role::Role;

use crate::rbac::{AuthorizationEvaluator, Capability, PermissionSet, RbacEnforcer};

use super::directory::{Authenticator, RoleDirectory};
use super::state::{SessionSnapshot, SessionState};

/// Owns the console session and publishes every transition.
///
/// Every identity change (login, impersonation, logout) bumps the snapshot
/// generation. Asynchronous work captures the generation it started under
/// and its result is committed only if the generation is unchanged, so a
/// slow fetch can never write one user's permissions into another user's
/// session. Backend credentials follow the same rule: a sign-in's
/// credential is adopted in the same step that commits its identity.
pub struct SessionManager {
    authenticator: Arc<dyn Authenticator>,
    directory: Arc<dyn RoleDirectory>,
    evaluator: AuthorizationEvaluator,
    enforcer: RbacEnforcer,
    tx: watch::Sender<SessionSnapshot>,
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("snapshot", &*self.tx.borrow())
            .finish()
    }
}

/// Identity with its resolved roles and permissions, ready to commit.
struct Resolved {
    identity: Identity,
    primary_role: Option<Role>,
    permissions: PermissionSet,
    credential: Option<String>,
}

impl SessionManager {
    /// Creates an anonymous session.
    pub fn new(authenticator: Arc<dyn Authenticator>, directory: Arc<dyn RoleDirectory>) -> Self {
        let (tx, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            authenticator,
            directory,
            evaluator: AuthorizationEvaluator::new(),
            enforcer: RbacEnforcer::new(),
            tx,
        }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every transition.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Whether the current identity holds `permission`.
    pub fn has_permission(&self, permission: &str) -> bool {
        self.tx.borrow().has_permission(permission)
    }

    /// Fails with an authorization error unless `capability` is granted.
    pub fn require(&self, capability: Capability) -> AppResult<()> {
        let snapshot = self.tx.borrow();
        if !snapshot.is_authenticated() {
            return Err(AppError::authentication("Not signed in"));
        }
        self.enforcer.require(&snapshot.permissions, capability)
    }

    /// Sign in with a name and credential.
    ///
    /// On mismatch the session returns to `Anonymous` with the reason kept
    /// in `last_error`, and the error is returned.
    pub async fn login(&self, name: &str, credential: &str) -> AppResult<SessionSnapshot> {
        let ticket = self.begin_authenticating();
        let outcome = match self.authenticator.authenticate(name, credential).await {
            Ok(sign_in) => self.resolve(sign_in.identity, sign_in.credential).await,
            Err(e) => Err(e),
        };
        self.finish_authenticating(ticket, outcome, name)
    }

    /// Switch to another user's identity.
    ///
    /// The target is resolved before anything changes. If that fails the
    /// current session, credential included, stays exactly as it was.
    pub async fn impersonate(&self, user_id: i64) -> AppResult<SessionSnapshot> {
        self.require(Capability::UserManage)?;
        let (ticket, admin_id) = {
            let snapshot = self.tx.borrow();
            (snapshot.generation, snapshot.user_id())
        };

        let resolved = match self.authenticator.impersonate(user_id).await {
            Ok(sign_in) => self.resolve(sign_in.identity, sign_in.credential).await,
            Err(e) => Err(e),
        }
        .inspect_err(|e| {
            warn!(?admin_id, target_id = user_id, error = %e, "Impersonation failed; keeping current session");
        })?;

        let committed = self.tx.send_if_modified(|snapshot| {
            if snapshot.generation != ticket || snapshot.state != SessionState::Authenticated {
                return false;
            }
            self.commit(snapshot, resolved);
            snapshot.generation += 1;
            true
        });

        if !committed {
            return Err(stale());
        }
        info!(?admin_id, target_id = user_id, "Impersonation started");
        Ok(self.snapshot())
    }

    /// Re-fetch the current identity's roles and re-evaluate permissions.
    ///
    /// Any failure leaves the previous snapshot in place.
    pub async fn refresh(&self) -> AppResult<SessionSnapshot> {
        let (ticket, identity) = {
            let snapshot = self.tx.borrow();
            match (&snapshot.state, &snapshot.identity) {
                (SessionState::Authenticated, Some(identity)) => {
                    (snapshot.generation, identity.clone())
                }
                _ => return Err(AppError::session("No signed-in session to refresh")),
            }
        };

        let reloaded = self.authenticator.reload(&identity).await.inspect_err(|e| {
            warn!(user_id = identity.id, error = %e, "Session refresh failed; keeping previous state");
        })?;
        let resolved = self.resolve(reloaded, None).await.inspect_err(|e| {
            warn!(user_id = identity.id, error = %e, "Role reload failed; keeping previous state");
        })?;

        let committed = self.tx.send_if_modified(|snapshot| {
            if snapshot.generation != ticket || snapshot.state != SessionState::Authenticated {
                return false;
            }
            self.commit(snapshot, resolved);
            true
        });

        if !committed {
            return Err(stale());
        }
        Ok(self.snapshot())
    }

    /// Tear the session down. Always succeeds.
    pub fn logout(&self) -> SessionSnapshot {
        self.tx.send_modify(|snapshot| {
            self.authenticator.sign_out();
            if let Some(user_id) = snapshot.user_id() {
                info!(user_id, "Signed out");
            }
            *snapshot = SessionSnapshot::anonymous(snapshot.generation + 1);
        });
        self.snapshot()
    }

    /// Load roles and evaluate permissions for `identity`.
    async fn resolve(&self, identity: Identity, credential: Option<String>) -> AppResult<Resolved> {
        let roles = self
            .directory
            .roles_with_credential(&identity.role_ids, credential.as_deref())
            .await?;
        let permissions = self.evaluator.evaluate(&identity.role_ids, &roles);
        let primary_role = identity
            .role_ids
            .iter()
            .find_map(|id| roles.iter().find(|r| r.id == *id))
            .cloned();

        Ok(Resolved {
            identity,
            primary_role,
            permissions,
            credential,
        })
    }

    /// Write `resolved` into the snapshot and adopt its credential.
    ///
    /// Runs inside the watch closure, after the ticket check, so a stale
    /// result can never install its credential.
    fn commit(&self, snapshot: &mut SessionSnapshot, resolved: Resolved) {
        if let Some(credential) = resolved.credential {
            self.authenticator.adopt(credential);
        }
        snapshot.state = SessionState::Authenticated;
        snapshot.identity = Some(resolved.identity);
        snapshot.primary_role = resolved.primary_role;
        snapshot.permissions = resolved.permissions;
        snapshot.last_error = None;
    }

    fn begin_authenticating(&self) -> u64 {
        let mut ticket = 0;
        self.tx.send_modify(|snapshot| {
            self.authenticator.sign_out();
            ticket = snapshot.generation + 1;
            *snapshot = SessionSnapshot::anonymous(ticket);
            snapshot.state = SessionState::Authenticating;
        });
        ticket
    }

    fn finish_authenticating(
        &self,
        ticket: u64,
        outcome: AppResult<Resolved>,
        subject: &str,
    ) -> AppResult<SessionSnapshot> {
        match outcome {
            Ok(resolved) => {
                let user_id = resolved.identity.id;
                let committed = self.tx.send_if_modified(|snapshot| {
                    if !is_pending(snapshot, ticket) {
                        return false;
                    }
                    self.commit(snapshot, resolved);
                    true
                });
                if !committed {
                    return Err(stale());
                }
                info!(user_id, subject, "Signed in");
                Ok(self.snapshot())
            }
            Err(e) => {
                warn!(subject, error = %e, "Sign-in failed");
                let reason = e.clone();
                self.tx.send_if_modified(|snapshot| {
                    if !is_pending(snapshot, ticket) {
                        return false;
                    }
                    *snapshot = SessionSnapshot::anonymous(ticket);
                    snapshot.last_error = Some(reason);
                    true
                });
                Err(e)
            }
        }
    }
}

fn is_pending(snapshot: &SessionSnapshot, ticket: u64) -> bool {
    snapshot.generation == ticket && snapshot.state == SessionState::Authenticating
}

fn stale() -> AppError {
    AppError::session("Session changed while the request was in flight; result discarded")
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;
    use tokio::sync::Notify;

    use warden_core::error::ErrorKind;

    use super::*;
    use crate::session::SignIn;
    use crate::session::memory::InMemoryDirectory;

    fn directory() -> Arc<InMemoryDirectory> {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.put_role(Role::new(1, "Editor", ["添加用户"]));
        dir.put_role(Role::new(2, "Viewer", ["查询用户"]));
        dir.put_role(Role::new(3, "管理员", ["用户管理", "角色管理"]));
        dir.put_user(10, "alice", "secret", vec![1, 2]);
        dir.put_user(11, "bob", "hunter2", vec![]);
        dir.put_user(12, "admin", "password", vec![3]);
        dir
    }

    fn manager(dir: &Arc<InMemoryDirectory>) -> SessionManager {
        SessionManager::new(dir.clone(), dir.clone())
    }

    /// Delegates to a directory but parks `authenticate` and `reload`
    /// until released. Each sign-in carries a `tok-<user>` credential and the
    /// adopted one is recorded.
    struct GatedAuthenticator {
        inner: Arc<InMemoryDirectory>,
        gate: Notify,
        gate_login: bool,
        adopted: std::sync::Mutex<Option<String>>,
    }

    impl GatedAuthenticator {
        fn new(inner: Arc<InMemoryDirectory>, gate_login: bool) -> Self {
            Self {
                inner,
                gate: Notify::new(),
                gate_login,
                adopted: std::sync::Mutex::new(None),
            }
        }

        fn adopted(&self) -> Option<String> {
            self.adopted.lock().unwrap().clone()
        }
    }

    fn with_token(sign_in: SignIn) -> SignIn {
        let token = format!("tok-{}", sign_in.identity.name);
        SignIn::with_credential(sign_in.identity, token)
    }

    #[async_trait]
    impl Authenticator for GatedAuthenticator {
        async fn authenticate(&self, name: &str, credential: &str) -> AppResult<SignIn> {
            if self.gate_login {
                self.gate.notified().await;
            }
            self.inner.authenticate(name, credential).await.map(with_token)
        }

        async fn reload(&self, identity: &Identity) -> AppResult<Identity> {
            if !self.gate_login {
                self.gate.notified().await;
            }
            self.inner.reload(identity).await
        }

        async fn impersonate(&self, user_id: i64) -> AppResult<SignIn> {
            self.inner.impersonate(user_id).await.map(with_token)
        }

        fn adopt(&self, credential: String) {
            *self.adopted.lock().unwrap() = Some(credential);
        }

        fn sign_out(&self) {
            *self.adopted.lock().unwrap() = None;
        }
    }

    #[tokio::test]
    async fn test_login_unions_all_roles() {
        let dir = directory();
        let session = manager(&dir);

        let snapshot = session.login("alice", "secret").await.unwrap();
        assert_eq!(snapshot.state, SessionState::Authenticated);
        assert!(session.has_permission("添加用户"));
        assert!(session.has_permission("查询用户"));
        assert!(!session.has_permission("删除用户"));
        assert_eq!(snapshot.primary_role.map(|r| r.name), Some("Editor".to_string()));
    }

    #[tokio::test]
    async fn test_user_without_roles_has_nothing() {
        let dir = directory();
        let session = manager(&dir);

        let snapshot = session.login("bob", "hunter2").await.unwrap();
        assert!(snapshot.is_authenticated());
        assert!(snapshot.permissions.is_empty());
        assert!(snapshot.primary_role.is_none());
        assert!(!session.has_permission("查询用户"));
    }

    #[tokio::test]
    async fn test_bad_credential_returns_to_anonymous() {
        let dir = directory();
        let session = manager(&dir);

        let err = session.login("alice", "wrong").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Anonymous);
        assert!(snapshot.identity.is_none());
        assert!(snapshot.last_error.is_some_and(|e| e.is_authentication()));
    }

    #[tokio::test]
    async fn test_offline_backend_is_connectivity_failure() {
        let dir = directory();
        let session = manager(&dir);
        dir.set_offline(true);

        let err = session.login("alice", "secret").await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(!err.is_authentication());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_changes() {
        let dir = directory();
        let session = manager(&dir);
        session.login("bob", "hunter2").await.unwrap();
        assert!(!session.has_permission("查询用户"));

        dir.set_user_roles(11, vec![2]);
        let snapshot = session.refresh().await.unwrap();
        assert!(snapshot.has_permission("查询用户"));
    }

    #[tokio::test]
    async fn test_deleted_role_drops_out_on_refresh() {
        let dir = directory();
        let session = manager(&dir);
        session.login("alice", "secret").await.unwrap();

        dir.remove_role(1);
        let snapshot = session.refresh().await.unwrap();
        assert!(snapshot.is_authenticated());
        assert!(snapshot.has_permission("查询用户"));
        assert!(!snapshot.has_permission("添加用户"));
        assert_eq!(snapshot.primary_role.map(|r| r.name), Some("Viewer".to_string()));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_previous_state() {
        let dir = directory();
        let session = manager(&dir);
        let before = session.login("alice", "secret").await.unwrap();

        dir.set_offline(true);
        let err = session.refresh().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::ServiceUnavailable);

        let after = session.snapshot();
        assert!(after.is_authenticated());
        assert_eq!(after.generation, before.generation);
        assert_eq!(after.permissions, before.permissions);
    }

    #[tokio::test]
    async fn test_refresh_requires_session() {
        let dir = directory();
        let err = manager(&dir).refresh().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Session);
    }

    #[tokio::test]
    async fn test_logout_always_clears() {
        let dir = directory();
        let session = manager(&dir);
        session.login("alice", "secret").await.unwrap();

        let snapshot = session.logout();
        assert_eq!(snapshot.state, SessionState::Anonymous);
        assert!(snapshot.permissions.is_empty());
        assert!(!session.has_permission("添加用户"));

        // Logging out twice is fine.
        let again = session.logout();
        assert!(again.generation > snapshot.generation);
    }

    #[tokio::test]
    async fn test_stale_login_is_discarded_after_logout() {
        let dir = directory();
        let gated = Arc::new(GatedAuthenticator::new(dir.clone(), true));
        let session = SessionManager::new(gated.clone(), dir.clone());

        let (login, _) = tokio::join!(session.login("alice", "secret"), async {
            session.logout();
            gated.gate.notify_one();
        });

        assert_eq!(login.unwrap_err().kind, ErrorKind::Session);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.state, SessionState::Anonymous);
        assert!(snapshot.permissions.is_empty());
        assert_eq!(gated.adopted(), None);
    }

    #[tokio::test]
    async fn test_credential_adopted_with_committed_sign_in() {
        let dir = directory();
        let gated = Arc::new(GatedAuthenticator::new(dir.clone(), false));
        let session = SessionManager::new(gated.clone(), dir.clone());

        session.login("admin", "password").await.unwrap();
        assert_eq!(gated.adopted().as_deref(), Some("tok-admin"));

        session.impersonate(10).await.unwrap();
        assert_eq!(gated.adopted().as_deref(), Some("tok-alice"));

        session.logout();
        assert_eq!(gated.adopted(), None);
    }

    #[tokio::test]
    async fn test_stale_refresh_never_reaches_new_identity() {
        let dir = directory();
        let gated = Arc::new(GatedAuthenticator::new(dir.clone(), false));
        let session = SessionManager::new(gated.clone(), dir.clone());
        session.login("admin", "password").await.unwrap();

        let (refresh, _) = tokio::join!(session.refresh(), async {
            session.logout();
            session.login("bob", "hunter2").await.unwrap();
            gated.gate.notify_one();
        });

        assert_eq!(refresh.unwrap_err().kind, ErrorKind::Session);
        let snapshot = session.snapshot();
        assert_eq!(snapshot.user_id(), Some(11));
        assert!(!snapshot.has_permission("用户管理"));
        assert_eq!(gated.adopted().as_deref(), Some("tok-bob"));
    }

    #[tokio::test]
    async fn test_impersonation_requires_user_manage() {
        let dir = directory();
        let session = manager(&dir);

        session.login("alice", "secret").await.unwrap();
        let err = session.impersonate(11).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);
        assert_eq!(session.snapshot().user_id(), Some(10));

        session.login("admin", "password").await.unwrap();
        let snapshot = session.impersonate(10).await.unwrap();
        assert_eq!(snapshot.user_id(), Some(10));
        assert!(snapshot.has_permission("添加用户"));
        assert!(!snapshot.has_permission("用户管理"));
    }

    #[tokio::test]
    async fn test_unknown_impersonation_target_keeps_admin_session() {
        let dir = directory();
        let session = manager(&dir);
        let before = session.login("admin", "password").await.unwrap();

        let err = session.impersonate(999).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let after = session.snapshot();
        assert!(after.is_authenticated());
        assert_eq!(after.user_id(), Some(12));
        assert_eq!(after.generation, before.generation);
        assert!(after.has_permission("用户管理"));
        assert!(after.last_error.is_none());
    }

    #[tokio::test]
    async fn test_offline_impersonation_keeps_admin_session() {
        let dir = directory();
        let session = manager(&dir);
        let before = session.login("admin", "password").await.unwrap();

        dir.set_offline(true);
        let err = session.impersonate(10).await.unwrap_err();
        assert!(err.is_connectivity());
        assert!(session.snapshot().is_authenticated());
        assert_eq!(session.snapshot().user_id(), Some(12));
        assert!(session.has_permission("用户管理"));

        // Once the backend is back the switch goes through.
        dir.set_offline(false);
        let switched = session.impersonate(10).await.unwrap();
        assert_eq!(switched.user_id(), Some(10));
        assert!(switched.generation > before.generation);
    }

    #[tokio::test]
    async fn test_subscribers_observe_transitions() {
        let dir = directory();
        let session = manager(&dir);
        let mut rx = session.subscribe();

        session.login("alice", "secret").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_authenticated());

        session.logout();
        rx.changed().await.unwrap();
        assert!(!rx.borrow_and_update().is_authenticated());
    }
}
