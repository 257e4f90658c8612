//! Server-side sign-in, impersonation, and per-request authorization.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use warden_auth::jwt::TokenCodec;
use warden_auth::rbac::{AuthorizationEvaluator, Capability, RbacEnforcer};
use warden_auth::session::{Authenticator, RoleDirectory};
use warden_core::error::AppError;
use warden_core::events::{DomainEvent, EventBus, EventPayload, SessionEvent};
use warden_core::result::AppResult;
use warden_entity::identity::Identity;

use crate::context::RequestContext;

/// Returned by a successful sign-in or impersonation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    /// User id.
    pub id: i64,
    /// Login name.
    pub name: String,
    /// Assigned role ids, in order.
    pub role_ids: Vec<i64>,
    /// Bearer token for subsequent requests.
    pub token: String,
    /// When the token expires.
    pub expires_at: DateTime<Utc>,
}

/// Issues bearer tokens and turns them back into request contexts.
pub struct SessionService {
    authenticator: Arc<dyn Authenticator>,
    directory: Arc<dyn RoleDirectory>,
    evaluator: AuthorizationEvaluator,
    codec: Arc<TokenCodec>,
    rbac: Arc<RbacEnforcer>,
    events: EventBus,
}

impl fmt::Debug for SessionService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionService")
            .field("evaluator", &self.evaluator)
            .finish_non_exhaustive()
    }
}

impl SessionService {
    /// Creates a new session service.
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        directory: Arc<dyn RoleDirectory>,
        codec: Arc<TokenCodec>,
        rbac: Arc<RbacEnforcer>,
        events: EventBus,
    ) -> Self {
        Self {
            authenticator,
            directory,
            evaluator: AuthorizationEvaluator::new(),
            codec,
            rbac,
            events,
        }
    }

    /// Verify credentials and issue a token.
    pub async fn login(&self, name: &str, password: &str) -> AppResult<LoginResponse> {
        let identity = match self.authenticator.authenticate(name, password).await {
            Ok(sign_in) => sign_in.identity,
            Err(e) => {
                if e.is_authentication() {
                    warn!(name, "Sign-in rejected");
                    self.events.publish(DomainEvent::new(
                        None,
                        EventPayload::Session(SessionEvent::Rejected {
                            name: name.to_string(),
                        }),
                    ));
                }
                return Err(e);
            }
        };

        let issued = self.codec.issue(identity.id, &identity.name)?;

        info!(user_id = identity.id, name = %identity.name, "Signed in");
        self.events.publish(DomainEvent::new(
            Some(identity.id),
            EventPayload::Session(SessionEvent::Opened {
                user_id: identity.id,
                name: identity.name.clone(),
            }),
        ));

        Ok(LoginResponse {
            id: identity.id,
            name: identity.name,
            role_ids: identity.role_ids,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Issue a token for another user without their credential.
    pub async fn login_as(&self, ctx: &RequestContext, user_id: i64) -> AppResult<LoginResponse> {
        self.rbac.require(&ctx.permissions, Capability::UserManage)?;

        let identity = self
            .authenticator
            .impersonate(user_id)
            .await
            .map_err(|e| {
                if e.is_authentication() {
                    AppError::not_found(format!("User {user_id} not found"))
                } else {
                    e
                }
            })?
            .identity;

        let issued = self
            .codec
            .issue_impersonated(identity.id, &identity.name, ctx.user_id)?;

        warn!(
            admin_id = ctx.user_id,
            target_id = identity.id,
            "Impersonation session issued"
        );
        self.events.publish(DomainEvent::new(
            Some(ctx.user_id),
            EventPayload::Session(SessionEvent::Impersonated {
                admin_id: ctx.user_id,
                target_id: identity.id,
            }),
        ));

        Ok(LoginResponse {
            id: identity.id,
            name: identity.name,
            role_ids: identity.role_ids,
            token: issued.token,
            expires_at: issued.expires_at,
        })
    }

    /// Validate a bearer token and evaluate the caller's current permissions.
    ///
    /// Roles are reloaded on every call, so role changes take effect on the
    /// next request. A token for a deleted user is rejected.
    pub async fn authorize(&self, token: &str) -> AppResult<RequestContext> {
        let claims = self.codec.decode(token)?;
        let user_id = claims.user_id()?;

        let identity = self
            .authenticator
            .reload(&Identity::new(user_id, claims.name.clone(), Vec::new()))
            .await?;
        let roles = self.directory.roles_by_ids(&identity.role_ids).await?;
        let permissions = self.evaluator.evaluate(&identity.role_ids, &roles);

        Ok(
            RequestContext::new(identity.id, identity.name, identity.role_ids, permissions)
                .impersonated_by(claims.imp),
        )
    }
}

#[cfg(test)]
mod tests {
    use warden_auth::session::InMemoryDirectory;
    use warden_core::config::AuthConfig;
    use warden_core::error::ErrorKind;
    use warden_entity::role::Role;

    use super::*;

    fn setup() -> (Arc<InMemoryDirectory>, SessionService, EventBus) {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.put_role(Role::new(1, "管理员", ["用户管理", "角色管理"]));
        dir.put_role(Role::new(2, "Viewer", ["查询用户"]));
        dir.put_user(1, "admin", "password", vec![1]);
        dir.put_user(2, "alice", "secret", vec![2]);

        let events = EventBus::new(16);
        let service = SessionService::new(
            dir.clone(),
            dir.clone(),
            Arc::new(TokenCodec::new(&AuthConfig::default())),
            Arc::new(RbacEnforcer::new()),
            events.clone(),
        );
        (dir, service, events)
    }

    #[tokio::test]
    async fn test_login_then_authorize() {
        let (_dir, service, _events) = setup();
        let login = service.login("alice", "secret").await.unwrap();
        assert_eq!(login.role_ids, vec![2]);

        let ctx = service.authorize(&login.token).await.unwrap();
        assert_eq!(ctx.user_id, 2);
        assert!(ctx.has_permission("查询用户"));
        assert!(!ctx.has_permission("用户管理"));
    }

    #[tokio::test]
    async fn test_bad_password_publishes_rejection() {
        let (_dir, service, events) = setup();
        let mut rx = events.subscribe();

        let err = service.login("alice", "nope").await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authentication);

        let event = rx.recv().await.unwrap();
        assert!(matches!(
            event.payload,
            EventPayload::Session(SessionEvent::Rejected { .. })
        ));
    }

    #[tokio::test]
    async fn test_role_change_visible_on_next_request() {
        let (dir, service, _events) = setup();
        let login = service.login("alice", "secret").await.unwrap();

        dir.set_user_roles(2, vec![1, 2]);
        let ctx = service.authorize(&login.token).await.unwrap();
        assert!(ctx.has_permission("用户管理"));
        assert!(ctx.has_permission("查询用户"));
    }

    #[tokio::test]
    async fn test_impersonation_gated_and_recorded() {
        let (_dir, service, _events) = setup();

        let alice = service.login("alice", "secret").await.unwrap();
        let alice_ctx = service.authorize(&alice.token).await.unwrap();
        let err = service.login_as(&alice_ctx, 1).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Authorization);

        let admin = service.login("admin", "password").await.unwrap();
        let admin_ctx = service.authorize(&admin.token).await.unwrap();
        let as_alice = service.login_as(&admin_ctx, 2).await.unwrap();

        let ctx = service.authorize(&as_alice.token).await.unwrap();
        assert_eq!(ctx.user_id, 2);
        assert_eq!(ctx.impersonated_by, Some(1));
        assert!(!ctx.has_permission("用户管理"));

        let missing = service.login_as(&admin_ctx, 99).await.unwrap_err();
        assert_eq!(missing.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_not_an_auth_failure() {
        let (dir, service, _events) = setup();
        dir.set_offline(true);
        let err = service.login("alice", "secret").await.unwrap_err();
        assert!(err.is_connectivity());
    }
}
