//! The administration console: session, personal hide list, and menu.

use std::sync::Arc;

use tokio::sync::watch;
use tracing::info;

use warden_auth::menu::{LocalHideStore, MenuProjector, MenuVisibilityResolver, system_menu};
use warden_auth::session::{Authenticator, RoleDirectory, SessionManager, SessionSnapshot};
use warden_core::config::ConsoleConfig;
use warden_core::result::AppResult;
use warden_entity::menu::{LocalHideSet, MenuNode};

use crate::api::ApiClient;

/// Console state for one operator.
///
/// The visible menu follows both the session and the hide list: signing in,
/// switching user, refreshing roles, signing out, and toggling a hidden
/// entry all recompute it.
#[derive(Debug)]
pub struct Console {
    session: SessionManager,
    hides: LocalHideStore,
    projector: MenuProjector,
}

impl Console {
    /// Connect to the backend named in `config`. The hide list is read from
    /// the configured file. Starts signed out.
    pub async fn open(config: &ConsoleConfig) -> AppResult<Self> {
        let client = Arc::new(ApiClient::new(config)?);
        let hides = LocalHideStore::open_file(&config.hide_store_path).await?;
        info!(api = %config.api_base_url, "Console opened");
        Ok(Self::with_parts(client.clone(), client, hides))
    }

    /// Assemble a console from its collaborators. Must be called inside a
    /// tokio runtime.
    pub fn with_parts(
        authenticator: Arc<dyn Authenticator>,
        directory: Arc<dyn RoleDirectory>,
        hides: LocalHideStore,
    ) -> Self {
        let session = SessionManager::new(authenticator, directory);
        let projector = MenuProjector::spawn(
            MenuVisibilityResolver::new(system_menu()),
            session.subscribe(),
            hides.subscribe(),
        );
        Self {
            session,
            hides,
            projector,
        }
    }

    /// The session manager.
    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    /// Current session snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.session.snapshot()
    }

    /// Sign in. The menu switches to the new identity's permissions.
    pub async fn login(&self, name: &str, password: &str) -> AppResult<SessionSnapshot> {
        self.session.login(name, password).await
    }

    /// Act as another user. Failure leaves the current session untouched.
    pub async fn impersonate(&self, user_id: i64) -> AppResult<SessionSnapshot> {
        self.session.impersonate(user_id).await
    }

    /// Reload roles for the signed-in user.
    pub async fn refresh(&self) -> AppResult<SessionSnapshot> {
        self.session.refresh().await
    }

    /// Sign out and drop the held token.
    pub fn logout(&self) -> SessionSnapshot {
        self.session.logout()
    }

    /// The menu for the current session and hide list.
    pub fn visible_menu(&self) -> Vec<MenuNode> {
        self.projector.visible()
    }

    /// Receiver of every recomputed menu.
    pub fn menu_updates(&self) -> watch::Receiver<Vec<MenuNode>> {
        self.projector.subscribe()
    }

    /// The unfiltered definition, for the hide-list editor.
    pub fn menu_definition(&self) -> &[MenuNode] {
        self.projector.resolver().definition()
    }

    /// Current hide list.
    pub fn hidden(&self) -> LocalHideSet {
        self.hides.current()
    }

    /// Hide a shown entry or show a hidden one.
    pub async fn toggle_hidden(&self, id: &str) -> AppResult<LocalHideSet> {
        self.hides.toggle(id).await
    }

    /// Show every entry again.
    pub async fn reset_hidden(&self) -> AppResult<LocalHideSet> {
        self.hides.reset_all().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use warden_auth::session::InMemoryDirectory;
    use warden_core::error::ErrorKind;
    use warden_entity::menu::node::find_in;
    use warden_entity::role::Role;

    use super::*;

    async fn http_console(server: &MockServer) -> (Arc<ApiClient>, Console) {
        let api = Arc::new(
            ApiClient::with_base_url(&format!("{}/api", server.uri()), Duration::from_secs(5))
                .unwrap(),
        );
        let hides = LocalHideStore::in_memory().await.unwrap();
        let console = Console::with_parts(api.clone(), api.clone(), hides);
        (api, console)
    }

    async fn mount_login(server: &MockServer, name: &str, id: i64, role_ids: &[i64], delay: Duration) {
        Mock::given(method("POST"))
            .and(path("/api/login"))
            .and(body_partial_json(json!({ "name": name })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({
                        "id": id, "name": name, "roleIds": role_ids, "token": format!("tok-{name}")
                    }))
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }

    async fn console() -> (Arc<InMemoryDirectory>, Console) {
        let dir = Arc::new(InMemoryDirectory::new());
        dir.put_role(Role::new(1, "Ops", ["参数管理", "角色管理"]));
        dir.put_user(1, "ops", "pw", vec![1]);
        let hides = LocalHideStore::in_memory().await.unwrap();
        let console = Console::with_parts(dir.clone(), dir.clone(), hides);
        (dir, console)
    }

    #[tokio::test]
    async fn test_menu_follows_session_and_hides() {
        let (_dir, console) = console().await;
        assert!(console.visible_menu().is_empty());

        console.login("ops", "pw").await.unwrap();
        assert!(find_in(&console.visible_menu(), "param").is_some());
        assert!(find_in(&console.visible_menu(), "role").is_some());

        console.toggle_hidden("role").await.unwrap();
        assert!(find_in(&console.visible_menu(), "role").is_none());
        assert!(console.hidden().contains("role"));

        console.reset_hidden().await.unwrap();
        assert!(find_in(&console.visible_menu(), "role").is_some());

        console.logout();
        assert!(console.visible_menu().is_empty());
        assert!(find_in(console.menu_definition(), "role").is_some());
    }

    #[tokio::test]
    async fn test_refresh_picks_up_role_changes() {
        let (dir, console) = console().await;
        console.login("ops", "pw").await.unwrap();

        dir.put_role(Role::new(1, "Ops", ["参数管理"]));
        console.refresh().await.unwrap();
        assert!(find_in(&console.visible_menu(), "role").is_none());
        assert!(find_in(&console.visible_menu(), "param").is_some());
    }

    #[tokio::test]
    async fn test_superseded_login_never_installs_its_token() {
        let server = MockServer::start().await;
        mount_login(&server, "alice", 1, &[], Duration::from_millis(400)).await;
        mount_login(&server, "bob", 2, &[], Duration::ZERO).await;
        let (api, console) = http_console(&server).await;

        let (alice, bob) = tokio::join!(console.login("alice", "pw"), async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            console.logout();
            console.login("bob", "pw").await
        });

        assert_eq!(alice.unwrap_err().kind, ErrorKind::Session);
        assert!(bob.is_ok());
        assert_eq!(console.snapshot().user_id(), Some(2));
        assert_eq!(api.token().as_deref(), Some("tok-bob"));
    }

    #[tokio::test]
    async fn test_failed_impersonation_keeps_admin_token() {
        let server = MockServer::start().await;
        mount_login(&server, "admin", 1, &[1], Duration::ZERO).await;
        Mock::given(method("GET"))
            .and(path("/api/roles/1"))
            .and(header("authorization", "Bearer tok-admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "id": 1, "name": "管理员", "permissions": ["用户管理", "角色管理"]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/login-as"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "error": "NOT_FOUND", "message": "User 99 not found"
            })))
            .mount(&server)
            .await;
        let (api, console) = http_console(&server).await;
        console.login("admin", "pw").await.unwrap();

        let err = console.impersonate(99).await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);

        let snapshot = console.snapshot();
        assert!(snapshot.is_authenticated());
        assert_eq!(snapshot.user_id(), Some(1));
        assert_eq!(api.token().as_deref(), Some("tok-admin"));
        assert!(find_in(&console.visible_menu(), "role").is_some());
    }
}
