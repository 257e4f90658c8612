//! Console flows: session, hide list, and menu projection together.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use warden_auth::LocalHideStore;
use warden_auth::SessionState;
use warden_client::{ApiClient, Console};
use warden_entity::menu::node::find_in;

use crate::helpers::{ALICE_ID, directory};

#[tokio::test]
async fn test_full_session_cycle() {
    let dir = directory();
    let hides = LocalHideStore::in_memory().await.unwrap();
    let console = Console::with_parts(dir.clone(), dir.clone(), hides);

    let snapshot = console.login("alice", "secret").await.unwrap();
    assert_eq!(snapshot.state, SessionState::Authenticated);
    assert_eq!(snapshot.primary_role.as_ref().map(|r| r.name.as_str()), Some("Viewer"));
    assert!(snapshot.has_permission("业务审核"));
    assert!(find_in(&console.visible_menu(), "real-name").is_some());
    assert!(find_in(&console.visible_menu(), "system").is_none());

    // Switching user replaces the permission set entirely.
    console.logout();
    console.login("admin", "password").await.unwrap();
    let switched = console.impersonate(ALICE_ID).await.unwrap();
    assert_eq!(switched.user_id(), Some(ALICE_ID));
    assert!(!switched.has_permission("用户管理"));
    assert!(find_in(&console.visible_menu(), "user").is_none());

    let signed_out = console.logout();
    assert_eq!(signed_out.state, SessionState::Anonymous);
    assert!(console.visible_menu().is_empty());
}

#[tokio::test]
async fn test_hide_list_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let file = tmp.path().join("hidden_menus.json");
    let dir = directory();

    {
        let hides = LocalHideStore::open_file(&file).await.unwrap();
        let console = Console::with_parts(dir.clone(), dir.clone(), hides);
        console.login("admin", "password").await.unwrap();
        console.toggle_hidden("param").await.unwrap();
        assert!(find_in(&console.visible_menu(), "param").is_none());
    }

    let hides = LocalHideStore::open_file(&file).await.unwrap();
    let console = Console::with_parts(dir.clone(), dir, hides);
    console.login("admin", "password").await.unwrap();
    assert!(console.hidden().contains("param"));
    assert!(find_in(&console.visible_menu(), "param").is_none());
    assert!(find_in(&console.visible_menu(), "role").is_some());
}

#[tokio::test]
async fn test_menu_subscribers_follow_login() {
    let dir = directory();
    let hides = LocalHideStore::in_memory().await.unwrap();
    let console = Console::with_parts(dir.clone(), dir, hides);
    let mut menus = console.menu_updates();

    console.login("admin", "password").await.unwrap();
    loop {
        tokio::time::timeout(Duration::from_secs(5), menus.changed())
            .await
            .unwrap()
            .unwrap();
        if find_in(&menus.borrow_and_update(), "user").is_some() {
            break;
        }
    }
}

#[tokio::test]
async fn test_console_over_http_keeps_state_when_backend_fails() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 5, "name": "ops", "roleIds": [9], "token": "tok-5"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/roles/9"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 9, "name": "Ops", "permissions": ["参数管理"]
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/session"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = Arc::new(
        ApiClient::with_base_url(&format!("{}/api", server.uri()), Duration::from_secs(5)).unwrap(),
    );
    let hides = LocalHideStore::in_memory().await.unwrap();
    let console = Console::with_parts(client.clone(), client, hides);

    let signed_in = console.login("ops", "pw").await.unwrap();
    assert!(signed_in.has_permission("参数管理"));
    assert!(find_in(&console.visible_menu(), "param").is_some());

    let err = console.refresh().await.unwrap_err();
    assert!(err.is_connectivity());

    let after = console.snapshot();
    assert_eq!(after.state, SessionState::Authenticated);
    assert_eq!(after.permissions, signed_in.permissions);
    assert!(find_in(&console.visible_menu(), "param").is_some());
}
