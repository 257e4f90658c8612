//! HTTP surface: sign-in, impersonation, per-request permissions, menu.

use axum::http::StatusCode;
use serde_json::json;

use crate::helpers::{
    ADMIN_ID, ALICE_ID, BOB_ID, directory, get, login, post, root_ids, send, test_router,
};

#[tokio::test]
async fn test_union_of_roles_drives_menu() {
    let app = test_router(directory());
    let token = login(&app, "alice", "secret").await;

    let (status, session) = send(&app, get("/api/session", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(session["roleIds"], json!([2, 3]));
    assert_eq!(session["permissions"], json!(["业务审核", "查询用户", "查询角色"]));

    let (status, menu) = send(&app, post("/api/menu/resolve", Some(&token), json!({}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(root_ids(&menu), vec!["dashboard", "audit", "demo"]);
    assert_eq!(menu[1]["children"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_user_without_roles_sees_ungated_entries_only() {
    let app = test_router(directory());
    let token = login(&app, "bob", "secret").await;

    let (_, session) = send(&app, get("/api/session", &token)).await;
    assert_eq!(session["permissions"], json!([]));

    let (_, menu) = send(&app, post("/api/menu/resolve", Some(&token), json!({}))).await;
    assert_eq!(root_ids(&menu), vec!["dashboard", "demo"]);

    let (_, menu) = send(
        &app,
        post("/api/menu/resolve", Some(&token), json!({"hidden": ["demo", "dashboard"]})),
    )
    .await;
    assert!(menu.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_role_change_applies_to_next_request() {
    let dir = directory();
    let app = test_router(dir.clone());
    let token = login(&app, "bob", "secret").await;

    let (status, _) = send(&app, post("/api/login-as", Some(&token), json!({"userId": ALICE_ID}))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    dir.set_user_roles(BOB_ID, vec![1]);
    let (status, body) = send(&app, post("/api/login-as", Some(&token), json!({"userId": ALICE_ID}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["id"], ALICE_ID);
}

#[tokio::test]
async fn test_impersonation_carries_target_permissions() {
    let app = test_router(directory());
    let admin = login(&app, "admin", "password").await;

    let (status, body) = send(
        &app,
        post("/api/login-as", Some(&admin), json!({"userId": ALICE_ID})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "alice");
    assert_eq!(body["roleIds"], json!([2, 3]));
    let as_alice = body["token"].as_str().unwrap().to_string();

    let (_, session) = send(&app, get("/api/session", &as_alice)).await;
    assert_eq!(session["id"], ALICE_ID);
    assert_eq!(session["impersonatedBy"], ADMIN_ID);
    assert_eq!(session["permissions"], json!(["业务审核", "查询用户", "查询角色"]));

    // Alice's own permissions apply, and she lacks 用户管理.
    let (status, _) = send(
        &app,
        post("/api/login-as", Some(&as_alice), json!({"userId": ADMIN_ID})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        post("/api/login-as", Some(&admin), json!({"userId": 404})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "NOT_FOUND");
}

#[tokio::test]
async fn test_offline_backend_is_503_not_401() {
    let dir = directory();
    let app = test_router(dir.clone());
    let token = login(&app, "alice", "secret").await;

    dir.set_offline(true);
    let (status, body) = send(&app, get("/api/session", &token)).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["error"], "SERVICE_UNAVAILABLE");

    let (status, _) = send(
        &app,
        post("/api/login", None, json!({"name": "alice", "password": "secret"})),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}
