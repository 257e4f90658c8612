//! Route table.

use axum::Router;
use axum::routing::{get, post, put};

use crate::handlers::{auth, health, menu, permission, role, user};
use crate::state::AppState;

/// Builds the router with every route. Everything except `/` and
/// `/api/login` requires a bearer token.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/login", post(auth::login))
        .route("/login-as", post(auth::login_as))
        .route("/session", get(auth::session))
        .route("/users", get(user::list_users).post(user::create_user))
        .route("/users/{id}", get(user::get_user).delete(user::delete_user))
        .route("/users/{id}/roles", put(user::replace_roles))
        .route("/roles", get(role::list_roles).post(role::create_role))
        .route(
            "/roles/{id}",
            get(role::get_role)
                .put(role::update_role)
                .delete(role::delete_role),
        )
        .route(
            "/permissions",
            get(permission::list_permissions).post(permission::create_permission),
        )
        .route("/permissions/tree", get(permission::permission_tree))
        .route(
            "/permissions/{id}",
            axum::routing::delete(permission::delete_permission),
        )
        .route("/menu", get(menu::menu_definition))
        .route("/menu/resolve", post(menu::resolve_menu));

    Router::new()
        .route("/", get(health::root))
        .nest("/api", api)
        .with_state(state)
}
