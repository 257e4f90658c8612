//! Application builder: wires repositories, services, router, and middleware.

use std::sync::Arc;

use axum::Router;
use axum::middleware::from_fn;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use warden_auth::menu::{MenuVisibilityResolver, system_menu};
use warden_auth::password::{PasswordHasher, PasswordPolicy};
use warden_auth::provider::{DatabaseAuthenticator, RepositoryRoleDirectory};
use warden_auth::{RbacEnforcer, TokenCodec};
use warden_core::config::AppConfig;
use warden_core::events::EventBus;
use warden_database::repositories::{PermissionRepository, RoleRepository, UserRepository};
use warden_service::{MenuService, PermissionService, RoleService, SessionService, UserService};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config.server.cors);
    build_router(state)
        .layer(from_fn(request_logging))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

/// Wires every repository and service over `pool`.
pub fn build_state(config: AppConfig, pool: PgPool, events: EventBus) -> AppState {
    let user_repo = Arc::new(UserRepository::new(pool.clone()));
    let role_repo = Arc::new(RoleRepository::new(pool.clone()));
    let permission_repo = Arc::new(PermissionRepository::new(pool));

    let hasher = Arc::new(PasswordHasher::new());
    let policy = Arc::new(PasswordPolicy::new(&config.auth));
    let codec = Arc::new(TokenCodec::new(&config.auth));
    let rbac = Arc::new(RbacEnforcer::new());

    let session_service = Arc::new(SessionService::new(
        Arc::new(DatabaseAuthenticator::new(
            Arc::clone(&user_repo),
            Arc::clone(&hasher),
        )),
        Arc::new(RepositoryRoleDirectory::new(Arc::clone(&role_repo))),
        codec,
        Arc::clone(&rbac),
        events.clone(),
    ));
    let user_service = Arc::new(UserService::new(
        user_repo,
        hasher,
        policy,
        Arc::clone(&rbac),
        events.clone(),
    ));
    let role_service = Arc::new(RoleService::new(
        role_repo,
        Arc::clone(&permission_repo),
        Arc::clone(&rbac),
        events.clone(),
        config.auth.admin_role_name.clone(),
    ));
    let permission_service = Arc::new(PermissionService::new(
        permission_repo,
        rbac,
        config.auth.admin_role_name.clone(),
    ));
    let menu_service = Arc::new(MenuService::new(Arc::new(MenuVisibilityResolver::new(
        system_menu(),
    ))));

    AppState {
        config: Arc::new(config),
        events,
        session_service,
        user_service,
        role_service,
        permission_service,
        menu_service,
    }
}
