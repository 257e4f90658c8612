//! Application state shared across all handlers.

use std::sync::Arc;

use warden_core::config::AppConfig;
use warden_core::events::EventBus;
use warden_service::{MenuService, PermissionService, RoleService, SessionService, UserService};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// Domain event bus
    pub events: EventBus,

    /// Sign-in, impersonation, and token validation
    pub session_service: Arc<SessionService>,
    /// User administration
    pub user_service: Arc<UserService>,
    /// Role administration
    pub role_service: Arc<RoleService>,
    /// Permission catalog
    pub permission_service: Arc<PermissionService>,
    /// Static menu and per-caller resolution
    pub menu_service: Arc<MenuService>,
}
