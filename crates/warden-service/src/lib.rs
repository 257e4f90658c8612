//! # warden-service
//!
//! Administrative use cases for the Warden RBAC console. Every operation
//! receives the caller's [`RequestContext`] and checks the required
//! capability before touching storage.
//!
//! Services follow constructor injection; all dependencies are provided at
//! construction time via `Arc` references.

pub mod context;
pub mod menu;
pub mod permission;
pub mod role;
pub mod session;
pub mod user;

pub use context::RequestContext;
pub use menu::MenuService;
pub use permission::PermissionService;
pub use role::RoleService;
pub use session::SessionService;
pub use user::UserService;
