//! # warden-entity
//!
//! Domain entity models for the Warden RBAC console. Persisted rows derive
//! `sqlx::FromRow`; the static navigation tree and the personal hide set are
//! plain value objects that never touch the database.

pub mod identity;
pub mod menu;
pub mod permission;
pub mod role;
pub mod user;

pub use identity::Identity;
pub use menu::{LocalHideSet, MenuNode};
pub use permission::{Permission, PermissionNode, PermissionTree};
pub use role::Role;
pub use user::User;
