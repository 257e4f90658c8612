//! Role administration.

pub mod service;

pub use service::{RoleRequest, RoleResult, RoleService};
