//! Permission catalog maintenance.

pub mod service;

pub use service::{CreatePermissionRequest, PermissionService};
