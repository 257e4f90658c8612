//! # warden-core
//!
//! Core crate for the Warden RBAC console. Contains configuration schemas,
//! domain events with their broadcast bus, and the unified error system.
//!
//! This crate has **no** internal dependencies on other Warden crates.

pub mod config;
pub mod error;
pub mod events;
pub mod result;

pub use error::AppError;
pub use result::AppResult;
