//! Route handlers.

pub mod auth;
pub mod health;
pub mod menu;
pub mod permission;
pub mod role;
pub mod user;
