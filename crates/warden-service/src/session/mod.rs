//! Sign-in and per-request authorization.

pub mod service;

pub use service::{LoginResponse, SessionService};
