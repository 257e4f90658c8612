//! # warden-api
//!
//! HTTP API layer for Warden built on Axum.
//!
//! Provides the `/api` endpoints, the bearer-token extractor, request
//! logging and CORS middleware, DTOs, and the mapping from `AppError` to
//! HTTP status codes.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, build_state};
pub use state::AppState;
