//! Sign-in, impersonation, and the caller's own session.

use axum::Json;
use axum::extract::State;

use warden_service::session::LoginResponse;

use crate::dto::request::{LoginAsRequest, LoginRequest};
use crate::dto::response::SessionResponse;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// POST /api/login
pub async fn login(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = state.session_service.login(&req.name, &req.password).await?;
    Ok(Json(response))
}

/// POST /api/login-as
pub async fn login_as(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<LoginAsRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let response = state.session_service.login_as(&auth, req.user_id).await?;
    Ok(Json(response))
}

/// GET /api/session
pub async fn session(auth: AuthUser) -> Json<SessionResponse> {
    Json(SessionResponse::from(auth.context()))
}
