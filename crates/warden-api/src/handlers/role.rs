//! Role administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use warden_entity::role::Role;
use warden_service::role::RoleResult;

use crate::dto::request::RoleBody;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/roles
pub async fn list_roles(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Role>>, ApiError> {
    Ok(Json(state.role_service.list_roles(&auth).await?))
}

/// GET /api/roles/{id}
pub async fn get_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<Role>, ApiError> {
    Ok(Json(state.role_service.get_role(&auth, id).await?))
}

/// POST /api/roles
pub async fn create_role(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<RoleBody>,
) -> Result<(StatusCode, Json<RoleResult>), ApiError> {
    let role = state.role_service.create_role(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// PUT /api/roles/{id}
pub async fn update_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<RoleBody>,
) -> Result<Json<RoleResult>, ApiError> {
    Ok(Json(state.role_service.update_role(&auth, id, req.into()).await?))
}

/// DELETE /api/roles/{id}
pub async fn delete_role(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.role_service.delete_role(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
