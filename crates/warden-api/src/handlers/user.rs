//! User administration handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use warden_entity::user::User;

use crate::dto::request::{CreateUserBody, ReplaceRolesBody};
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/users
pub async fn list_users(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<User>>, ApiError> {
    Ok(Json(state.user_service.list_users(&auth).await?))
}

/// GET /api/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<Json<User>, ApiError> {
    Ok(Json(state.user_service.get_user(&auth, id).await?))
}

/// POST /api/users
pub async fn create_user(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreateUserBody>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.user_service.create_user(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// PUT /api/users/{id}/roles
pub async fn replace_roles(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
    ValidatedJson(req): ValidatedJson<ReplaceRolesBody>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .user_service
        .replace_roles(&auth, id, req.role_ids)
        .await?;
    Ok(Json(user))
}

/// DELETE /api/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.user_service.delete_user(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
