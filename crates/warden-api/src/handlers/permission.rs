//! Permission catalog handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use warden_entity::permission::{Permission, PermissionNode};

use crate::dto::request::CreatePermissionBody;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/permissions
pub async fn list_permissions(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<Permission>>, ApiError> {
    Ok(Json(state.permission_service.list(&auth).await?))
}

/// GET /api/permissions/tree
pub async fn permission_tree(
    State(state): State<AppState>,
    auth: AuthUser,
) -> Result<Json<Vec<PermissionNode>>, ApiError> {
    Ok(Json(state.permission_service.tree(&auth).await?))
}

/// POST /api/permissions
pub async fn create_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<CreatePermissionBody>,
) -> Result<(StatusCode, Json<Permission>), ApiError> {
    let permission = state.permission_service.create(&auth, req.into()).await?;
    Ok((StatusCode::CREATED, Json(permission)))
}

/// DELETE /api/permissions/{id}
pub async fn delete_permission(
    State(state): State<AppState>,
    auth: AuthUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.permission_service.delete(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
