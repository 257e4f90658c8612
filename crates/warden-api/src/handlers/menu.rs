//! Menu handlers.

use axum::Json;
use axum::extract::State;

use warden_entity::menu::MenuNode;

use crate::dto::request::ResolveMenuBody;
use crate::error::ApiError;
use crate::extractors::{AuthUser, ValidatedJson};
use crate::state::AppState;

/// GET /api/menu
pub async fn menu_definition(State(state): State<AppState>, _auth: AuthUser) -> Json<Vec<MenuNode>> {
    Json(state.menu_service.definition().to_vec())
}

/// POST /api/menu/resolve
pub async fn resolve_menu(
    State(state): State<AppState>,
    auth: AuthUser,
    ValidatedJson(req): ValidatedJson<ResolveMenuBody>,
) -> Result<Json<Vec<MenuNode>>, ApiError> {
    Ok(Json(state.menu_service.resolve(&auth, &req.hide_set())))
}
