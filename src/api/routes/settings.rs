//! Settings routes. All need `MANAGE_SETTINGS`.

use axum::{
    Json,
    extract::{Path, State},
};
use sea_orm::prelude::Json as JsonValue;

use crate::{
    api::{
        extract::AuthAdmin,
        response::{Ack, ApiResult, ack, ok},
        state::AppState,
    },
    core::{admin::PermissionSet, settings},
    entities::SettingModel,
};

/// GET /api/admin/settings
pub async fn list(State(state): State<AppState>, admin: AuthAdmin) -> ApiResult<Vec<SettingModel>> {
    admin.require(PermissionSet::MANAGE_SETTINGS)?;
    ok(settings::list_settings(state.db()).await?)
}

/// GET /api/admin/settings/{name}
pub async fn get(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(name): Path<String>,
) -> ApiResult<SettingModel> {
    admin.require(PermissionSet::MANAGE_SETTINGS)?;
    ok(settings::get_setting(state.db(), &name).await?)
}

/// PUT /api/admin/settings/{name}
///
/// The request body is stored verbatim as the value.
pub async fn set(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(name): Path<String>,
    Json(value): Json<JsonValue>,
) -> ApiResult<SettingModel> {
    admin.require(PermissionSet::MANAGE_SETTINGS)?;
    ok(settings::set_setting(state.db(), &name, value).await?)
}

/// DELETE /api/admin/settings/{name}
pub async fn delete(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(name): Path<String>,
) -> ApiResult<Ack> {
    admin.require(PermissionSet::MANAGE_SETTINGS)?;
    settings::delete_setting(state.db(), &name).await?;
    ack("Setting deleted")
}
