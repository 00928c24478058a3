//! Customer address book routes.

use axum::{
    Json,
    extract::{Path, State},
};

use crate::{
    api::{
        extract::AuthUser,
        response::{Ack, ApiResult, ack, ok},
        state::AppState,
    },
    core::address::{self, AddressInput},
    entities::AddressModel,
};

/// GET /api/user/addresses
pub async fn list(State(state): State<AppState>, AuthUser(me): AuthUser) -> ApiResult<Vec<AddressModel>> {
    ok(address::list_addresses(state.db(), me.id).await?)
}

/// POST /api/user/addresses
pub async fn create(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<AddressInput>,
) -> ApiResult<AddressModel> {
    ok(address::create_address(state.db(), me.id, body).await?)
}

/// PUT /api/user/addresses/{id}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<i64>,
    Json(body): Json<AddressInput>,
) -> ApiResult<AddressModel> {
    ok(address::update_address(state.db(), me.id, id, body).await?)
}

/// PUT /api/user/addresses/{id}/default
pub async fn set_default(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<AddressModel> {
    ok(address::set_default_address(state.db(), me.id, id).await?)
}

/// DELETE /api/user/addresses/{id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    address::delete_address(state.db(), me.id, id).await?;
    ack("Address deleted")
}
