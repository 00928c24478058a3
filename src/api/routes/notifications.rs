//! Device token and push notification routes.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        extract::{AuthAdmin, AuthUser},
        response::{Ack, ApiResult, ack, ok},
        state::AppState,
    },
    core::{
        admin::PermissionSet,
        notification::{self, DeliveryReport, PushMessage, SendOutcome},
    },
    entities::{NotificationModel, admin_fcm_token, fcm_token},
};

/// Token registration request.
#[derive(Debug, Deserialize)]
pub struct TokenBody {
    /// Push service token
    pub token: String,
    /// Optional device label
    #[serde(default)]
    pub device: Option<String>,
}

/// POST /api/notifications/register-token
pub async fn register_token(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<TokenBody>,
) -> ApiResult<fcm_token::Model> {
    ok(notification::register_token(state.db(), me.id, &body.token, body.device).await?)
}

/// GET /api/notifications/tokens
pub async fn list_tokens(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> ApiResult<Vec<fcm_token::Model>> {
    ok(notification::list_tokens(state.db(), me.id).await?)
}

/// DELETE /api/notifications/tokens/{token}
pub async fn delete_token(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(token): Path<String>,
) -> ApiResult<Ack> {
    notification::delete_token(state.db(), me.id, &token).await?;
    ack("Token removed")
}

/// GET /api/notifications
pub async fn list_mine(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
) -> ApiResult<Vec<NotificationModel>> {
    ok(notification::list_notifications(state.db(), me.id).await?)
}

/// POST /api/admin/notifications/register-token
pub async fn admin_register_token(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(body): Json<TokenBody>,
) -> ApiResult<admin_fcm_token::Model> {
    ok(notification::register_admin_token(state.db(), admin.0.id, &body.token, body.device).await?)
}

/// GET /api/admin/notifications/tokens
pub async fn admin_list_tokens(
    State(state): State<AppState>,
    admin: AuthAdmin,
) -> ApiResult<Vec<admin_fcm_token::Model>> {
    ok(notification::list_admin_tokens(state.db(), admin.0.id).await?)
}

/// DELETE /api/admin/notifications/tokens/{token}
pub async fn admin_delete_token(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(token): Path<String>,
) -> ApiResult<Ack> {
    notification::delete_admin_token(state.db(), admin.0.id, &token).await?;
    ack("Token removed")
}

/// POST /api/admin/notifications/broadcast
pub async fn broadcast(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(message): Json<PushMessage>,
) -> ApiResult<SendOutcome> {
    admin.require(PermissionSet::SEND_NOTIFICATIONS)?;
    ok(notification::broadcast(state.db(), state.push(), &message).await?)
}

/// POST /api/admin/notifications/users/{user_id}
pub async fn send_to_user(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(user_id): Path<i64>,
    Json(message): Json<PushMessage>,
) -> ApiResult<SendOutcome> {
    admin.require(PermissionSet::SEND_NOTIFICATIONS)?;
    ok(notification::send_to_user(state.db(), state.push(), user_id, &message).await?)
}

/// POST /api/admin/notifications/test
///
/// Sends a message to every admin device.
pub async fn test_admins(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(message): Json<PushMessage>,
) -> ApiResult<DeliveryReport> {
    admin.require(PermissionSet::SEND_NOTIFICATIONS)?;
    ok(notification::notify_admins(state.db(), state.push(), &message).await?)
}

/// Rows removed by a prune.
#[derive(Debug, Serialize)]
pub struct Pruned {
    /// Tokens and notifications deleted
    pub removed: u64,
}

/// POST /api/admin/notifications/prune
pub async fn prune(State(state): State<AppState>, admin: AuthAdmin) -> ApiResult<Pruned> {
    admin.require(PermissionSet::SEND_NOTIFICATIONS)?;
    ok(Pruned {
        removed: notification::prune_expired(state.db()).await?,
    })
}
