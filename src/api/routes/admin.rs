//! Back-office account management and the dashboard.

use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};

use crate::{
    api::{
        extract::AuthAdmin,
        response::{ApiResult, ok},
        state::AppState,
    },
    core::{
        admin::{self, PermissionSet},
        dashboard::{self, DashboardSummary},
        user,
    },
    entities::{AdminUserModel, UserModel, admin_user::AdminRole, user::CustomerType},
};

/// GET /api/admin/users
pub async fn list_users(State(state): State<AppState>, admin: AuthAdmin) -> ApiResult<Vec<UserModel>> {
    admin.require(PermissionSet::MANAGE_USERS)?;
    ok(user::list_users(state.db()).await?)
}

/// GET /api/admin/users/{id}
pub async fn get_user(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<UserModel> {
    admin.require(PermissionSet::MANAGE_USERS)?;
    ok(user::get_user(state.db(), id).await?)
}

/// Activation toggle.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveBody {
    /// New state
    pub is_active: bool,
}

/// PUT /api/admin/users/{id}/active
pub async fn set_user_active(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<ActiveBody>,
) -> ApiResult<UserModel> {
    admin.require(PermissionSet::MANAGE_USERS)?;
    ok(user::set_active(state.db(), id, body.is_active).await?)
}

/// Pricing tier change.
#[derive(Debug, Deserialize)]
pub struct TierBody {
    /// New tier
    #[serde(rename = "type")]
    pub customer_type: CustomerType,
}

/// PUT /api/admin/users/{id}/type
pub async fn set_user_type(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<TierBody>,
) -> ApiResult<UserModel> {
    admin.require(PermissionSet::MANAGE_USERS)?;
    ok(user::set_customer_type(state.db(), id, body.customer_type).await?)
}

/// What a user deletion removed.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeletionSummary {
    /// Rows touched across all cleanup steps
    pub rows_affected: u64,
    /// One line per step, in execution order
    pub steps: Vec<String>,
}

/// DELETE /api/admin/users/{id}
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<DeletionSummary> {
    admin.require(PermissionSet::MANAGE_USERS)?;
    let report = user::delete_user(state.db(), id).await?;
    ok(DeletionSummary {
        rows_affected: report.total_rows(),
        steps: report
            .outcomes
            .iter()
            .map(|o| format!("{}: {}", o.step, o.rows_affected))
            .collect(),
    })
}

/// GET /api/admin/admins
pub async fn list_admins(State(state): State<AppState>, admin: AuthAdmin) -> ApiResult<Vec<AdminUserModel>> {
    admin.require(PermissionSet::MANAGE_ADMINS)?;
    ok(admin::list_admins(state.db()).await?)
}

/// New back-office account.
#[derive(Debug, Deserialize)]
pub struct NewAdmin {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Role; permissions follow from it
    pub role: AdminRole,
}

/// POST /api/admin/admins
pub async fn create_admin(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Json(body): Json<NewAdmin>,
) -> ApiResult<AdminUserModel> {
    admin.require(PermissionSet::MANAGE_ADMINS)?;
    ok(admin::create_admin_user(state.db(), &body.name, &body.email, &body.password, body.role).await?)
}

/// Role change.
#[derive(Debug, Deserialize)]
pub struct RoleBody {
    /// New role
    pub role: AdminRole,
}

/// PUT /api/admin/admins/{id}/role
pub async fn change_role(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<RoleBody>,
) -> ApiResult<AdminUserModel> {
    admin.require(PermissionSet::MANAGE_ADMINS)?;
    ok(admin::change_role(state.db(), id, body.role).await?)
}

/// PUT /api/admin/admins/{id}/active
pub async fn set_admin_active(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<ActiveBody>,
) -> ApiResult<AdminUserModel> {
    admin.require(PermissionSet::MANAGE_ADMINS)?;
    ok(admin::set_admin_active(state.db(), id, body.is_active).await?)
}

/// GET /api/admin/dashboard
pub async fn dashboard(State(state): State<AppState>, admin: AuthAdmin) -> ApiResult<DashboardSummary> {
    admin.require(PermissionSet::VIEW_DASHBOARD)?;
    ok(dashboard::dashboard_summary(state.db()).await?)
}
