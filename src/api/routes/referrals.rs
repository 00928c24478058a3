//! Referral routes.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;

use crate::{
    api::{
        extract::{AuthAdmin, AuthUser},
        response::{Ack, ApiResult, ack, ok},
        state::AppState,
    },
    core::{
        admin::PermissionSet,
        referral::{self, CodeValidation, ReferralDetails},
    },
    entities::ReferralModel,
};

/// A referral code to check.
#[derive(Debug, Deserialize)]
pub struct CodeParam {
    /// The code
    pub code: String,
}

/// GET /api/referrals/validate?code=
pub async fn validate(
    State(state): State<AppState>,
    Query(query): Query<CodeParam>,
) -> ApiResult<CodeValidation> {
    ok(referral::validate_code(state.db(), &query.code).await?)
}

/// POST /api/referrals/verify
pub async fn verify(State(state): State<AppState>, Json(body): Json<CodeParam>) -> ApiResult<CodeValidation> {
    ok(referral::validate_code(state.db(), &body.code).await?)
}

/// GET /api/user/referral
pub async fn mine(State(state): State<AppState>, AuthUser(me): AuthUser) -> ApiResult<ReferralDetails> {
    ok(referral::get_referral_details(state.db(), me.id).await?)
}

/// GET /api/admin/referrals
pub async fn admin_list(State(state): State<AppState>, admin: AuthAdmin) -> ApiResult<Vec<ReferralModel>> {
    admin.require(PermissionSet::MANAGE_REFERRALS)?;
    ok(referral::list_referrals(state.db()).await?)
}

/// GET /api/admin/referrals/users/{user_id}
pub async fn admin_details(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(user_id): Path<i64>,
) -> ApiResult<ReferralDetails> {
    admin.require(PermissionSet::MANAGE_REFERRALS)?;
    ok(referral::get_referral_details(state.db(), user_id).await?)
}

/// Commission change request.
#[derive(Debug, Deserialize)]
pub struct CommissionBody {
    /// Percent of referee revenue, 0 to 100
    pub percentage: f64,
}

/// PUT /api/admin/referrals/users/{user_id}/commission
pub async fn admin_set_commission(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(user_id): Path<i64>,
    Json(body): Json<CommissionBody>,
) -> ApiResult<Ack> {
    admin.require(PermissionSet::MANAGE_REFERRALS)?;
    referral::set_commission(state.db(), user_id, body.percentage).await?;
    ack("Commission updated")
}

/// DELETE /api/admin/referrals/{id}
pub async fn admin_delete(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<Ack> {
    admin.require(PermissionSet::MANAGE_REFERRALS)?;
    referral::delete_referral(state.db(), id).await?;
    ack("Referral deleted")
}
