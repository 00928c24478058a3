//! Account routes: registration, login, password reset and profile.

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    api::{
        extract::AuthUser,
        response::{Ack, ApiResult, ok},
        state::AppState,
    },
    core::{
        admin,
        auth::TokenKind,
        user::{self, NewUser},
    },
    entities::{AdminUserModel, UserModel},
};

/// Email and password.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
}

/// A bearer token and the account it belongs to.
#[derive(Debug, Serialize)]
pub struct Session<T> {
    /// Bearer token for the `Authorization` header
    pub token: String,
    /// The account
    pub user: T,
}

/// POST /api/auth/register
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<NewUser>,
) -> ApiResult<Session<UserModel>> {
    let account = user::register(state.db(), body).await?;
    let token = state.tokens().issue(account.id, TokenKind::User)?;
    ok(Session {
        token,
        user: account,
    })
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> ApiResult<Session<UserModel>> {
    let account = user::login(state.db(), &body.email, &body.password).await?;
    let token = state.tokens().issue(account.id, TokenKind::User)?;
    ok(Session {
        token,
        user: account,
    })
}

/// POST /api/auth/admin/login
pub async fn admin_login(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> ApiResult<Session<AdminUserModel>> {
    let account = admin::admin_login(state.db(), &body.email, &body.password).await?;
    let token = state.tokens().issue(account.id, TokenKind::Admin)?;
    ok(Session {
        token,
        user: account,
    })
}

/// Password reset request.
#[derive(Debug, Deserialize)]
pub struct ForgotPassword {
    /// Account email
    pub email: String,
}

/// Reply to a reset request. Identical whether or not the account exists.
#[derive(Debug, Serialize)]
pub struct ForgotPasswordReply {
    /// Confirmation text
    pub message: &'static str,
    /// The code itself, only in debug builds where no mailer runs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub otp: Option<String>,
}

/// POST /api/auth/forgot-password
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPassword>,
) -> ApiResult<ForgotPasswordReply> {
    let otp = user::forgot_password(state.db(), &body.email).await?;
    if otp.is_some() {
        info!("Password reset code ready for delivery");
    }
    ok(ForgotPasswordReply {
        message: "If the account exists, a reset code has been sent",
        otp: otp.filter(|_| cfg!(debug_assertions)),
    })
}

/// Password reset confirmation.
#[derive(Debug, Deserialize)]
pub struct ResetPassword {
    /// Account email
    pub email: String,
    /// Six-digit code
    pub otp: String,
    /// New plaintext password
    pub password: String,
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<AppState>,
    Json(body): Json<ResetPassword>,
) -> ApiResult<Ack> {
    user::reset_password(state.db(), &body.email, &body.otp, &body.password).await?;
    ok(Ack {
        message: "Password updated",
    })
}

/// GET /api/auth/me
pub async fn me(AuthUser(account): AuthUser) -> ApiResult<UserModel> {
    ok(account)
}

/// Profile edit. Absent fields are left alone.
#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    /// New display name
    #[serde(default)]
    pub name: Option<String>,
    /// New phone number
    #[serde(default)]
    pub phone: Option<String>,
}

/// PUT /api/auth/me
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(account): AuthUser,
    Json(body): Json<ProfileUpdate>,
) -> ApiResult<UserModel> {
    ok(user::update_profile(state.db(), account.id, body.name, body.phone).await?)
}
