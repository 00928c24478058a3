//! Customer account business logic.
//!
//! Registration, login, password reset, profile edits and the admin-side
//! account controls. Deleting an account runs [`CascadePlan::for_user`] inside a
//! single transaction.

use crate::{
    core::{
        auth::{hash_password, validate_password, verify_password},
        cascade::{CascadePlan, CascadeReport},
        referral,
    },
    entities::{User, user, user::CustomerType},
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use rand::Rng;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// Characters of the name kept at the front of a referral code.
const REFERRAL_PREFIX_LEN: usize = 4;
/// Attempts at drawing an unused referral code before giving up.
const REFERRAL_CODE_ATTEMPTS: u32 = 10;
/// How long a password-reset code stays valid.
const RESET_OTP_TTL_MINUTES: i64 = 10;

/// Registration request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUser {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Plaintext password
    pub password: String,
    /// Optional phone number
    #[serde(default)]
    pub phone: Option<String>,
    /// Pricing tier requested at signup
    #[serde(default = "default_customer_type", rename = "type")]
    pub customer_type: CustomerType,
    /// Code of the user who referred this one
    #[serde(default)]
    pub referral_code: Option<String>,
}

const fn default_customer_type() -> CustomerType {
    CustomerType::Unlicensed
}

/// Builds the referral code prefix: up to four alphanumerics of the name, upper-cased.
#[must_use]
pub fn referral_prefix(name: &str) -> String {
    let prefix: String = name
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .take(REFERRAL_PREFIX_LEN)
        .map(|c| c.to_ascii_uppercase())
        .collect();
    if prefix.is_empty() {
        "DD".to_string()
    } else {
        prefix
    }
}

fn random_referral_code(name: &str) -> String {
    let suffix: u32 = rand::rng().random_range(1000..10000);
    format!("{}{suffix}", referral_prefix(name))
}

/// Draws referral codes until one is not taken.
async fn generate_referral_code<C>(db: &C, name: &str) -> Result<String>
where
    C: ConnectionTrait,
{
    for _ in 0..REFERRAL_CODE_ATTEMPTS {
        let code = random_referral_code(name);
        let taken = User::find()
            .filter(user::Column::ReferralCode.eq(code.as_str()))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(code);
        }
    }
    Err(Error::Conflict {
        message: "could not allocate a unique referral code".to_string(),
    })
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Registers a customer, their referral ledger row and, when a usable referral
/// code is given, the referee link on the referrer's row. All or nothing.
#[instrument(skip(db, new_user), fields(email = %new_user.email))]
pub async fn register(db: &DatabaseConnection, new_user: NewUser) -> Result<user::Model> {
    let name = new_user.name.trim().to_string();
    if name.is_empty() {
        return Err(Error::validation("name is required"));
    }
    let email = normalize_email(&new_user.email);
    if !email.contains('@') {
        return Err(Error::validation("a valid email is required"));
    }
    validate_password(&new_user.password)?;
    let password_hash = hash_password(&new_user.password)?;

    let txn = db.begin().await?;

    if User::find()
        .filter(user::Column::Email.eq(email.as_str()))
        .one(&txn)
        .await?
        .is_some()
    {
        return Err(Error::Conflict {
            message: format!("email {email} is already registered"),
        });
    }

    let referrer_id = referral::resolve_referrer(&txn, new_user.referral_code.as_deref()).await?;
    let referral_code = generate_referral_code(&txn, &name).await?;

    let now = Utc::now();
    let created = user::ActiveModel {
        name: Set(name),
        email: Set(email),
        phone: Set(new_user.phone),
        password_hash: Set(password_hash),
        customer_type: Set(new_user.customer_type),
        is_active: Set(true),
        referral_code: Set(referral_code.clone()),
        referral_commission_percentage: Set(0.0),
        default_address_id: Set(None),
        reset_otp_hash: Set(None),
        reset_otp_expires_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    referral::create_ledger(&txn, created.id, &referral_code, referrer_id).await?;
    if let Some(referrer_id) = referrer_id {
        referral::attach_referee(&txn, referrer_id, created.id).await?;
    }

    txn.commit().await?;
    info!(user_id = created.id, "User registered");
    Ok(created)
}

/// Checks credentials and returns the account.
///
/// Unknown email and wrong password are indistinguishable to the caller.
pub async fn login(db: &DatabaseConnection, email: &str, password: &str) -> Result<user::Model> {
    let bad_credentials = || Error::Unauthorized {
        message: "invalid email or password".to_string(),
    };

    let account = User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
        .ok_or_else(bad_credentials)?;

    if !verify_password(password, &account.password_hash)? {
        warn!(user_id = account.id, "Failed login");
        return Err(bad_credentials());
    }
    if !account.is_active {
        return Err(Error::Forbidden {
            message: "account is inactive".to_string(),
        });
    }
    Ok(account)
}

/// Finds a user by id.
pub async fn get_user(db: &DatabaseConnection, user_id: i64) -> Result<user::Model> {
    User::find_by_id(user_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))
}

/// Lists all users, newest first.
pub async fn list_users(db: &DatabaseConnection) -> Result<Vec<user::Model>> {
    User::find()
        .order_by_desc(user::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Changes a user's display name and phone number.
pub async fn update_profile(
    db: &DatabaseConnection,
    user_id: i64,
    name: Option<String>,
    phone: Option<String>,
) -> Result<user::Model> {
    let account = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = account.into();
    if let Some(name) = name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(Error::validation("name cannot be empty"));
        }
        active.name = Set(name);
    }
    if phone.is_some() {
        active.phone = Set(phone);
    }
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Activates or deactivates an account.
pub async fn set_active(db: &DatabaseConnection, user_id: i64, is_active: bool) -> Result<user::Model> {
    let account = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = account.into();
    active.is_active = Set(is_active);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    info!(user_id, is_active, "User activation changed");
    Ok(updated)
}

/// Moves a user to another pricing tier.
pub async fn set_customer_type(
    db: &DatabaseConnection,
    user_id: i64,
    customer_type: CustomerType,
) -> Result<user::Model> {
    let account = get_user(db, user_id).await?;
    let mut active: user::ActiveModel = account.into();
    active.customer_type = Set(customer_type);
    active.updated_at = Set(Utc::now());
    active.update(db).await.map_err(Into::into)
}

/// Issues a six-digit password-reset code valid for ten minutes.
///
/// Returns the plaintext code so the caller can hand it to the mailer, or `None`
/// when no account matches (the caller should not reveal which).
pub async fn forgot_password(db: &DatabaseConnection, email: &str) -> Result<Option<String>> {
    let Some(account) = User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
    else {
        return Ok(None);
    };

    let otp = format!("{:06}", rand::rng().random_range(0..1_000_000));
    let user_id = account.id;
    let mut active: user::ActiveModel = account.into();
    active.reset_otp_hash = Set(Some(hash_password(&otp)?));
    active.reset_otp_expires_at = Set(Some(Utc::now() + Duration::minutes(RESET_OTP_TTL_MINUTES)));
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    info!(user_id, "Password reset code issued");
    Ok(Some(otp))
}

/// Sets a new password when `otp` matches the outstanding, unexpired reset code.
pub async fn reset_password(
    db: &DatabaseConnection,
    email: &str,
    otp: &str,
    new_password: &str,
) -> Result<()> {
    validate_password(new_password)?;
    let invalid = || Error::validation("invalid or expired reset code");

    let account = User::find()
        .filter(user::Column::Email.eq(normalize_email(email)))
        .one(db)
        .await?
        .ok_or_else(invalid)?;

    let (Some(hash), Some(expires_at)) = (&account.reset_otp_hash, account.reset_otp_expires_at)
    else {
        return Err(invalid());
    };
    if expires_at < Utc::now() || !verify_password(otp, hash)? {
        return Err(invalid());
    }

    let user_id = account.id;
    let mut active: user::ActiveModel = account.into();
    active.password_hash = Set(hash_password(new_password)?);
    active.reset_otp_hash = Set(None);
    active.reset_otp_expires_at = Set(None);
    active.updated_at = Set(Utc::now());
    active.update(db).await?;

    info!(user_id, "Password reset");
    Ok(())
}

/// Deletes a user with their addresses, orders, tokens, notifications and
/// referral links. Nothing is applied unless every step succeeds.
#[instrument(skip(db))]
pub async fn delete_user(db: &DatabaseConnection, user_id: i64) -> Result<CascadeReport> {
    let txn = db.begin().await?;

    User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;

    let report = CascadePlan::for_user(user_id).apply(&txn).await?;
    txn.commit().await?;

    info!(user_id, rows = report.total_rows(), "User deleted");
    Ok(report)
}
