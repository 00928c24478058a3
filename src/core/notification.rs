//! Push notifications and device tokens.
//!
//! Delivery goes through a [`PushSender`]; the store never talks to a push
//! service directly. Tokens live 60 days from their last registration and
//! notifications 30 days from creation. Expiry is enforced on read and by
//! [`prune_expired`].

use std::pin::Pin;

use crate::{
    entities::{
        AdminFcmToken, FcmToken, Notification, admin_fcm_token, fcm_token, notification,
    },
    errors::{Error, Result},
};
use chrono::{Duration, Utc};
use sea_orm::{Condition, QueryOrder, Set, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Days a device token stays valid after registration.
pub const TOKEN_TTL_DAYS: i64 = 60;
/// Days a notification is kept.
pub const NOTIFICATION_TTL_DAYS: i64 = 30;

/// Boxed future returned by [`PushSender::send`].
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Title and body of a push message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushMessage {
    /// Short headline
    pub title: String,
    /// Message text
    pub body: String,
}

impl PushMessage {
    fn validate(&self) -> Result<()> {
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(Error::validation("notification title and body are required"));
        }
        Ok(())
    }
}

/// What a sender managed to deliver.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryReport {
    /// Tokens the message reached
    pub delivered: usize,
    /// Tokens the push service rejected as unknown or unregistered
    pub invalid_tokens: Vec<String>,
}

/// Fan-out to device tokens.
pub trait PushSender: Send + Sync {
    /// Sends `message` to every token. Rejected tokens are reported, not errors.
    fn send<'a>(
        &'a self,
        tokens: &'a [String],
        message: &'a PushMessage,
    ) -> BoxFuture<'a, Result<DeliveryReport>>;
}

/// Sender that only logs. Used when no push service is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPushSender;

impl PushSender for LogPushSender {
    fn send<'a>(
        &'a self,
        tokens: &'a [String],
        message: &'a PushMessage,
    ) -> BoxFuture<'a, Result<DeliveryReport>> {
        Box::pin(async move {
            for token in tokens {
                debug!(token, title = %message.title, "Push delivered (log only)");
            }
            Ok(DeliveryReport {
                delivered: tokens.len(),
                invalid_tokens: Vec::new(),
            })
        })
    }
}

/// Result of a send: the stored notification and delivery counts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendOutcome {
    /// Row recorded for the message
    pub notification: notification::Model,
    /// Tokens the message reached
    pub delivered: usize,
    /// Invalid tokens deleted afterwards
    pub pruned: u64,
}

/// Registers (or refreshes) a customer device token.
///
/// A token already registered to another user moves to this one.
#[instrument(skip(db, token))]
pub async fn register_token(
    db: &DatabaseConnection,
    user_id: i64,
    token: &str,
    device: Option<String>,
) -> Result<fcm_token::Model> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::validation("token is required"));
    }
    let now = Utc::now();
    let expires_at = now + Duration::days(TOKEN_TTL_DAYS);

    let existing = FcmToken::find()
        .filter(fcm_token::Column::Token.eq(token))
        .one(db)
        .await?;
    let saved = match existing {
        Some(found) => {
            let mut active: fcm_token::ActiveModel = found.into();
            active.user_id = Set(user_id);
            active.device = Set(device);
            active.expires_at = Set(expires_at);
            active.update(db).await?
        }
        None => {
            fcm_token::ActiveModel {
                user_id: Set(user_id),
                token: Set(token.to_string()),
                device: Set(device),
                created_at: Set(now),
                expires_at: Set(expires_at),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    info!(user_id, "Device token registered");
    Ok(saved)
}

/// A user's unexpired tokens.
pub async fn list_tokens(db: &DatabaseConnection, user_id: i64) -> Result<Vec<fcm_token::Model>> {
    FcmToken::find()
        .filter(fcm_token::Column::UserId.eq(user_id))
        .filter(fcm_token::Column::ExpiresAt.gt(Utc::now()))
        .order_by_desc(fcm_token::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes one of the user's tokens.
pub async fn delete_token(db: &DatabaseConnection, user_id: i64, token: &str) -> Result<()> {
    let result = FcmToken::delete_many()
        .filter(fcm_token::Column::UserId.eq(user_id))
        .filter(fcm_token::Column::Token.eq(token))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("FcmToken", token));
    }
    Ok(())
}

/// Registers (or refreshes) an admin device token.
pub async fn register_admin_token(
    db: &DatabaseConnection,
    admin_id: i64,
    token: &str,
    device: Option<String>,
) -> Result<admin_fcm_token::Model> {
    let token = token.trim();
    if token.is_empty() {
        return Err(Error::validation("token is required"));
    }
    let now = Utc::now();
    let expires_at = now + Duration::days(TOKEN_TTL_DAYS);

    let existing = AdminFcmToken::find()
        .filter(admin_fcm_token::Column::Token.eq(token))
        .one(db)
        .await?;
    let saved = match existing {
        Some(found) => {
            let mut active: admin_fcm_token::ActiveModel = found.into();
            active.admin_id = Set(admin_id);
            active.device = Set(device);
            active.expires_at = Set(expires_at);
            active.update(db).await?
        }
        None => {
            admin_fcm_token::ActiveModel {
                admin_id: Set(admin_id),
                token: Set(token.to_string()),
                device: Set(device),
                created_at: Set(now),
                expires_at: Set(expires_at),
                ..Default::default()
            }
            .insert(db)
            .await?
        }
    };
    Ok(saved)
}

/// An admin's unexpired tokens.
pub async fn list_admin_tokens(
    db: &DatabaseConnection,
    admin_id: i64,
) -> Result<Vec<admin_fcm_token::Model>> {
    AdminFcmToken::find()
        .filter(admin_fcm_token::Column::AdminId.eq(admin_id))
        .filter(admin_fcm_token::Column::ExpiresAt.gt(Utc::now()))
        .order_by_desc(admin_fcm_token::Column::CreatedAt)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Removes one of the admin's tokens.
pub async fn delete_admin_token(db: &DatabaseConnection, admin_id: i64, token: &str) -> Result<()> {
    let result = AdminFcmToken::delete_many()
        .filter(admin_fcm_token::Column::AdminId.eq(admin_id))
        .filter(admin_fcm_token::Column::Token.eq(token))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        return Err(Error::not_found("AdminFcmToken", token));
    }
    Ok(())
}

async fn record(
    db: &DatabaseConnection,
    user_id: Option<i64>,
    message: &PushMessage,
) -> Result<notification::Model> {
    let now = Utc::now();
    notification::ActiveModel {
        user_id: Set(user_id),
        title: Set(message.title.clone()),
        body: Set(message.body.clone()),
        created_at: Set(now),
        expires_at: Set(now + Duration::days(NOTIFICATION_TTL_DAYS)),
        ..Default::default()
    }
    .insert(db)
    .await
    .map_err(Into::into)
}

async fn prune_invalid(db: &DatabaseConnection, invalid: Vec<String>) -> Result<u64> {
    if invalid.is_empty() {
        return Ok(0);
    }
    let result = FcmToken::delete_many()
        .filter(fcm_token::Column::Token.is_in(invalid))
        .exec(db)
        .await?;
    warn!(rows = result.rows_affected, "Pruned invalid device tokens");
    Ok(result.rows_affected)
}

async fn deliver(
    db: &DatabaseConnection,
    sender: &dyn PushSender,
    user_id: Option<i64>,
    tokens: Vec<String>,
    message: &PushMessage,
) -> Result<SendOutcome> {
    let notification = record(db, user_id, message).await?;
    let report = if tokens.is_empty() {
        DeliveryReport::default()
    } else {
        sender.send(&tokens, message).await?
    };
    let pruned = prune_invalid(db, report.invalid_tokens).await?;
    info!(?user_id, delivered = report.delivered, pruned, "Notification sent");
    Ok(SendOutcome {
        notification,
        delivered: report.delivered,
        pruned,
    })
}

/// Pushes a message to every device of one user and records it.
#[instrument(skip(db, sender, message))]
pub async fn send_to_user(
    db: &DatabaseConnection,
    sender: &dyn PushSender,
    user_id: i64,
    message: &PushMessage,
) -> Result<SendOutcome> {
    message.validate()?;
    let tokens = list_tokens(db, user_id)
        .await?
        .into_iter()
        .map(|t| t.token)
        .collect();
    deliver(db, sender, Some(user_id), tokens, message).await
}

/// Pushes a message to every registered customer device and records it once.
#[instrument(skip(db, sender, message))]
pub async fn broadcast(
    db: &DatabaseConnection,
    sender: &dyn PushSender,
    message: &PushMessage,
) -> Result<SendOutcome> {
    message.validate()?;
    let tokens = FcmToken::find()
        .filter(fcm_token::Column::ExpiresAt.gt(Utc::now()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.token)
        .collect();
    deliver(db, sender, None, tokens, message).await
}

/// Pushes a message to every admin device. Nothing is recorded.
pub async fn notify_admins(
    db: &DatabaseConnection,
    sender: &dyn PushSender,
    message: &PushMessage,
) -> Result<DeliveryReport> {
    message.validate()?;
    let tokens: Vec<String> = AdminFcmToken::find()
        .filter(admin_fcm_token::Column::ExpiresAt.gt(Utc::now()))
        .all(db)
        .await?
        .into_iter()
        .map(|t| t.token)
        .collect();
    if tokens.is_empty() {
        return Ok(DeliveryReport::default());
    }
    let report = sender.send(&tokens, message).await?;
    if !report.invalid_tokens.is_empty() {
        AdminFcmToken::delete_many()
            .filter(admin_fcm_token::Column::Token.is_in(report.invalid_tokens.clone()))
            .exec(db)
            .await?;
    }
    Ok(report)
}

/// Unexpired notifications addressed to the user or to everyone, newest first.
pub async fn list_notifications(
    db: &DatabaseConnection,
    user_id: i64,
) -> Result<Vec<notification::Model>> {
    Notification::find()
        .filter(
            Condition::any()
                .add(notification::Column::UserId.eq(user_id))
                .add(notification::Column::UserId.is_null()),
        )
        .filter(notification::Column::ExpiresAt.gt(Utc::now()))
        .order_by_desc(notification::Column::CreatedAt)
        .order_by_desc(notification::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Deletes expired tokens and notifications. Returns the rows removed.
pub async fn prune_expired(db: &DatabaseConnection) -> Result<u64> {
    let now = Utc::now();
    let tokens = FcmToken::delete_many()
        .filter(fcm_token::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?
        .rows_affected;
    let admin_tokens = AdminFcmToken::delete_many()
        .filter(admin_fcm_token::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?
        .rows_affected;
    let notifications = Notification::delete_many()
        .filter(notification::Column::ExpiresAt.lte(now))
        .exec(db)
        .await?
        .rows_affected;
    let total = tokens + admin_tokens + notifications;
    if total > 0 {
        info!(tokens, admin_tokens, notifications, "Pruned expired records");
    }
    Ok(total)
}
