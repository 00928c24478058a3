//! Notification entity - a message that was pushed to one user or to everyone.
//!
//! Rows expire 30 days after creation.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Recipient, None for a broadcast
    pub user_id: Option<i64>,
    /// Headline
    pub title: String,
    /// Message text
    pub body: String,
    /// When the notification was sent
    pub created_at: DateTimeUtc,
    /// After this instant the row is pruned
    pub expires_at: DateTimeUtc,
}

/// `Notification` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
