//! Device push token registered by a customer. Expires 60 days after the last registration.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer push token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "fcm_tokens")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning customer
    pub user_id: i64,
    /// Token issued by the push service
    #[sea_orm(unique)]
    pub token: String,
    /// Optional device label
    pub device: Option<String>,
    /// When the token was (re-)registered
    pub created_at: DateTimeUtc,
    /// After this instant the row is pruned
    pub expires_at: DateTimeUtc,
}

/// `FcmToken` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
