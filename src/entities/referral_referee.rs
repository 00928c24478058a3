//! Referee entry - one user who registered with another user's code.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Progress of a single referee
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum RefereeStatus {
    /// Registered, nothing delivered yet
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Has at least one delivered order
    #[sea_orm(string_value = "completed")]
    Completed,
    /// Referrer has been paid out
    #[sea_orm(string_value = "rewarded")]
    Rewarded,
}

/// Referee database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referral_referees")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ledger row of the referrer
    pub referral_id: i64,
    /// The referred user
    pub user_id: i64,
    /// When the referee registered
    pub registered_at: DateTimeUtc,
    /// Progress
    pub status: RefereeStatus,
}

/// Defines relationships between the referee entry and its ledger row
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one referral ledger row
    #[sea_orm(
        belongs_to = "super::referral::Entity",
        from = "Column::ReferralId",
        to = "super::referral::Column::Id"
    )]
    Referral,
}

impl Related<super::referral::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referral.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
