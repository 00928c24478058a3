//! Referral entity - the relationship ledger, one row per user.
//!
//! The commission percentage lives on the user; this row only records who
//! referred whom. Referees are kept in `referral_referee`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Referral database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "referrals")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owner of this ledger row
    #[sea_orm(unique)]
    pub user_id: i64,
    /// Copy of the owner's referral code
    #[sea_orm(unique)]
    pub referral_code: String,
    /// User whose code the owner registered with
    pub referred_by: Option<i64>,
    /// Number of users who registered with this code
    pub total_referrals: i32,
    /// Referees whose first order was delivered
    pub successful_referrals: i32,
    /// When the row was created
    pub created_at: DateTimeUtc,
    /// When the row was last touched
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Referral and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The owning user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    /// Users registered with this code
    #[sea_orm(has_many = "super::referral_referee::Entity")]
    Referees,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::referral_referee::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referees.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
