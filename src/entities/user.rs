//! User entity - Customer accounts.
//!
//! The `customer_type` decides which price tier applies at checkout. Every user
//! gets a unique referral code at registration and exactly one referral ledger row.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Customer pricing tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum CustomerType {
    /// Holds a pharmacy license and buys at the licensed price
    #[sea_orm(string_value = "licensee")]
    Licensee,
    /// General retail customer
    #[sea_orm(string_value = "unlicensed")]
    Unlicensed,
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique across customers
    #[sea_orm(unique)]
    pub email: String,
    /// Optional contact number
    pub phone: Option<String>,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Pricing tier
    pub customer_type: CustomerType,
    /// Inactive users cannot log in and their referral codes are rejected
    pub is_active: bool,
    /// Code other users enter at registration
    #[sea_orm(unique)]
    pub referral_code: String,
    /// Share of referee revenue credited to this user, 0-100
    pub referral_commission_percentage: f64,
    /// Mirror of the address flagged `is_default`
    pub default_address_id: Option<i64>,
    /// Hash of the outstanding password-reset code
    #[serde(skip_serializing)]
    pub reset_otp_hash: Option<String>,
    /// When the outstanding reset code stops being accepted
    #[serde(skip_serializing)]
    pub reset_otp_expires_at: Option<DateTimeUtc>,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user has many addresses
    #[sea_orm(has_many = "super::address::Entity")]
    Addresses,
    /// One user has many orders
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
    /// One user owns one referral ledger row
    #[sea_orm(has_one = "super::referral::Entity")]
    Referral,
}

impl Related<super::address::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Addresses.def()
    }
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl Related<super::referral::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Referral.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
