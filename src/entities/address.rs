//! Address entity - Shipping addresses owned by a single user.
//!
//! At most one address per user carries `is_default`; the core layer keeps it
//! that way by clearing the flag on siblings whenever one is set.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Kind of address
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AddressType {
    /// Residential
    #[sea_orm(string_value = "home")]
    Home,
    /// Office or shop
    #[sea_orm(string_value = "work")]
    Work,
    /// Anything else
    #[sea_orm(string_value = "other")]
    Other,
}

/// Address database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "addresses")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning user
    pub user_id: i64,
    /// Kind of address
    pub address_type: AddressType,
    /// Recipient name
    pub full_name: String,
    /// Recipient phone
    pub phone: String,
    /// Street line
    pub line1: String,
    /// Optional second street line
    pub line2: Option<String>,
    /// City
    pub city: String,
    /// State or province
    pub state: String,
    /// Postal code
    pub postal_code: String,
    /// Country
    pub country: String,
    /// Whether this is the user's default address
    pub is_default: bool,
    /// When the address was created
    pub created_at: DateTimeUtc,
    /// When the address was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Address and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each address belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
