//! Admin user entity - Back-office identities, separate from customers.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Back-office role; fixes the permission set granted to the account
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum AdminRole {
    /// Full access
    #[sea_orm(string_value = "admin")]
    Admin,
    /// Manages own catalog and orders
    #[sea_orm(string_value = "vendor")]
    Vendor,
    /// Edits catalog content
    #[sea_orm(string_value = "editor")]
    Editor,
    /// Moves orders through shipping
    #[sea_orm(string_value = "delivery")]
    Delivery,
}

/// Admin user database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "admin_users")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// Login email, unique among admins
    #[sea_orm(unique)]
    pub email: String,
    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Role the permissions were derived from
    pub role: AdminRole,
    /// Permission bitset, see `core::admin::PermissionSet`
    pub permissions: i64,
    /// Inactive admins cannot log in
    pub is_active: bool,
    /// When the account was created
    pub created_at: DateTimeUtc,
    /// When the account was last modified
    pub updated_at: DateTimeUtc,
}

/// `AdminUser` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
