//! Setting entity - Stores named configuration blobs for external services
//! (payment gateway credentials, push service config).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Setting database model - stores key-value configuration pairs
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "settings")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Configuration key (e.g., `"phonepe"`, `"firebase"`)
    #[sea_orm(unique)]
    pub name: String,
    /// Arbitrary JSON value
    pub key_value: Json,
    /// When this configuration was last modified
    pub updated_at: DateTimeUtc,
}

/// `Setting` has no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
