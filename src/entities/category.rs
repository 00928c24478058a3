//! Category entity - Catalog tree node.
//!
//! `sort_order` is a manually maintained sort key, unique among siblings
//! (categories sharing the same `parent_id`).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe name, unique
    #[sea_orm(unique)]
    pub slug: String,
    /// Optional blurb
    pub description: Option<String>,
    /// Optional image URL
    pub image: Option<String>,
    /// Parent category, None for top-level
    pub parent_id: Option<i64>,
    /// Sort key among siblings
    pub sort_order: i32,
    /// Shown on the storefront home page
    pub featured: bool,
    /// When the category was created
    pub created_at: DateTimeUtc,
    /// When the category was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Category and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Optional parent in the category tree
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    /// Products using this as their primary category
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
