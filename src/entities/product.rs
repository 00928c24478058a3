//! Product entity - Catalog items with dual-tier pricing.
//!
//! Discount percentages, `on_sale` and `stock_status` are derived columns;
//! `core::pricing` recomputes them on every write.

use std::collections::BTreeMap;

use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Stock level bucket derived from `stock`
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    /// At or above the low-stock threshold
    #[sea_orm(string_value = "in_stock")]
    InStock,
    /// Positive but below the threshold
    #[sea_orm(string_value = "low_stock")]
    LowStock,
    /// Nothing left
    #[sea_orm(string_value = "out_of_stock")]
    OutOfStock,
}

/// Storefront visibility gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    /// Hidden from customers
    #[sea_orm(string_value = "draft")]
    Draft,
    /// Visible on the storefront
    #[sea_orm(string_value = "published")]
    Published,
}

/// Free-form product attributes ("Manufacturer", "Composition", ...), kept in key order
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct AdditionalInfo(pub BTreeMap<String, String>);

/// Product database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name
    pub name: String,
    /// URL-safe name, unique
    #[sea_orm(unique)]
    pub slug: String,
    /// Optional long description
    pub description: Option<String>,
    /// Category the product is listed under first
    pub primary_category_id: i64,
    /// List price for licensees
    pub licensed_price: f64,
    /// List price for unlicensed customers
    pub unlicensed_price: f64,
    /// Sale price for licensees, if any
    pub sale_licensed_price: Option<f64>,
    /// Sale price for unlicensed customers, if any
    pub sale_unlicensed_price: Option<f64>,
    /// Derived whole-percent discount for licensees
    pub licensed_discount: i32,
    /// Derived whole-percent discount for unlicensed customers
    pub unlicensed_discount: i32,
    /// Derived: either tier's sale price is below its list price
    pub on_sale: bool,
    /// Units on hand
    pub stock: i32,
    /// Derived from `stock`
    pub stock_status: StockStatus,
    /// Draft or published
    pub publish_status: PublishStatus,
    /// Set the first time the product is published
    pub publish_date: Option<DateTimeUtc>,
    /// Shown in featured listings
    pub featured: bool,
    /// Optional primary image URL
    pub image: Option<String>,
    /// Free-form attributes
    #[sea_orm(column_type = "Json")]
    pub additional_info: AdditionalInfo,
    /// When the product was created
    pub created_at: DateTimeUtc,
    /// When the product was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Product and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each product has one primary category
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::PrimaryCategoryId",
        to = "super::category::Column::Id"
    )]
    PrimaryCategory,
    /// Links to every category the product is listed in
    #[sea_orm(has_many = "super::product_category::Entity")]
    CategoryLinks,
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PrimaryCategory.def()
    }
}

impl Related<super::product_category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CategoryLinks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
