//! Order line item - a snapshot of the product taken when the order was placed.
//!
//! `product_id` is deliberately not a foreign key: the product may be edited or
//! removed later without touching past orders.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_items")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Owning order
    pub order_id: i64,
    /// Product the snapshot was taken from
    pub product_id: i64,
    /// Product name at order time
    pub name: String,
    /// Units ordered, at least 1
    pub quantity: i32,
    /// Unit price charged
    pub price: f64,
    /// Product image at order time
    pub image: Option<String>,
}

/// Defines relationships between `OrderItem` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each item belongs to one order
    #[sea_orm(
        belongs_to = "super::order::Entity",
        from = "Column::OrderId",
        to = "super::order::Column::Id"
    )]
    Order,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Order.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
