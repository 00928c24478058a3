//! Order entity - A placed order and its running totals.
//!
//! Line items and the status log live in `order_item` and `order_status_history`.
//! Invariant: `total_price == items_price + shipping_price + tax_price - discount`.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Fulfilment state of an order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum OrderStatus {
    /// Awaiting confirmation
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Accepted; the only state a customer may cancel from
    #[sea_orm(string_value = "Processing")]
    Processing,
    /// Packed for dispatch
    #[sea_orm(string_value = "Packed")]
    Packed,
    /// Handed to the courier
    #[sea_orm(string_value = "Shipped")]
    Shipped,
    /// Received by the customer
    #[sea_orm(string_value = "Delivered")]
    Delivered,
    /// Cancelled; stock has been restored
    #[sea_orm(string_value = "Cancelled")]
    Cancelled,
    /// Sent back after delivery
    #[sea_orm(string_value = "Returned")]
    Returned,
}

/// Payment state, independent of fulfilment
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum PaymentStatus {
    /// Not yet paid
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Payment captured
    #[sea_orm(string_value = "Paid")]
    Paid,
    /// Payment attempt failed
    #[sea_orm(string_value = "Failed")]
    Failed,
    /// Money returned to the customer
    #[sea_orm(string_value = "Refunded")]
    Refunded,
}

/// How the customer pays
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    /// Cash on delivery
    #[sea_orm(string_value = "cod")]
    Cod,
    /// Online gateway
    #[sea_orm(string_value = "online")]
    Online,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable number, `PREFIX-YYYYMMDD-NNNN`
    #[sea_orm(unique)]
    pub order_number: String,
    /// Buyer
    pub user_id: i64,
    /// Address the order ships to (must belong to the buyer at creation)
    pub shipping_address_id: i64,
    /// Sum of line totals
    pub items_price: f64,
    /// Shipping charge
    pub shipping_price: f64,
    /// Tax charge
    pub tax_price: f64,
    /// Discount subtracted from the total
    pub discount: f64,
    /// Amount payable
    pub total_price: f64,
    /// Fulfilment state
    pub status: OrderStatus,
    /// Payment state
    pub payment_status: PaymentStatus,
    /// How the customer pays
    pub payment_method: PaymentMethod,
    /// Customer notes
    pub notes: Option<String>,
    /// Set on transition to Delivered
    pub delivered_at: Option<DateTimeUtc>,
    /// When the order was placed
    pub created_at: DateTimeUtc,
    /// When the order was last modified
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Order and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each order belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
    /// One order has many line items
    #[sea_orm(has_many = "super::order_item::Entity")]
    Items,
    /// One order has many status log entries
    #[sea_orm(has_many = "super::order_status_history::Entity")]
    StatusHistory,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::order_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Items.def()
    }
}

impl Related<super::order_status_history::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StatusHistory.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
