//! Order status log - append-only, one row per transition.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::order::OrderStatus;

/// Status log database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "order_status_history")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Order the entry belongs to
    pub order_id: i64,
    /// Status entered
    pub status: OrderStatus,
    /// Optional free-text note
    pub note: Option<String>,
    /// Who made the change (`user:<id>`, `admin:<id>`, `system`)
    pub actor: Option<String>,
    /// When the transition happened
    pub created_at: DateTimeUtc,
}

/// Defines relationships between the log entry and its order
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each entry belongs to one order
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
