//! Product/category link - the N side of a product's category membership.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Product-category link model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "product_categories")]
pub struct Model {
    /// Linked product
    #[sea_orm(primary_key, auto_increment = false)]
    pub product_id: i64,
    /// Linked category
    #[sea_orm(primary_key, auto_increment = false)]
    pub category_id: i64,
}

/// Defines relationships between the link and its two ends
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The product end
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
    /// The category end
    #[sea_orm(
        belongs_to = "super::category::Entity",
        from = "Column::CategoryId",
        to = "super::category::Column::Id"
    )]
    Category,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::category::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
