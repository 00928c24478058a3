//! Admin dashboard figures, computed on every request.

use std::collections::BTreeMap;

use crate::{
    core::pricing::round_currency,
    entities::{Order, Product, User, order, order::OrderStatus, product, product::StockStatus},
    errors::Result,
};
use sea_orm::{QueryOrder, QuerySelect, prelude::*};
use serde::Serialize;

/// How many recent orders the summary carries.
pub const RECENT_ORDERS: u64 = 5;

/// Store-wide totals for the admin home page.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Registered customers
    pub user_count: u64,
    /// Orders in any state
    pub order_count: u64,
    /// Sum of delivered order totals
    pub revenue: f64,
    /// Order count per status name; statuses with no orders are absent
    pub orders_by_status: BTreeMap<String, u64>,
    /// Products with 1..9 units left
    pub low_stock_products: u64,
    /// Products with nothing left
    pub out_of_stock_products: u64,
    /// Latest orders, newest first
    pub recent_orders: Vec<order::Model>,
}

/// Builds the dashboard summary.
pub async fn dashboard_summary(db: &DatabaseConnection) -> Result<DashboardSummary> {
    let user_count = User::find().count(db).await?;
    let order_count = Order::find().count(db).await?;

    let revenue: Option<Option<f64>> = Order::find()
        .select_only()
        .column_as(order::Column::TotalPrice.sum(), "revenue")
        .filter(order::Column::Status.eq(OrderStatus::Delivered))
        .into_tuple()
        .one(db)
        .await?;

    let per_status: Vec<(OrderStatus, i64)> = Order::find()
        .select_only()
        .column(order::Column::Status)
        .column_as(order::Column::Id.count(), "orders")
        .group_by(order::Column::Status)
        .into_tuple()
        .all(db)
        .await?;
    let orders_by_status = per_status
        .into_iter()
        .map(|(status, count)| (format!("{status:?}"), u64::try_from(count).unwrap_or(0)))
        .collect();

    let low_stock_products = Product::find()
        .filter(product::Column::StockStatus.eq(StockStatus::LowStock))
        .count(db)
        .await?;
    let out_of_stock_products = Product::find()
        .filter(product::Column::StockStatus.eq(StockStatus::OutOfStock))
        .count(db)
        .await?;

    let recent_orders = Order::find()
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .limit(RECENT_ORDERS)
        .all(db)
        .await?;

    Ok(DashboardSummary {
        user_count,
        order_count,
        revenue: round_currency(revenue.flatten().unwrap_or(0.0)),
        orders_by_status,
        low_stock_products,
        out_of_stock_products,
        recent_orders,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{order::update_status, product::adjust_stock},
        test_utils::*,
    };

    #[tokio::test]
    async fn test_empty_store() -> Result<()> {
        let db = setup_test_db().await?;
        let summary = dashboard_summary(&db).await?;
        assert_eq!(summary.user_count, 0);
        assert_eq!(summary.order_count, 0);
        assert_eq!(summary.revenue, 0.0);
        assert!(summary.orders_by_status.is_empty());
        assert!(summary.recent_orders.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_summary_counts() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Dina", "dina@example.com").await?;
        let product = create_test_product(&db, "Tablets", 10.0, 12.0, 20).await?;
        let scarce = create_test_product(&db, "Rare Drops", 10.0, 12.0, 1).await?;
        adjust_stock(&db, scarce.id, -1).await?;

        let mut placed = Vec::new();
        for _ in 0..6 {
            placed.push(place_test_order(&db, &buyer, product.id, 1).await?);
        }
        update_status(&db, placed[0].id, OrderStatus::Delivered, None, "admin:1").await?;

        let summary = dashboard_summary(&db).await?;
        assert_eq!(summary.user_count, 1);
        assert_eq!(summary.order_count, 6);
        assert_eq!(summary.revenue, placed[0].total_price);
        assert_eq!(summary.orders_by_status.get("Delivered"), Some(&1));
        assert_eq!(summary.orders_by_status.get("Processing"), Some(&5));
        assert_eq!(summary.out_of_stock_products, 1);
        // 20 - 6 leaves 14, still in stock
        assert_eq!(summary.low_stock_products, 0);
        assert_eq!(summary.recent_orders.len(), 5);
        assert_eq!(summary.recent_orders[0].id, placed[5].id);
        Ok(())
    }
}
