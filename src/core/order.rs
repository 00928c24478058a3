//! Order ledger - checkout, fulfilment status and cancellation.
//!
//! Every write that touches more than one row runs in a single transaction:
//! placing an order (stock decrement, order, items, first history entry),
//! status changes (order, history, referral stats) and cancellation (stock
//! restore, order, history). A failed step drops the transaction, which rolls
//! everything back.

use crate::{
    config::app::OrderConfig,
    core::{address, pricing, product::write_stock, referral},
    entities::{
        Order, OrderItem, OrderStatusHistory, Product, User, order,
        order::{OrderStatus, PaymentMethod, PaymentStatus},
        order_item, order_status_history,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use rand::Rng;
use sea_orm::{QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// One requested line of a new order.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    /// Product to buy
    pub product_id: i64,
    /// Units, at least 1
    pub quantity: i32,
}

/// Checkout request.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Lines to buy
    pub items: Vec<OrderLine>,
    /// One of the buyer's addresses
    pub shipping_address_id: i64,
    /// Cash on delivery unless stated
    #[serde(default = "default_payment_method")]
    pub payment_method: PaymentMethod,
    /// Free-text notes for the store
    #[serde(default)]
    pub notes: Option<String>,
    /// Overrides the configured shipping fee
    #[serde(default)]
    pub shipping_price: Option<f64>,
    /// Tax charge
    #[serde(default)]
    pub tax_price: f64,
    /// Discount off the total
    #[serde(default)]
    pub discount: f64,
}

const fn default_payment_method() -> PaymentMethod {
    PaymentMethod::Cod
}

/// An order with its line items and status log.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetails {
    /// The order row
    #[serde(flatten)]
    pub order: order::Model,
    /// Line item snapshots
    pub items: Vec<order_item::Model>,
    /// Transitions, oldest first
    pub status_history: Vec<order_status_history::Model>,
}

/// Formats an order number as `PREFIX-YYYYMMDD-NNNN`.
#[must_use]
pub fn format_order_number(prefix: &str, date: DateTime<Utc>, suffix: u16) -> String {
    format!("{prefix}-{}-{suffix:04}", date.format("%Y%m%d"))
}

/// Picks a random order number that no existing order uses.
async fn unique_order_number<C>(db: &C, config: &OrderConfig, now: DateTime<Utc>) -> Result<String>
where
    C: ConnectionTrait,
{
    for attempt in 1..=config.number_attempts.max(1) {
        let suffix = rand::rng().random_range(0..10_000);
        let candidate = format_order_number(&config.number_prefix, now, suffix);
        let taken = Order::find()
            .filter(order::Column::OrderNumber.eq(candidate.as_str()))
            .count(db)
            .await?;
        if taken == 0 {
            return Ok(candidate);
        }
        debug!(attempt, %candidate, "Order number collision");
    }
    Err(Error::Conflict {
        message: "could not allocate a unique order number".to_string(),
    })
}

fn check_charge(field: &str, amount: f64) -> Result<()> {
    if amount.is_finite() && amount >= 0.0 {
        Ok(())
    } else {
        Err(Error::validation(format!("{field} must be a non-negative number")))
    }
}

async fn append_history<C>(
    db: &C,
    order_id: i64,
    status: OrderStatus,
    note: Option<String>,
    actor: &str,
    at: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    order_status_history::ActiveModel {
        order_id: Set(order_id),
        status: Set(status),
        note: Set(note),
        actor: Set(Some(actor.to_string())),
        created_at: Set(at),
        ..Default::default()
    }
    .insert(db)
    .await?;
    Ok(())
}

/// Places an order for `user_id`.
///
/// Prices each line at the buyer's tier, decrements stock and records the
/// first status entry. New orders start in `Processing`.
///
/// # Errors
/// - `Validation` for an empty cart or a negative charge
/// - `Forbidden` if the address belongs to someone else or the account is inactive
/// - `NotFound` for an unknown user, address or product
/// - `InvalidQuantity` for a line below one unit
/// - `InsufficientStock` when a product cannot cover its line
#[instrument(skip(db, config, new_order), fields(lines = new_order.items.len()))]
pub async fn create_order(
    db: &DatabaseConnection,
    config: &OrderConfig,
    user_id: i64,
    new_order: NewOrder,
) -> Result<order::Model> {
    if new_order.items.is_empty() {
        return Err(Error::validation("an order needs at least one item"));
    }
    let shipping_price = new_order
        .shipping_price
        .unwrap_or(config.default_shipping_price);
    check_charge("shippingPrice", shipping_price)?;
    check_charge("taxPrice", new_order.tax_price)?;
    check_charge("discount", new_order.discount)?;

    let txn = db.begin().await?;

    let buyer = User::find_by_id(user_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("User", user_id))?;
    if !buyer.is_active {
        return Err(Error::Forbidden {
            message: "account is deactivated".to_string(),
        });
    }
    address::get_address(&txn, user_id, new_order.shipping_address_id).await?;

    let mut snapshots = Vec::with_capacity(new_order.items.len());
    let mut items_price = 0.0;
    for line in &new_order.items {
        let product = Product::find_by_id(line.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| Error::not_found("Product", line.product_id))?;
        if line.quantity < 1 {
            return Err(Error::InvalidQuantity {
                product_id: line.product_id,
                quantity: line.quantity,
            });
        }
        if product.stock < line.quantity {
            return Err(Error::InsufficientStock {
                product_id: product.id,
                available: product.stock,
                requested: line.quantity,
            });
        }

        let price = pricing::unit_price(&product, buyer.customer_type);
        items_price += price * f64::from(line.quantity);
        snapshots.push(order_item::ActiveModel {
            product_id: Set(product.id),
            name: Set(product.name.clone()),
            quantity: Set(line.quantity),
            price: Set(price),
            image: Set(product.image.clone()),
            ..Default::default()
        });

        let remaining = product.stock - line.quantity;
        write_stock(&txn, product, remaining).await?;
    }

    let items_price = pricing::round_currency(items_price);
    let total_price = pricing::round_currency(
        items_price + shipping_price + new_order.tax_price - new_order.discount,
    );
    if total_price < 0.0 {
        return Err(Error::validation("discount exceeds the order total"));
    }

    let now = Utc::now();
    let order_number = unique_order_number(&txn, config, now).await?;
    let placed = order::ActiveModel {
        order_number: Set(order_number),
        user_id: Set(user_id),
        shipping_address_id: Set(new_order.shipping_address_id),
        items_price: Set(items_price),
        shipping_price: Set(shipping_price),
        tax_price: Set(new_order.tax_price),
        discount: Set(new_order.discount),
        total_price: Set(total_price),
        status: Set(OrderStatus::Processing),
        payment_status: Set(PaymentStatus::Pending),
        payment_method: Set(new_order.payment_method),
        notes: Set(new_order.notes),
        delivered_at: Set(None),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    for mut snapshot in snapshots {
        snapshot.order_id = Set(placed.id);
        snapshot.insert(&txn).await?;
    }
    append_history(
        &txn,
        placed.id,
        OrderStatus::Processing,
        Some("Order placed".to_string()),
        &format!("user:{user_id}"),
        now,
    )
    .await?;

    txn.commit().await?;
    info!(order_id = placed.id, order_number = %placed.order_number, total_price, "Order placed");
    Ok(placed)
}

/// Moves an order to `status` and logs the transition.
///
/// No transition table is enforced here; customer cancellation goes through
/// [`cancel_order`]. Entering `Delivered` stamps `delivered_at` and completes
/// the buyer's referee entry.
#[instrument(skip(db, note))]
pub async fn update_status(
    db: &DatabaseConnection,
    order_id: i64,
    status: OrderStatus,
    note: Option<String>,
    actor: &str,
) -> Result<order::Model> {
    let txn = db.begin().await?;
    let current = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    let buyer_id = current.user_id;
    let previous = current.status;

    let now = Utc::now();
    let mut active: order::ActiveModel = current.into();
    active.status = Set(status);
    if status == OrderStatus::Delivered {
        active.delivered_at = Set(Some(now));
    }
    active.updated_at = Set(now);
    let updated = active.update(&txn).await?;

    append_history(&txn, order_id, status, note, actor, now).await?;
    if status == OrderStatus::Delivered && previous != OrderStatus::Delivered {
        referral::mark_referee_completed(&txn, buyer_id).await?;
    }

    txn.commit().await?;
    info!(order_id, ?previous, ?status, "Order status updated");
    Ok(updated)
}

/// Cancels one of the requester's orders and puts its stock back.
///
/// # Errors
/// - `Forbidden` if `user_id` does not own the order
/// - `InvalidState` unless the order is `Processing`, or when a restored
///   stock count would overflow; nothing is written in that case
#[instrument(skip(db))]
pub async fn cancel_order(db: &DatabaseConnection, order_id: i64, user_id: i64) -> Result<order::Model> {
    let txn = db.begin().await?;
    let current = Order::find_by_id(order_id)
        .one(&txn)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    if current.user_id != user_id {
        return Err(Error::Forbidden {
            message: "order belongs to another user".to_string(),
        });
    }
    if current.status != OrderStatus::Processing {
        return Err(Error::InvalidState {
            message: format!("order is {:?}; only Processing orders can be cancelled", current.status),
        });
    }

    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order_id))
        .all(&txn)
        .await?;
    for item in items {
        match Product::find_by_id(item.product_id).one(&txn).await? {
            Some(product) => {
                let restored = product.stock.checked_add(item.quantity).ok_or_else(|| {
                    Error::InvalidState {
                        message: format!(
                            "restoring {} units to product {} would overflow its stock of {}",
                            item.quantity, product.id, product.stock
                        ),
                    }
                })?;
                write_stock(&txn, product, restored).await?;
            }
            None => warn!(order_id, product_id = item.product_id, "Product gone; stock not restored"),
        }
    }

    let now = Utc::now();
    let mut active: order::ActiveModel = current.into();
    active.status = Set(OrderStatus::Cancelled);
    active.updated_at = Set(now);
    let cancelled = active.update(&txn).await?;
    append_history(
        &txn,
        order_id,
        OrderStatus::Cancelled,
        Some("Cancelled by customer".to_string()),
        &format!("user:{user_id}"),
        now,
    )
    .await?;

    txn.commit().await?;
    info!(order_id, user_id, "Order cancelled");
    Ok(cancelled)
}

/// Sets the payment state. Fulfilment status is left alone.
pub async fn update_payment_status(
    db: &DatabaseConnection,
    order_id: i64,
    payment_status: PaymentStatus,
) -> Result<order::Model> {
    let current = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    let mut active: order::ActiveModel = current.into();
    active.payment_status = Set(payment_status);
    active.updated_at = Set(Utc::now());
    let updated = active.update(db).await?;
    info!(order_id, ?payment_status, "Payment status updated");
    Ok(updated)
}

/// Status log of an order, oldest first.
pub async fn status_history(
    db: &DatabaseConnection,
    order_id: i64,
) -> Result<Vec<order_status_history::Model>> {
    OrderStatusHistory::find()
        .filter(order_status_history::Column::OrderId.eq(order_id))
        .order_by_asc(order_status_history::Column::CreatedAt)
        .order_by_asc(order_status_history::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

async fn load_details(db: &DatabaseConnection, order: order::Model) -> Result<OrderDetails> {
    let items = OrderItem::find()
        .filter(order_item::Column::OrderId.eq(order.id))
        .order_by_asc(order_item::Column::Id)
        .all(db)
        .await?;
    let status_history = status_history(db, order.id).await?;
    Ok(OrderDetails {
        order,
        items,
        status_history,
    })
}

/// Any order with its items and log.
pub async fn get_order(db: &DatabaseConnection, order_id: i64) -> Result<OrderDetails> {
    let found = Order::find_by_id(order_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Order", order_id))?;
    load_details(db, found).await
}

/// One of the requester's orders; Forbidden for anyone else's.
pub async fn get_order_for_user(db: &DatabaseConnection, user_id: i64, order_id: i64) -> Result<OrderDetails> {
    let details = get_order(db, order_id).await?;
    if details.order.user_id != user_id {
        return Err(Error::Forbidden {
            message: "order belongs to another user".to_string(),
        });
    }
    Ok(details)
}

/// The user's orders, newest first.
pub async fn list_orders_for_user(db: &DatabaseConnection, user_id: i64) -> Result<Vec<order::Model>> {
    Order::find()
        .filter(order::Column::UserId.eq(user_id))
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// All orders, optionally in one status, newest first.
pub async fn list_orders(db: &DatabaseConnection, status: Option<OrderStatus>) -> Result<Vec<order::Model>> {
    let mut query = Order::find();
    if let Some(status) = status {
        query = query.filter(order::Column::Status.eq(status));
    }
    query
        .order_by_desc(order::Column::CreatedAt)
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::float_cmp)]
    use super::*;
    use crate::{
        core::{address::create_address, product::get_product},
        entities::{product, user::CustomerType},
        test_utils::*,
    };
    use chrono::TimeZone;

    fn new_order(address_id: i64, lines: &[(i64, i32)]) -> NewOrder {
        NewOrder {
            items: lines
                .iter()
                .map(|&(product_id, quantity)| OrderLine { product_id, quantity })
                .collect(),
            shipping_address_id: address_id,
            payment_method: PaymentMethod::Cod,
            notes: None,
            shipping_price: None,
            tax_price: 0.0,
            discount: 0.0,
        }
    }

    #[test]
    fn test_order_number_format() {
        let date = Utc.with_ymd_and_hms(2024, 3, 7, 12, 0, 0).unwrap();
        assert_eq!(format_order_number("DD", date, 42), "DD-20240307-0042");
        assert_eq!(format_order_number("DD", date, 9999), "DD-20240307-9999");
    }

    #[tokio::test]
    async fn test_unlicensed_tier_pricing() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Uma", "uma@example.com").await?;
        assert_eq!(buyer.customer_type, CustomerType::Unlicensed);
        let product = create_test_product(&db, "Ibuprofen", 50.0, 60.0, 20).await?;
        let addr = create_address(&db, buyer.id, test_address_input(true)).await?;

        let placed = create_order(
            &db,
            &OrderConfig::default(),
            buyer.id,
            new_order(addr.id, &[(product.id, 2)]),
        )
        .await?;

        assert_eq!(placed.items_price, 120.0);
        assert_eq!(placed.shipping_price, 40.0);
        assert_eq!(placed.total_price, 160.0);
        assert_eq!(placed.status, OrderStatus::Processing);
        assert!(placed.order_number.starts_with("DD-"));

        let details = get_order_for_user(&db, buyer.id, placed.id).await?;
        assert_eq!(details.items.len(), 1);
        assert_eq!(details.items[0].price * f64::from(details.items[0].quantity), 120.0);
        assert_eq!(details.status_history.len(), 1);
        assert_eq!(get_product(&db, product.id).await?.stock, 18);
        Ok(())
    }

    #[tokio::test]
    async fn test_licensee_pays_sale_price() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Lalit", "lalit@example.com").await?;
        crate::core::user::set_customer_type(&db, buyer.id, CustomerType::Licensee).await?;
        let product = create_test_product(&db, "Insulin", 50.0, 60.0, 20).await?;
        let mut sale: product::ActiveModel = product.clone().into();
        sale.sale_licensed_price = Set(Some(45.0));
        sale.update(&db).await?;
        let addr = create_address(&db, buyer.id, test_address_input(true)).await?;

        let mut request = new_order(addr.id, &[(product.id, 3)]);
        request.shipping_price = Some(0.0);
        let placed = create_order(&db, &OrderConfig::default(), buyer.id, request).await?;
        assert_eq!(placed.items_price, 135.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_total_invariant() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Tara", "tara@example.com").await?;
        let a = create_test_product(&db, "Syrup", 33.33, 41.17, 50).await?;
        let b = create_test_product(&db, "Drops", 10.0, 12.49, 50).await?;
        let addr = create_address(&db, buyer.id, test_address_input(true)).await?;

        let mut request = new_order(addr.id, &[(a.id, 3), (b.id, 1)]);
        request.tax_price = 7.5;
        request.discount = 12.25;
        request.shipping_price = Some(25.0);
        let placed = create_order(&db, &OrderConfig::default(), buyer.id, request).await?;

        let expected = pricing::round_currency(
            placed.items_price + placed.shipping_price + placed.tax_price - placed.discount,
        );
        assert_eq!(placed.total_price, expected);
        assert_eq!(placed.items_price, 136.0);
        Ok(())
    }

    #[tokio::test]
    async fn test_line_errors() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Vik", "vik@example.com").await?;
        let product = create_test_product(&db, "Zinc", 5.0, 6.0, 2).await?;
        let addr = create_address(&db, buyer.id, test_address_input(true)).await?;
        let config = OrderConfig::default();

        let missing = create_order(&db, &config, buyer.id, new_order(addr.id, &[(999, 1)])).await;
        assert!(matches!(missing, Err(Error::NotFound { entity: "Product", .. })));

        let zero = create_order(&db, &config, buyer.id, new_order(addr.id, &[(product.id, 0)])).await;
        assert!(matches!(zero, Err(Error::InvalidQuantity { quantity: 0, .. })));

        let short = create_order(&db, &config, buyer.id, new_order(addr.id, &[(product.id, 3)])).await;
        assert!(matches!(
            short,
            Err(Error::InsufficientStock { available: 2, requested: 3, .. })
        ));

        // The same product twice still cannot exceed stock.
        let split = create_order(
            &db,
            &config,
            buyer.id,
            new_order(addr.id, &[(product.id, 2), (product.id, 1)]),
        )
        .await;
        assert!(matches!(split, Err(Error::InsufficientStock { .. })));

        assert_eq!(get_product(&db, product.id).await?.stock, 2);
        assert!(list_orders_for_user(&db, buyer.id).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_foreign_address_forbidden() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Wasim", "wasim@example.com").await?;
        let other = create_test_user(&db, "Xena", "xena@example.com").await?;
        let product = create_test_product(&db, "Cream", 5.0, 6.0, 10).await?;
        let foreign = create_address(&db, other.id, test_address_input(true)).await?;

        let result = create_order(
            &db,
            &OrderConfig::default(),
            buyer.id,
            new_order(foreign.id, &[(product.id, 1)]),
        )
        .await;
        assert!(matches!(result, Err(Error::Forbidden { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_restores_stock() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Yash", "yash@example.com").await?;
        let product = create_test_product(&db, "Antacid", 5.0, 6.0, 10).await?;
        let placed = place_test_order(&db, &buyer, product.id, 4).await?;
        assert_eq!(get_product(&db, product.id).await?.stock, 6);

        let cancelled = cancel_order(&db, placed.id, buyer.id).await?;
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(get_product(&db, product.id).await?.stock, 10);

        let history = status_history(&db, placed.id).await?;
        let statuses: Vec<_> = history.iter().map(|h| h.status).collect();
        assert_eq!(statuses, vec![OrderStatus::Processing, OrderStatus::Cancelled]);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_overflow_rolls_back() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Chetan", "chetan@example.com").await?;
        let plain = create_test_product(&db, "Lozenge", 5.0, 6.0, 10).await?;
        let full = create_test_product(&db, "Saline", 5.0, 6.0, 10).await?;
        let addr = create_address(&db, buyer.id, test_address_input(true)).await?;
        let placed = create_order(
            &db,
            &OrderConfig::default(),
            buyer.id,
            new_order(addr.id, &[(plain.id, 3), (full.id, 5)]),
        )
        .await?;
        crate::core::product::adjust_stock(&db, full.id, i32::MAX - 5).await?;

        let result = cancel_order(&db, placed.id, buyer.id).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));

        // Nothing from the failed cancel is kept
        assert_eq!(get_product(&db, plain.id).await?.stock, 7);
        assert_eq!(get_product(&db, full.id).await?.stock, i32::MAX);
        let details = get_order(&db, placed.id).await?;
        assert_eq!(details.order.status, OrderStatus::Processing);
        assert_eq!(details.status_history.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_rejected_outside_processing() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Zara", "zara@example.com").await?;
        let product = create_test_product(&db, "Balm", 5.0, 6.0, 10).await?;
        let placed = place_test_order(&db, &buyer, product.id, 2).await?;
        update_status(&db, placed.id, OrderStatus::Shipped, None, "admin:1").await?;

        let result = cancel_order(&db, placed.id, buyer.id).await;
        assert!(matches!(result, Err(Error::InvalidState { .. })));

        let details = get_order(&db, placed.id).await?;
        assert_eq!(details.order.status, OrderStatus::Shipped);
        assert_eq!(details.status_history.len(), 2);
        assert_eq!(get_product(&db, product.id).await?.stock, 8);
        Ok(())
    }

    #[tokio::test]
    async fn test_cancel_requires_owner() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Amit", "amit@example.com").await?;
        let other = create_test_user(&db, "Bela", "bela@example.com").await?;
        let product = create_test_product(&db, "Gel", 5.0, 6.0, 10).await?;
        let placed = place_test_order(&db, &buyer, product.id, 1).await?;

        assert!(matches!(
            cancel_order(&db, placed.id, other.id).await,
            Err(Error::Forbidden { .. })
        ));
        assert!(matches!(
            get_order_for_user(&db, other.id, placed.id).await,
            Err(Error::Forbidden { .. })
        ));
        Ok(())
    }

    #[tokio::test]
    async fn test_delivery_stamps_and_filters() -> Result<()> {
        let db = setup_test_db().await?;
        let buyer = create_test_user(&db, "Chirag", "chirag@example.com").await?;
        let product = create_test_product(&db, "Spray", 5.0, 6.0, 10).await?;
        let first = place_test_order(&db, &buyer, product.id, 1).await?;
        place_test_order(&db, &buyer, product.id, 1).await?;

        let delivered = update_status(
            &db,
            first.id,
            OrderStatus::Delivered,
            Some("Left at door".to_string()),
            "admin:1",
        )
        .await?;
        assert!(delivered.delivered_at.is_some());

        let paid = update_payment_status(&db, first.id, PaymentStatus::Paid).await?;
        assert_eq!(paid.payment_status, PaymentStatus::Paid);
        assert_eq!(paid.status, OrderStatus::Delivered);

        assert_eq!(list_orders(&db, Some(OrderStatus::Delivered)).await?.len(), 1);
        assert_eq!(list_orders(&db, Some(OrderStatus::Processing)).await?.len(), 1);
        assert_eq!(list_orders(&db, None).await?.len(), 2);

        let last = status_history(&db, first.id).await?.pop().unwrap();
        assert_eq!(last.actor.as_deref(), Some("admin:1"));
        assert_eq!(last.note.as_deref(), Some("Left at door"));
        Ok(())
    }
}
