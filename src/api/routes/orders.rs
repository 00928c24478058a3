//! Order routes for customers and the back office.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::warn;

use crate::{
    api::{
        extract::{AuthAdmin, AuthUser},
        response::{ApiResult, ok},
        state::AppState,
    },
    core::{
        admin::PermissionSet,
        notification::{self, PushMessage},
        order::{self, NewOrder, OrderDetails},
    },
    entities::{
        OrderModel,
        order::{OrderStatus, PaymentStatus},
        order_status_history,
    },
};

/// POST /api/user/orders
pub async fn create(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Json(body): Json<NewOrder>,
) -> ApiResult<OrderModel> {
    ok(order::create_order(state.db(), &state.config().orders, me.id, body).await?)
}

/// GET /api/user/orders
pub async fn list_mine(State(state): State<AppState>, AuthUser(me): AuthUser) -> ApiResult<Vec<OrderModel>> {
    ok(order::list_orders_for_user(state.db(), me.id).await?)
}

/// GET /api/user/orders/{id}
pub async fn get_mine(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetails> {
    ok(order::get_order_for_user(state.db(), me.id, id).await?)
}

/// PUT /api/user/orders/{id}
///
/// The only customer-side change to an order is cancellation.
pub async fn cancel_mine(
    State(state): State<AppState>,
    AuthUser(me): AuthUser,
    Path(id): Path<i64>,
) -> ApiResult<OrderModel> {
    ok(order::cancel_order(state.db(), id, me.id).await?)
}

/// Query string of the admin order listing.
#[derive(Debug, Default, Deserialize)]
pub struct OrderQuery {
    /// Only orders in this status
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

/// GET /api/admin/orders
pub async fn admin_list(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Query(query): Query<OrderQuery>,
) -> ApiResult<Vec<OrderModel>> {
    admin.require_any(&[PermissionSet::MANAGE_ORDERS, PermissionSet::UPDATE_DELIVERY])?;
    ok(order::list_orders(state.db(), query.status).await?)
}

/// GET /api/admin/orders/{id}
pub async fn admin_get(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<OrderDetails> {
    admin.require_any(&[PermissionSet::MANAGE_ORDERS, PermissionSet::UPDATE_DELIVERY])?;
    ok(order::get_order(state.db(), id).await?)
}

/// GET /api/admin/orders/{id}/history
pub async fn admin_history(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
) -> ApiResult<Vec<order_status_history::Model>> {
    admin.require_any(&[PermissionSet::MANAGE_ORDERS, PermissionSet::UPDATE_DELIVERY])?;
    ok(order::status_history(state.db(), id).await?)
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct StatusBody {
    /// New status
    pub status: OrderStatus,
    /// Optional note for the log
    #[serde(default)]
    pub note: Option<String>,
    /// Push the change to the customer's devices
    #[serde(default)]
    pub notify: bool,
}

/// PUT /api/admin/orders/{id}/status
pub async fn admin_update_status(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<StatusBody>,
) -> ApiResult<OrderModel> {
    admin.require_any(&[PermissionSet::MANAGE_ORDERS, PermissionSet::UPDATE_DELIVERY])?;
    let actor = format!("admin:{}", admin.0.id);
    let updated = order::update_status(state.db(), id, body.status, body.note, &actor).await?;

    if body.notify {
        let message = PushMessage {
            title: format!("Order {}", updated.order_number),
            body: format!("Your order is now {:?}", updated.status),
        };
        // The status change is committed; a failed push must not undo it.
        if let Err(err) =
            notification::send_to_user(state.db(), state.push(), updated.user_id, &message).await
        {
            warn!(order_id = id, error = %err, "Status push failed");
        }
    }
    ok(updated)
}

/// Payment state change request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentBody {
    /// New payment state
    pub payment_status: PaymentStatus,
}

/// PUT /api/admin/orders/{id}/payment
pub async fn admin_update_payment(
    State(state): State<AppState>,
    admin: AuthAdmin,
    Path(id): Path<i64>,
    Json(body): Json<PaymentBody>,
) -> ApiResult<OrderModel> {
    admin.require(PermissionSet::MANAGE_ORDERS)?;
    ok(order::update_payment_status(state.db(), id, body.payment_status).await?)
}
