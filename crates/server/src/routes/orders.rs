//! Order route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use shopdesk_core::{OrderId, UserId};

use super::{parse_id, required_id};
use crate::error::{ApiJson, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::services::orders::{
    CreateOrderRequest, OrderService, UpdateStatusRequest, validate_status_change,
};
use crate::state::AppState;

const ORDER_NOT_FOUND: &str = "Order not found";

/// Body of `POST /api/order/delete`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOrderRequest {
    #[serde(alias = "_id")]
    pub order_id: Option<String>,
}

/// Place an order for the caller.
///
/// POST /api/order/create
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(request): ApiJson<CreateOrderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    let order = OrderService::new(state.pool()).place(user.id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Order created successfully",
            "orderId": order.id,
            "order": order,
        })),
    ))
}

/// The caller's orders, newest first.
///
/// GET /api/order/my-orders
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_orders(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let orders = OrderService::new(state.pool()).for_user(user.id).await?;
    Ok(Json(json!({ "success": true, "total": orders.len(), "orders": orders })))
}

/// One of the caller's orders.
///
/// GET /api/order/user/{order_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn my_order(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(order_id): Path<String>,
) -> Result<Json<Value>> {
    let order_id: OrderId = parse_id(&order_id, ORDER_NOT_FOUND)?;
    let order = OrderService::new(state.pool())
        .get_for_user(user.id, order_id)
        .await?;
    Ok(Json(json!({ "success": true, "order": order })))
}

/// A given user's orders.
///
/// GET /api/order/admin/user/{user_id}
#[instrument(skip(state, _admin))]
pub async fn user_orders(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, "User not found")?;
    let orders = OrderService::new(state.pool()).for_user(user_id).await?;
    Ok(Json(json!({ "success": true, "total": orders.len(), "orders": orders })))
}

/// Every order with its owner.
///
/// GET /api/order/list
#[instrument(skip(state, _admin))]
pub async fn list(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let orders = OrderService::new(state.pool()).all().await?;
    Ok(Json(json!({ "success": true, "total": orders.len(), "orders": orders })))
}

/// Order counters, recent orders and monthly totals.
///
/// GET /api/order/stats
#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let stats = OrderService::new(state.pool()).stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// Change an order's status and optionally its payment status.
///
/// POST /api/order/update-status
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let change = validate_status_change(request)?;
    let order = OrderService::new(state.pool()).change_status(change).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Order updated successfully",
        "order": order,
    })))
}

/// Delete an order.
///
/// POST /api/order/delete
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<DeleteOrderRequest>,
) -> Result<Json<Value>> {
    let order_id: OrderId = required_id(
        request.order_id.as_deref(),
        "Order ID is required",
        ORDER_NOT_FOUND,
    )?;
    OrderService::new(state.pool()).delete(order_id).await?;
    Ok(Json(json!({ "success": true, "message": "Order deleted successfully" })))
}
