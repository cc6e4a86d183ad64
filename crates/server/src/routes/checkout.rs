//! Stock route handlers: cart checkout and single-product sales.

use axum::{Json, extract::State};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::{ApiJson, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::services::stock::{CheckoutLine, StockService};
use crate::state::AppState;

/// Body of `POST /api/checkout`.
#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub items: Vec<CheckoutLine>,
}

/// Body of `POST /api/product/update-stock`.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStockRequest {
    #[serde(alias = "_id")]
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Reserve stock for every line of a cart, or for none of them.
///
/// POST /api/checkout
#[instrument(skip(state, user, request), fields(user_id = %user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(request): ApiJson<CheckoutRequest>,
) -> Result<Json<Value>> {
    let outcome = StockService::new(state.pool()).checkout(&request.items).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Checkout processed successfully",
        "updatedProducts": outcome.updated_products,
    })))
}

/// Sell units of one product.
///
/// POST /api/product/update-stock
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn update_stock(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<UpdateStockRequest>,
) -> Result<Json<Value>> {
    let snapshot = StockService::new(state.pool())
        .sell(request.product_id.as_deref(), request.quantity)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Stock updated successfully",
        "product": {
            "_id": snapshot.id,
            "stock": snapshot.stock,
            "soldQuantity": snapshot.sold_quantity,
            "isAvailable": snapshot.is_available,
        },
    })))
}
