//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::instrument;

use shopdesk_core::ProductId;

use super::{parse_id, required_id};
use crate::db::products::ProductFilter;
use crate::error::{ApiJson, Result};
use crate::middleware::RequireAdmin;
use crate::models::Product;
use crate::services::catalog::{CatalogService, ProductInput};
use crate::state::AppState;

const PRODUCT_ID_REQUIRED: &str = "Product ID is required";
const PRODUCT_NOT_FOUND: &str = "Product not found";

/// A product as sent to clients, with its first image pulled out.
#[derive(Debug, Serialize)]
pub struct ProductView<'a> {
    #[serde(flatten)]
    product: &'a Product,
    image: &'a str,
}

impl<'a> From<&'a Product> for ProductView<'a> {
    fn from(product: &'a Product) -> Self {
        Self {
            product,
            image: product.primary_image(),
        }
    }
}

/// Listing filters from the query string.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(rename = "_type")]
    pub product_type: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub offer: Option<String>,
    #[serde(rename = "isAvailable")]
    pub is_available: Option<String>,
}

impl ListQuery {
    fn into_filter(self) -> ProductFilter {
        let text = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());
        ProductFilter {
            product_type: text(self.product_type),
            brand: text(self.brand),
            category: text(self.category),
            offer_only: self.offer.as_deref() == Some("true"),
            include_unavailable: self.is_available.as_deref() == Some("false"),
        }
    }
}

/// Query of `GET /api/product/single`.
#[derive(Debug, Default, Deserialize)]
pub struct SingleQuery {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

/// Body of `POST /api/product/remove`.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

fn listing(products: &[Product]) -> Json<Value> {
    let views: Vec<ProductView<'_>> = products.iter().map(ProductView::from).collect();
    Json(json!({ "success": true, "total": views.len(), "products": views }))
}

/// Create a product.
///
/// POST /api/product/add
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let product = CatalogService::new(state.pool()).add_product(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Product added successfully",
            "product": ProductView::from(&product),
        })),
    ))
}

/// Edit a product.
///
/// PUT /api/product/update/{product_id}
#[instrument(skip(state, admin, input), fields(admin_id = %admin.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(product_id): Path<String>,
    ApiJson(input): ApiJson<ProductInput>,
) -> Result<Json<Value>> {
    let product_id: ProductId = parse_id(&product_id, PRODUCT_NOT_FOUND)?;
    let product = CatalogService::new(state.pool())
        .update_product(product_id, input)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("{} updated successfully", product.name),
        "product": ProductView::from(&product),
    })))
}

/// Delete a product.
///
/// POST /api/product/remove
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<RemoveRequest>,
) -> Result<Json<Value>> {
    let product_id: ProductId =
        required_id(request.id.as_deref(), PRODUCT_ID_REQUIRED, PRODUCT_NOT_FOUND)?;
    CatalogService::new(state.pool()).remove_product(product_id).await?;
    Ok(Json(json!({ "success": true, "message": "Product removed successfully" })))
}

/// One product.
///
/// GET /api/product/single?_id=
#[instrument(skip(state))]
pub async fn single(
    State(state): State<AppState>,
    Query(query): Query<SingleQuery>,
) -> Result<Json<Value>> {
    let product_id: ProductId =
        required_id(query.id.as_deref(), PRODUCT_ID_REQUIRED, PRODUCT_NOT_FOUND)?;
    let product = CatalogService::new(state.pool()).product(product_id).await?;
    Ok(Json(json!({ "success": true, "product": ProductView::from(&product) })))
}

/// Filtered product listing.
///
/// GET /api/product/list, GET /api/products
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let products = CatalogService::new(state.pool())
        .products(&query.into_filter())
        .await?;
    Ok(listing(&products))
}

/// Product listing for one product type.
///
/// GET /api/products/{product_type}
#[instrument(skip(state))]
pub async fn list_by_type(
    State(state): State<AppState>,
    Path(product_type): Path<String>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Value>> {
    let mut filter = query.into_filter();
    filter.product_type = Some(product_type);
    let products = CatalogService::new(state.pool()).products(&filter).await?;
    Ok(listing(&products))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_query_flags() {
        let query: ListQuery =
            serde_json::from_value(json!({ "offer": "true", "isAvailable": "false", "brand": " " }))
                .unwrap();
        let filter = query.into_filter();
        assert!(filter.offer_only);
        assert!(filter.include_unavailable);
        assert!(filter.brand.is_none());
    }

    #[test]
    fn test_list_query_defaults_to_available_only() {
        let filter = ListQuery::default().into_filter();
        assert!(!filter.include_unavailable);
        assert!(!filter.offer_only);
    }
}
