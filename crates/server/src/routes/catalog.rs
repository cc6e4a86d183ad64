//! Category and brand route handlers. Reads are public; writes need an admin.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde_json::{Value, json};
use tracing::instrument;

use shopdesk_core::{BrandId, CategoryId};

use super::parse_id;
use crate::error::{ApiJson, Result};
use crate::middleware::RequireAdmin;
use crate::services::catalog::{CatalogService, TaxonomyInput};
use crate::state::AppState;

const CATEGORY_NOT_FOUND: &str = "Category not found";
const BRAND_NOT_FOUND: &str = "Brand not found";

// =============================================================================
// Categories
// =============================================================================

/// GET /api/category
#[instrument(skip(state))]
pub async fn list_categories(State(state): State<AppState>) -> Result<Json<Value>> {
    let categories = CatalogService::new(state.pool()).categories().await?;
    Ok(Json(json!({ "success": true, "categories": categories })))
}

/// GET /api/category/{id}
#[instrument(skip(state))]
pub async fn get_category(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: CategoryId = parse_id(&id, CATEGORY_NOT_FOUND)?;
    let category = CatalogService::new(state.pool()).category(id).await?;
    Ok(Json(json!({ "success": true, "category": category })))
}

/// POST /api/category
#[instrument(skip(state, _admin, input))]
pub async fn create_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<TaxonomyInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let category = CatalogService::new(state.pool()).add_category(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Category created successfully",
            "category": category,
        })),
    ))
}

/// PUT /api/category/{id}
#[instrument(skip(state, _admin, input))]
pub async fn update_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TaxonomyInput>,
) -> Result<Json<Value>> {
    let id: CategoryId = parse_id(&id, CATEGORY_NOT_FOUND)?;
    let category = CatalogService::new(state.pool())
        .update_category(id, input)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Category updated successfully",
        "category": category,
    })))
}

/// DELETE /api/category/{id}
#[instrument(skip(state, _admin))]
pub async fn delete_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: CategoryId = parse_id(&id, CATEGORY_NOT_FOUND)?;
    CatalogService::new(state.pool()).remove_category(id).await?;
    Ok(Json(json!({ "success": true, "message": "Category deleted successfully" })))
}

// =============================================================================
// Brands
// =============================================================================

/// GET /api/brand
#[instrument(skip(state))]
pub async fn list_brands(State(state): State<AppState>) -> Result<Json<Value>> {
    let brands = CatalogService::new(state.pool()).brands().await?;
    Ok(Json(json!({ "success": true, "brands": brands })))
}

/// GET /api/brand/{id}
#[instrument(skip(state))]
pub async fn get_brand(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: BrandId = parse_id(&id, BRAND_NOT_FOUND)?;
    let brand = CatalogService::new(state.pool()).brand(id).await?;
    Ok(Json(json!({ "success": true, "brand": brand })))
}

/// POST /api/brand
#[instrument(skip(state, _admin, input))]
pub async fn create_brand(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    ApiJson(input): ApiJson<TaxonomyInput>,
) -> Result<(StatusCode, Json<Value>)> {
    let brand = CatalogService::new(state.pool()).add_brand(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Brand created successfully",
            "brand": brand,
        })),
    ))
}

/// PUT /api/brand/{id}
#[instrument(skip(state, _admin, input))]
pub async fn update_brand(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
    ApiJson(input): ApiJson<TaxonomyInput>,
) -> Result<Json<Value>> {
    let id: BrandId = parse_id(&id, BRAND_NOT_FOUND)?;
    let brand = CatalogService::new(state.pool()).update_brand(id, input).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Brand updated successfully",
        "brand": brand,
    })))
}

/// DELETE /api/brand/{id}
#[instrument(skip(state, _admin))]
pub async fn delete_brand(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: BrandId = parse_id(&id, BRAND_NOT_FOUND)?;
    CatalogService::new(state.pool()).remove_brand(id).await?;
    Ok(Json(json!({ "success": true, "message": "Brand deleted successfully" })))
}
