//! Admin dashboard route handlers.

use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::services::dashboard::{DashboardService, Period};
use crate::state::AppState;

/// Query of `GET /api/dashboard/analytics`.
#[derive(Debug, Default, Deserialize)]
pub struct AnalyticsQuery {
    pub period: Option<String>,
}

/// GET /api/dashboard/stats
#[instrument(skip(state, _admin))]
pub async fn stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let stats = DashboardService::new(state.pool()).stats().await?;
    Ok(Json(json!({ "success": true, "stats": stats })))
}

/// GET /api/dashboard/analytics?period=
#[instrument(skip(state, _admin))]
pub async fn analytics(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<AnalyticsQuery>,
) -> Result<Json<Value>> {
    let period = Period::parse(query.period.as_deref());
    let analytics = DashboardService::new(state.pool()).analytics(period).await?;
    Ok(Json(json!({ "success": true, "analytics": analytics })))
}

/// GET /api/dashboard/quick-stats
#[instrument(skip(state, _admin))]
pub async fn quick_stats(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Value>> {
    let today = DashboardService::new(state.pool()).quick_stats().await?;
    Ok(Json(json!({
        "success": true,
        "stats": {
            "todaysSales": today.sales,
            "todaysOrders": today.orders,
        },
    })))
}
