//! Contact message route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use shopdesk_core::ContactId;

use super::parse_id;
use crate::error::{ApiJson, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::services::contacts::{ContactForm, ContactService, StatusUpdate};
use crate::state::AppState;

const CONTACT_NOT_FOUND: &str = "Contact message not found";

/// Query of `GET /api/contact/admin/all`.
#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    pub status: Option<String>,
}

/// POST /api/contact
#[instrument(skip(state, user, form), fields(user_id = %user.id))]
pub async fn submit(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(form): ApiJson<ContactForm>,
) -> Result<(StatusCode, Json<Value>)> {
    let contact = ContactService::new(state.pool()).submit(user.id, form).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Your message has been sent successfully! We'll get back to you soon.",
            "data": contact,
        })),
    ))
}

/// GET /api/contact/my-contacts
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn mine(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    let contacts = ContactService::new(state.pool()).for_user(user.id).await?;
    Ok(Json(json!({ "success": true, "data": contacts })))
}

/// GET /api/contact/admin/all?status=
#[instrument(skip(state, _admin))]
pub async fn inbox(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<InboxQuery>,
) -> Result<Json<Value>> {
    let inbox = ContactService::new(state.pool())
        .inbox(query.status.as_deref())
        .await?;
    Ok(Json(json!({
        "success": true,
        "data": inbox.data,
        "counts": inbox.counts,
    })))
}

/// GET /api/contact/admin/{id}
#[instrument(skip(state, _admin))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: ContactId = parse_id(&id, CONTACT_NOT_FOUND)?;
    let contact = ContactService::new(state.pool()).get(id).await?;
    Ok(Json(json!({ "success": true, "data": contact })))
}

/// DELETE /api/contact/admin/{id}
#[instrument(skip(state, admin), fields(admin_id = %admin.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let id: ContactId = parse_id(&id, CONTACT_NOT_FOUND)?;
    ContactService::new(state.pool()).delete(id).await?;
    Ok(Json(json!({ "success": true, "message": "Contact message deleted successfully" })))
}

/// PUT /api/contact/admin/{id}/status
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn set_status(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
    ApiJson(update): ApiJson<StatusUpdate>,
) -> Result<Json<Value>> {
    let id: ContactId = parse_id(&id, CONTACT_NOT_FOUND)?;
    let contact = ContactService::new(state.pool()).set_status(id, update).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Contact status updated successfully",
        "data": contact,
    })))
}
