//! Account route handlers: sign-in, profile, cart, address book and user
//! administration.
//!
//! Address-book handlers come in pairs. The plain form works on the caller's
//! own book; the `admin_` form works on the book of the user named in the path.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;

use shopdesk_core::{AddressId, UserId};

use super::{parse_id, required_id};
use crate::error::{ApiJson, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::AddressInput;
use crate::services::accounts::{AccountService, AdminUserUpdate, CartLine, ProfileUpdate};
use crate::services::auth::AuthService;
use crate::state::AppState;

const USER_NOT_FOUND: &str = "User not found";
const ADDRESS_NOT_FOUND: &str = "Address not found";

/// Body of the sign-up and sign-in endpoints.
#[derive(Debug, Default, Deserialize)]
pub struct Credentials {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Query of `GET /api/user/users`.
#[derive(Debug, Default, Deserialize)]
pub struct RoleQuery {
    pub role: Option<String>,
}

/// Body of `POST /api/user/remove`.
#[derive(Debug, Default, Deserialize)]
pub struct RemoveUserRequest {
    #[serde(rename = "_id")]
    pub id: Option<String>,
}

// =============================================================================
// Sign-in
// =============================================================================

/// Create a customer account and return a session for it.
///
/// POST /api/user/register
#[instrument(skip(state, credentials), fields(email = %credentials.email))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<Value>> {
    let session = AuthService::new(state.pool(), state.tokens())
        .register(&credentials.name, &credentials.email, &credentials.password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "User registered successfully!",
        "token": session.token,
        "user": session.user,
    })))
}

/// POST /api/user/login
#[instrument(skip(state, credentials), fields(email = %credentials.email))]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<Value>> {
    let session = AuthService::new(state.pool(), state.tokens())
        .login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "User logged in successfully",
        "token": session.token,
        "user": session.user,
    })))
}

/// POST /api/user/admin
#[instrument(skip(state, credentials), fields(email = %credentials.email))]
pub async fn admin_login(
    State(state): State<AppState>,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<Json<Value>> {
    let session = AuthService::new(state.pool(), state.tokens())
        .admin_login(&credentials.email, &credentials.password)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Welcome admin",
        "token": session.token,
        "user": session.user,
    })))
}

// =============================================================================
// Profile
// =============================================================================

/// GET /api/user/profile
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn profile(RequireUser(user): RequireUser) -> Json<Value> {
    Json(json!({ "success": true, "user": user }))
}

/// PUT /api/user/profile
#[instrument(skip(state, user, update), fields(user_id = %user.id))]
pub async fn update_profile(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(update): ApiJson<ProfileUpdate>,
) -> Result<Json<Value>> {
    let user = AccountService::new(state.pool())
        .update_profile(user.id, update)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Profile updated successfully",
        "user": user,
    })))
}

// =============================================================================
// Cart
// =============================================================================

/// GET /api/user/cart
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn cart(RequireUser(user): RequireUser) -> Json<Value> {
    Json(json!({ "success": true, "cartData": user.cart }))
}

/// POST /api/user/cart/add
#[instrument(skip(state, user, line), fields(user_id = %user.id))]
pub async fn add_to_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(line): ApiJson<CartLine>,
) -> Result<Json<Value>> {
    let cart = AccountService::new(state.pool())
        .add_to_cart(user.id, line)
        .await?;
    Ok(Json(json!({ "success": true, "message": "Item added to cart", "cartData": cart })))
}

/// PUT /api/user/cart/update
#[instrument(skip(state, user, line), fields(user_id = %user.id))]
pub async fn update_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(line): ApiJson<CartLine>,
) -> Result<Json<Value>> {
    let cart = AccountService::new(state.pool())
        .update_cart(user.id, line)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Cart updated successfully",
        "cartData": cart,
    })))
}

/// DELETE /api/user/cart/clear
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn clear_cart(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<Json<Value>> {
    AccountService::new(state.pool()).clear_cart(user.id).await?;
    Ok(Json(json!({ "success": true, "message": "Cart cleared successfully" })))
}

// =============================================================================
// Address book
// =============================================================================

async fn add_address_for(state: &AppState, user_id: UserId, input: AddressInput) -> Result<Json<Value>> {
    let (address, book) = AccountService::new(state.pool())
        .add_address(user_id, input)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Address added successfully",
        "address": address,
        "addresses": book,
    })))
}

async fn update_address_for(
    state: &AppState,
    user_id: UserId,
    address_id: &str,
    input: AddressInput,
) -> Result<Json<Value>> {
    let address_id: AddressId = parse_id(address_id, ADDRESS_NOT_FOUND)?;
    let (address, book) = AccountService::new(state.pool())
        .update_address(user_id, address_id, input)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Address updated successfully",
        "address": address,
        "addresses": book,
    })))
}

async fn delete_address_for(state: &AppState, user_id: UserId, address_id: &str) -> Result<Json<Value>> {
    let address_id: AddressId = parse_id(address_id, ADDRESS_NOT_FOUND)?;
    let book = AccountService::new(state.pool())
        .remove_address(user_id, address_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Address deleted successfully",
        "addresses": book,
    })))
}

async fn set_default_for(state: &AppState, user_id: UserId, address_id: &str) -> Result<Json<Value>> {
    let address_id: AddressId = parse_id(address_id, ADDRESS_NOT_FOUND)?;
    let book = AccountService::new(state.pool())
        .set_default_address(user_id, address_id)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Default address updated successfully",
        "addresses": book,
    })))
}

/// GET /api/user/addresses
#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn addresses(RequireUser(user): RequireUser) -> Json<Value> {
    Json(json!({ "success": true, "addresses": user.addresses }))
}

/// POST /api/user/addresses
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn add_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Json<Value>> {
    add_address_for(&state, user.id, input).await
}

/// PUT /api/user/addresses/{address_id}
#[instrument(skip(state, user, input), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(address_id): Path<String>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Json<Value>> {
    update_address_for(&state, user.id, &address_id, input).await
}

/// DELETE /api/user/addresses/{address_id}
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(address_id): Path<String>,
) -> Result<Json<Value>> {
    delete_address_for(&state, user.id, &address_id).await
}

/// PUT /api/user/addresses/{address_id}/default
#[instrument(skip(state, user), fields(user_id = %user.id))]
pub async fn set_default_address(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Path(address_id): Path<String>,
) -> Result<Json<Value>> {
    set_default_for(&state, user.id, &address_id).await
}

/// GET /api/user/{user_id}/addresses
#[instrument(skip(state, _admin))]
pub async fn admin_addresses(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<String>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, USER_NOT_FOUND)?;
    let user = AccountService::new(state.pool()).get(user_id).await?;
    Ok(Json(json!({ "success": true, "addresses": user.addresses })))
}

/// POST /api/user/{user_id}/addresses
#[instrument(skip(state, _admin, input))]
pub async fn admin_add_address(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(user_id): Path<String>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, USER_NOT_FOUND)?;
    add_address_for(&state, user_id, input).await
}

/// PUT /api/user/{user_id}/addresses/{address_id}
#[instrument(skip(state, _admin, input))]
pub async fn admin_update_address(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((user_id, address_id)): Path<(String, String)>,
    ApiJson(input): ApiJson<AddressInput>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, USER_NOT_FOUND)?;
    update_address_for(&state, user_id, &address_id, input).await
}

/// DELETE /api/user/{user_id}/addresses/{address_id}
#[instrument(skip(state, _admin))]
pub async fn admin_delete_address(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((user_id, address_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, USER_NOT_FOUND)?;
    delete_address_for(&state, user_id, &address_id).await
}

/// PUT /api/user/{user_id}/addresses/{address_id}/default
#[instrument(skip(state, _admin))]
pub async fn admin_set_default_address(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path((user_id, address_id)): Path<(String, String)>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, USER_NOT_FOUND)?;
    set_default_for(&state, user_id, &address_id).await
}

// =============================================================================
// Administration
// =============================================================================

/// GET /api/user/users?role=
#[instrument(skip(state, _admin))]
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(query): Query<RoleQuery>,
) -> Result<Json<Value>> {
    let users = AccountService::new(state.pool())
        .list(query.role.as_deref())
        .await?;
    Ok(Json(json!({ "success": true, "total": users.len(), "users": users })))
}

/// POST /api/user/remove
#[instrument(skip(state, admin, request), fields(admin_id = %admin.id))]
pub async fn remove_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(request): ApiJson<RemoveUserRequest>,
) -> Result<Json<Value>> {
    let user_id: UserId = required_id(request.id.as_deref(), "User ID is required", USER_NOT_FOUND)?;
    AccountService::new(state.pool()).remove(user_id).await?;
    Ok(Json(json!({ "success": true, "message": "User deleted successfully" })))
}

/// PUT /api/user/update/{user_id}
#[instrument(skip(state, admin, update), fields(admin_id = %admin.id))]
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(user_id): Path<String>,
    ApiJson(update): ApiJson<AdminUserUpdate>,
) -> Result<Json<Value>> {
    let user_id: UserId = parse_id(&user_id, USER_NOT_FOUND)?;
    let user = AccountService::new(state.pool())
        .admin_update(user_id, update)
        .await?;
    Ok(Json(json!({
        "success": true,
        "message": "User updated successfully",
        "user": user,
    })))
}

/// POST /api/user/create-admin
#[instrument(skip(state, admin, credentials), fields(admin_id = %admin.id))]
pub async fn create_admin(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    ApiJson(credentials): ApiJson<Credentials>,
) -> Result<(StatusCode, Json<Value>)> {
    let user = AccountService::new(state.pool())
        .create_admin(
            state.tokens(),
            &credentials.name,
            &credentials.email,
            &credentials.password,
        )
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "Admin created successfully!",
            "user": user,
        })),
    ))
}
