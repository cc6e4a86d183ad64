//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                               - Liveness
//! GET  /health/ready                         - Readiness (database reachable)
//!
//! # Accounts
//! POST /api/user/register                    - Register and sign in
//! POST /api/user/login                       - Sign in
//! POST /api/user/admin                       - Admin sign in
//! GET  /api/user/profile                     - Caller's profile (user)
//! PUT  /api/user/profile                     - Edit profile (user)
//! GET  /api/user/cart                        - Cart contents (user)
//! POST /api/user/cart/add                    - Add to cart (user)
//! PUT  /api/user/cart/update                 - Set line quantity (user)
//! DELETE /api/user/cart/clear                - Empty cart (user)
//! GET|POST /api/user/addresses               - Address book (user)
//! PUT|DELETE /api/user/addresses/{id}        - Edit/delete address (user)
//! PUT  /api/user/addresses/{id}/default      - Make default (user)
//! ...  /api/user/{user_id}/addresses...      - Same, on another user (admin)
//! GET  /api/user/users                       - List accounts (admin)
//! POST /api/user/remove                      - Delete account (admin)
//! PUT  /api/user/update/{id}                 - Edit account (admin)
//! POST /api/user/create-admin                - Create admin (admin)
//!
//! # Orders
//! POST /api/order/create                     - Place order (user)
//! GET  /api/order/my-orders                  - Caller's orders (user)
//! GET  /api/order/user/{order_id}            - One of caller's orders (user)
//! GET  /api/order/admin/user/{user_id}       - A user's orders (admin)
//! GET  /api/order/list                       - All orders (admin)
//! GET  /api/order/stats                      - Order figures (admin)
//! POST /api/order/update-status              - Change status (admin)
//! POST /api/order/delete                     - Delete order (admin)
//!
//! # Stock and catalog
//! POST /api/checkout                         - Reserve stock for a cart (user)
//! POST /api/product/update-stock             - Sell units of one product (admin)
//! POST /api/product/add                      - Create product (admin)
//! PUT  /api/product/update/{id}              - Edit product (admin)
//! POST /api/product/remove                   - Delete product (admin)
//! GET  /api/product/single?_id=              - One product
//! GET  /api/product/list                     - Filtered listing
//! GET  /api/products, /api/products/{type}   - Filtered listing
//! GET|POST /api/category, /api/brand         - Taxonomy (admin writes)
//! GET|PUT|DELETE /api/category/{id}, /api/brand/{id}
//!
//! # Contact and dashboard
//! POST /api/contact                          - Send a message (user)
//! GET  /api/contact/my-contacts              - Caller's messages (user)
//! GET  /api/contact/admin/all                - Inbox (admin)
//! GET|DELETE /api/contact/admin/{id}         - One message (admin)
//! PUT  /api/contact/admin/{id}/status        - Triage (admin)
//! GET  /api/dashboard/stats|analytics|quick-stats (admin)
//! ```

pub mod accounts;
pub mod catalog;
pub mod checkout;
pub mod contacts;
pub mod dashboard;
pub mod orders;
pub mod products;

use std::str::FromStr;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::error::AppError;
use crate::state::AppState;

/// Parse an ID taken from a path or body.
///
/// A value that cannot be an ID cannot name an existing entity, so it is
/// reported the same way as an unknown one.
///
/// # Errors
///
/// Returns `AppError::NotFound` with `not_found` if `raw` is not a valid ID.
pub fn parse_id<T: FromStr>(raw: &str, not_found: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::NotFound(not_found.to_owned()))
}

/// Parse an ID that the request must supply.
///
/// # Errors
///
/// Returns `AppError::BadRequest` with `missing` when absent or blank, and
/// `AppError::NotFound` with `not_found` when malformed.
pub fn required_id<T: FromStr>(
    raw: Option<&str>,
    missing: &str,
    not_found: &str,
) -> Result<T, AppError> {
    let raw = raw
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .ok_or_else(|| AppError::BadRequest(missing.to_owned()))?;
    parse_id(raw, not_found)
}

/// Create the account routes router.
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(accounts::register))
        .route("/login", post(accounts::login))
        .route("/admin", post(accounts::admin_login))
        .route(
            "/profile",
            get(accounts::profile).put(accounts::update_profile),
        )
        .route("/cart", get(accounts::cart))
        .route("/cart/add", post(accounts::add_to_cart))
        .route("/cart/update", put(accounts::update_cart))
        .route("/cart/clear", delete(accounts::clear_cart))
        .route(
            "/addresses",
            get(accounts::addresses).post(accounts::add_address),
        )
        .route(
            "/addresses/{address_id}",
            put(accounts::update_address).delete(accounts::delete_address),
        )
        .route(
            "/addresses/{address_id}/default",
            put(accounts::set_default_address),
        )
        .route(
            "/{user_id}/addresses",
            get(accounts::admin_addresses).post(accounts::admin_add_address),
        )
        .route(
            "/{user_id}/addresses/{address_id}",
            put(accounts::admin_update_address).delete(accounts::admin_delete_address),
        )
        .route(
            "/{user_id}/addresses/{address_id}/default",
            put(accounts::admin_set_default_address),
        )
        .route("/users", get(accounts::list_users))
        .route("/remove", post(accounts::remove_user))
        .route("/update/{user_id}", put(accounts::update_user))
        .route("/create-admin", post(accounts::create_admin))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(orders::create))
        .route("/my-orders", get(orders::my_orders))
        .route("/user/{order_id}", get(orders::my_order))
        .route("/admin/user/{user_id}", get(orders::user_orders))
        .route("/list", get(orders::list))
        .route("/stats", get(orders::stats))
        .route("/update-status", post(orders::update_status))
        .route("/delete", post(orders::delete))
}

/// Create the single-product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/add", post(products::add))
        .route("/update/{product_id}", put(products::update))
        .route("/remove", post(products::remove))
        .route("/single", get(products::single))
        .route("/list", get(products::list))
        .route("/update-stock", post(checkout::update_stock))
}

/// Create the product listing routes router.
pub fn listing_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list))
        .route("/{product_type}", get(products::list_by_type))
}

/// Create the category routes router.
pub fn category_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(catalog::list_categories).post(catalog::create_category),
        )
        .route(
            "/{id}",
            get(catalog::get_category)
                .put(catalog::update_category)
                .delete(catalog::delete_category),
        )
}

/// Create the brand routes router.
pub fn brand_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::list_brands).post(catalog::create_brand))
        .route(
            "/{id}",
            get(catalog::get_brand)
                .put(catalog::update_brand)
                .delete(catalog::delete_brand),
        )
}

/// Create the contact routes router.
pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(contacts::submit))
        .route("/my-contacts", get(contacts::mine))
        .route("/admin/all", get(contacts::inbox))
        .route(
            "/admin/{id}",
            get(contacts::show).delete(contacts::remove),
        )
        .route("/admin/{id}/status", put(contacts::set_status))
}

/// Create the dashboard routes router.
pub fn dashboard_routes() -> Router<AppState> {
    Router::new()
        .route("/stats", get(dashboard::stats))
        .route("/analytics", get(dashboard::analytics))
        .route("/quick-stats", get(dashboard::quick_stats))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/user", user_routes())
        .nest("/api/order", order_routes())
        .route("/api/checkout", post(checkout::checkout))
        .nest("/api/product", product_routes())
        .nest("/api/products", listing_routes())
        .nest("/api/category", category_routes())
        .nest("/api/brand", brand_routes())
        .nest("/api/contact", contact_routes())
        .nest("/api/dashboard", dashboard_routes())
}
