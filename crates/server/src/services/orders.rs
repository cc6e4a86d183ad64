//! Order lifecycle: placement, status changes, deletion and reporting.
//!
//! Placement is validated in full before any write. The line items, amount
//! and address are stored as a snapshot and never recomputed from the
//! current catalog.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use shopdesk_core::{Money, OrderId, OrderStatus, PaymentStatus, ProductId, UserId};

use super::months_ago;
use crate::db::RepositoryError;
use crate::db::orders::{MonthlyTotal, NewOrder, OrderCounts, OrderListing, OrderRepository};
use crate::models::order::{AddressField, DEFAULT_PAYMENT_METHOD, RawAddress};
use crate::models::{Order, OrderItem};

const RECENT_ORDERS: i64 = 10;
const STATS_MONTHS: u32 = 6;

/// Errors from order operations.
#[derive(Debug, Error)]
pub enum OrderError {
    /// Request failed validation; the message is shown to the client.
    #[error("{0}")]
    Validation(String),

    /// Address is missing one or more required fields after alias resolution.
    #[error("Missing required address fields: {}", join_fields(.0))]
    MissingAddressFields(Vec<AddressField>),

    /// Supplied amount differs from the sum of the line items.
    #[error("Order amount does not match item total")]
    AmountMismatch,

    /// No such order, or not visible to the caller.
    #[error("Order not found")]
    NotFound,

    /// Ordering account does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

fn join_fields(fields: &[AddressField]) -> String {
    fields
        .iter()
        .map(|f| f.name())
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Request Types
// =============================================================================

/// A cart line as sent by the storefront.
///
/// The product may be named by `_id` or `productId`, and the display name by
/// `name` or `title`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemInput {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub product_id: Option<String>,
    pub name: Option<String>,
    pub title: Option<String>,
    pub price: Option<Decimal>,
    pub quantity: Option<i64>,
    pub images: Option<Vec<String>>,
    pub image: Option<String>,
}

/// Body of `POST /api/order/create`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateOrderRequest {
    pub items: Option<Vec<OrderItemInput>>,
    pub amount: Option<Decimal>,
    pub address: Option<RawAddress>,
}

/// Body of `POST /api/order/update-status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub order_id: Option<String>,
    pub status: Option<String>,
    pub payment_status: Option<String>,
}

/// A status change that passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusChange {
    pub order_id: OrderId,
    pub status: OrderStatus,
    pub payment_status: Option<PaymentStatus>,
}

/// Order figures for the admin order screen.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderStats {
    #[serde(flatten)]
    pub counts: OrderCounts,
    pub recent_orders: Vec<OrderListing>,
    pub monthly_orders: Vec<MonthlyTotal>,
}

// =============================================================================
// Validation
// =============================================================================

/// Validate an order request and build the row to insert.
///
/// Checks run in a fixed order and stop at the first failing group. Within
/// the address group every missing field is reported.
///
/// # Errors
///
/// Returns `OrderError::Validation`, `OrderError::MissingAddressFields` or
/// `OrderError::AmountMismatch`.
pub fn validate_order(user_id: UserId, request: CreateOrderRequest) -> Result<NewOrder, OrderError> {
    let inputs = request
        .items
        .filter(|items| !items.is_empty())
        .ok_or_else(|| invalid("Order items are required"))?;

    let amount = request
        .amount
        .filter(|amount| *amount > Decimal::ZERO)
        .ok_or_else(|| invalid("Order amount is required"))?;

    let address = request
        .address
        .ok_or_else(|| invalid("Delivery address is required"))?
        .normalize()
        .map_err(OrderError::MissingAddressFields)?;

    let items = inputs
        .into_iter()
        .map(snapshot_item)
        .collect::<Result<Vec<_>, _>>()?;

    let amount = Money::storable(amount).map_err(|_| invalid("Order amount is too large"))?;
    let total = items
        .iter()
        .map(OrderItem::line_total)
        .collect::<Option<Vec<_>>>()
        .and_then(Money::checked_sum)
        .ok_or_else(|| invalid("Order total is too large"))?;
    if !amount.same_cents(total) {
        return Err(OrderError::AmountMismatch);
    }

    Ok(NewOrder {
        user_id,
        items,
        amount,
        address,
        payment_method: DEFAULT_PAYMENT_METHOD.to_owned(),
    })
}

fn snapshot_item(input: OrderItemInput) -> Result<OrderItem, OrderError> {
    let product_id = input
        .id
        .or(input.product_id)
        .and_then(|raw| raw.parse::<ProductId>().ok())
        .ok_or_else(|| invalid("All items must have a valid product ID"))?;

    let name = input.name.or(input.title).unwrap_or_default();

    let quantity = input
        .quantity
        .filter(|q| *q >= 1)
        .and_then(|q| u32::try_from(q).ok())
        .ok_or_else(|| invalid(&format!("Invalid quantity for {}", display_name(&name))))?;

    let price = input
        .price
        .and_then(|p| Money::storable(p).ok())
        .ok_or_else(|| invalid(&format!("Invalid price for {}", display_name(&name))))?;

    let image = input
        .images
        .and_then(|images| images.into_iter().next())
        .or(input.image)
        .unwrap_or_default();

    Ok(OrderItem {
        product_id,
        name,
        price,
        quantity,
        image,
    })
}

fn display_name(name: &str) -> &str {
    if name.is_empty() { "item" } else { name }
}

/// Validate a status change request.
///
/// # Errors
///
/// Returns `OrderError::Validation` for missing fields or unknown statuses,
/// and `OrderError::NotFound` for an order ID that cannot exist.
pub fn validate_status_change(request: UpdateStatusRequest) -> Result<StatusChange, OrderError> {
    let (Some(order_id), Some(status)) = (
        non_blank(request.order_id),
        non_blank(request.status),
    ) else {
        return Err(invalid("Order ID and status are required"));
    };

    let status = status
        .parse::<OrderStatus>()
        .map_err(|_| invalid("Invalid status"))?;

    let payment_status = non_blank(request.payment_status)
        .map(|p| p.parse::<PaymentStatus>())
        .transpose()
        .map_err(|_| invalid("Invalid payment status"))?;

    let order_id = order_id.parse::<OrderId>().map_err(|_| OrderError::NotFound)?;

    Ok(StatusChange {
        order_id,
        status,
        payment_status,
    })
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn invalid(message: &str) -> OrderError {
    OrderError::Validation(message.to_owned())
}

// =============================================================================
// Service
// =============================================================================

/// Order service.
pub struct OrderService<'a> {
    orders: OrderRepository<'a>,
}

impl<'a> OrderService<'a> {
    /// Create a new order service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            orders: OrderRepository::new(pool),
        }
    }

    /// Validate and place an order for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before any write, or
    /// `OrderError::UserNotFound` if the account no longer exists.
    #[tracing::instrument(skip(self, request))]
    pub async fn place(&self, user_id: UserId, request: CreateOrderRequest) -> Result<Order, OrderError> {
        let new_order = validate_order(user_id, request)?;

        let order = self.orders.create(new_order).await.map_err(|e| match e {
            RepositoryError::NotFound => OrderError::UserNotFound,
            other => OrderError::Repository(other),
        })?;

        tracing::info!(
            order_id = %order.id,
            user_id = %order.user_id,
            amount = %order.amount,
            items = order.items.len(),
            "Order created"
        );
        Ok(order)
    }

    /// Orders placed by `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<Order>, OrderError> {
        Ok(self.orders.list_for_user(user_id).await?)
    }

    /// One of `user_id`'s orders.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order is absent or belongs to
    /// someone else.
    pub async fn get_for_user(&self, user_id: UserId, order_id: OrderId) -> Result<Order, OrderError> {
        self.orders
            .get_by_id(order_id)
            .await?
            .filter(|order| order.user_id == user_id)
            .ok_or(OrderError::NotFound)
    }

    /// Every order with its owner, newest first.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if the query fails.
    pub async fn all(&self) -> Result<Vec<OrderListing>, OrderError> {
        Ok(self.orders.list_with_owners(None).await?)
    }

    /// Apply a validated status change. Any status may follow any other.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn change_status(&self, change: StatusChange) -> Result<Order, OrderError> {
        let order = self
            .orders
            .update_status(change.order_id, change.status, change.payment_status)
            .await
            .map_err(not_found)?;

        tracing::info!(
            order_id = %order.id,
            status = %order.status,
            payment_status = %order.payment_status,
            "Order status updated"
        );
        Ok(order)
    }

    /// Delete an order unconditionally.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::NotFound` if the order does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, order_id: OrderId) -> Result<(), OrderError> {
        self.orders.delete(order_id).await.map_err(not_found)?;
        tracing::info!(order_id = %order_id, "Order deleted");
        Ok(())
    }

    /// Counters, recent orders and the last six months of totals.
    ///
    /// # Errors
    ///
    /// Returns `OrderError::Repository` if a query fails.
    pub async fn stats(&self) -> Result<OrderStats, OrderError> {
        let counts = self.orders.counts().await?;
        let recent_orders = self.orders.list_with_owners(Some(RECENT_ORDERS)).await?;
        let monthly_orders = self
            .orders
            .monthly_totals(months_ago(Utc::now(), STATS_MONTHS), false)
            .await?;

        Ok(OrderStats {
            counts,
            recent_orders,
            monthly_orders,
        })
    }
}

fn not_found(e: RepositoryError) -> OrderError {
    match e {
        RepositoryError::NotFound => OrderError::NotFound,
        other => OrderError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn address() -> Value {
        json!({
            "firstName": "Ada",
            "lastName": "Lovelace",
            "email": "ada@example.com",
            "street": "12 St James's Sq",
            "city": "London",
            "state": "London",
            "zipCode": "SW1Y 4JH",
            "country": "UK",
            "phone": "555-0100"
        })
    }

    fn request(body: Value) -> CreateOrderRequest {
        serde_json::from_value(body).unwrap()
    }

    fn two_line_order(amount: Value) -> CreateOrderRequest {
        request(json!({
            "items": [
                { "_id": ProductId::generate().to_string(), "name": "A", "price": 10, "quantity": 2 },
                { "productId": ProductId::generate().to_string(), "title": "B", "price": "5.00", "quantity": 1, "images": ["b.jpg"] }
            ],
            "amount": amount,
            "address": address()
        }))
    }

    fn message(err: &OrderError) -> String {
        err.to_string()
    }

    #[test]
    fn test_valid_order_snapshots_items() {
        let order = validate_order(UserId::generate(), two_line_order(json!(25))).unwrap();

        assert_eq!(order.amount.to_string(), "25.00");
        assert_eq!(order.items.len(), 2);
        assert_eq!(order.items[1].name, "B");
        assert_eq!(order.items[1].image, "b.jpg");
        assert_eq!(order.address.zipcode, "SW1Y 4JH");
        assert_eq!(order.payment_method, "cod");
    }

    #[test]
    fn test_amount_must_match_item_total() {
        let err = validate_order(UserId::generate(), two_line_order(json!(24.99))).unwrap_err();
        assert!(matches!(err, OrderError::AmountMismatch));
        assert_eq!(message(&err), "Order amount does not match item total");
    }

    #[test]
    fn test_amount_compared_at_cent_precision() {
        assert!(validate_order(UserId::generate(), two_line_order(json!("25.001"))).is_ok());
    }

    #[test]
    fn test_empty_items_rejected() {
        let err = validate_order(
            UserId::generate(),
            request(json!({ "items": [], "amount": 1, "address": address() })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "Order items are required");
    }

    #[test]
    fn test_missing_amount_rejected() {
        let mut body = json!({ "items": [{ "_id": ProductId::generate().to_string(), "price": 1, "quantity": 1 }], "address": address() });
        let err = validate_order(UserId::generate(), request(body.clone())).unwrap_err();
        assert_eq!(message(&err), "Order amount is required");

        body["amount"] = json!(0);
        assert!(validate_order(UserId::generate(), request(body)).is_err());
    }

    #[test]
    fn test_missing_address_rejected() {
        let err = validate_order(
            UserId::generate(),
            request(json!({ "items": [{ "_id": "x", "quantity": 1 }], "amount": 1 })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "Delivery address is required");
    }

    #[test]
    fn test_missing_address_fields_are_all_named() {
        let mut order = two_line_order(json!(25));
        order.address = Some(serde_json::from_value(json!({ "name": "Ada Lovelace", "email": "a@b.co" })).unwrap());

        let err = validate_order(UserId::generate(), order).unwrap_err();
        assert_eq!(
            message(&err),
            "Missing required address fields: street, city, state, zipcode, country, phone"
        );
    }

    #[test]
    fn test_item_without_product_id_rejected() {
        let err = validate_order(
            UserId::generate(),
            request(json!({
                "items": [{ "name": "Orphan", "price": 1, "quantity": 1 }],
                "amount": 1,
                "address": address()
            })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "All items must have a valid product ID");
    }

    #[test]
    fn test_oversized_price_rejected_without_overflow() {
        let err = validate_order(
            UserId::generate(),
            request(json!({
                "items": [{
                    "_id": ProductId::generate().to_string(),
                    "name": "Yacht",
                    "price": "79228162514264337593543950335",
                    "quantity": 2
                }],
                "amount": 1,
                "address": address()
            })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "Invalid price for Yacht");
    }

    #[test]
    fn test_price_beyond_column_rejected() {
        let err = validate_order(
            UserId::generate(),
            request(json!({
                "items": [{ "_id": ProductId::generate().to_string(), "name": "Yacht", "price": "10000000000", "quantity": 1 }],
                "amount": "10000000000",
                "address": address()
            })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "Invalid price for Yacht");
    }

    #[test]
    fn test_amount_beyond_column_rejected() {
        let err = validate_order(UserId::generate(), two_line_order(json!("12345678901.00"))).unwrap_err();
        assert_eq!(message(&err), "Order amount is too large");
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = validate_order(
            UserId::generate(),
            request(json!({
                "items": [{ "_id": ProductId::generate().to_string(), "name": "Mug", "price": 1, "quantity": 0 }],
                "amount": 1,
                "address": address()
            })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "Invalid quantity for Mug");
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = validate_order(
            UserId::generate(),
            request(json!({
                "items": [{ "_id": ProductId::generate().to_string(), "price": -1, "quantity": 1 }],
                "amount": 1,
                "address": address()
            })),
        )
        .unwrap_err();
        assert_eq!(message(&err), "Invalid price for item");
    }

    #[test]
    fn test_status_change_requires_id_and_status() {
        let err = validate_status_change(UpdateStatusRequest {
            order_id: Some(OrderId::generate().to_string()),
            status: Some("  ".into()),
            payment_status: None,
        })
        .unwrap_err();
        assert_eq!(message(&err), "Order ID and status are required");
    }

    #[test]
    fn test_status_change_rejects_unknown_values() {
        let id = OrderId::generate().to_string();
        let err = validate_status_change(UpdateStatusRequest {
            order_id: Some(id.clone()),
            status: Some("refunded".into()),
            payment_status: None,
        })
        .unwrap_err();
        assert_eq!(message(&err), "Invalid status");

        let err = validate_status_change(UpdateStatusRequest {
            order_id: Some(id),
            status: Some("shipped".into()),
            payment_status: Some("maybe".into()),
        })
        .unwrap_err();
        assert_eq!(message(&err), "Invalid payment status");
    }

    #[test]
    fn test_status_change_allows_backward_moves() {
        let change = validate_status_change(UpdateStatusRequest {
            order_id: Some(OrderId::generate().to_string()),
            status: Some("pending".into()),
            payment_status: Some("paid".into()),
        })
        .unwrap();
        assert_eq!(change.status, OrderStatus::Pending);
        assert_eq!(change.payment_status, Some(PaymentStatus::Paid));
    }

    #[test]
    fn test_status_change_with_malformed_id_is_not_found() {
        let err = validate_status_change(UpdateStatusRequest {
            order_id: Some("not-an-id".into()),
            status: Some("shipped".into()),
            payment_status: None,
        })
        .unwrap_err();
        assert!(matches!(err, OrderError::NotFound));
    }
}
