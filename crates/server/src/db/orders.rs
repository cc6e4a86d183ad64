//! Order repository for database operations.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use shopdesk_core::{Money, OrderId, OrderStatus, PaymentStatus, UserId};

use super::{RepositoryError, from_json, to_json};
use crate::models::user::UserSummary;
use crate::models::{Order, OrderItem, ShippingAddress};

const ORDER_COLUMNS: &str = r"
    o.id, o.user_id, o.items, o.amount, o.address, o.payment_method,
    o.status, o.payment_status, o.created_at, o.updated_at
";

// =============================================================================
// Internal Row Types
// =============================================================================

/// Internal row type for `PostgreSQL` order queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    user_id: Uuid,
    items: serde_json::Value,
    amount: Money,
    address: serde_json::Value,
    payment_method: String,
    status: OrderStatus,
    payment_status: PaymentStatus,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = RepositoryError;

    fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: OrderId::new(row.id),
            user_id: UserId::new(row.user_id),
            items: from_json(row.items, "order items")?,
            amount: row.amount,
            address: from_json(row.address, "order address")?,
            payment_method: row.payment_method,
            status: row.status,
            payment_status: row.payment_status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Internal row type for order listings joined with the owner.
#[derive(Debug, sqlx::FromRow)]
struct OrderListingRow {
    #[sqlx(flatten)]
    order: OrderRow,
    owner_name: Option<String>,
    owner_email: Option<String>,
}

impl TryFrom<OrderListingRow> for OrderListing {
    type Error = RepositoryError;

    fn try_from(row: OrderListingRow) -> Result<Self, Self::Error> {
        let order: Order = row.order.try_into()?;
        let user = match (row.owner_name, row.owner_email) {
            (Some(name), Some(email)) => Some(UserSummary {
                id: order.user_id,
                name,
                email,
            }),
            _ => None,
        };
        Ok(Self { order, user })
    }
}

// =============================================================================
// Public Types
// =============================================================================

/// A validated order ready to insert.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub amount: Money,
    pub address: ShippingAddress,
    pub payment_method: String,
}

/// An order with its owner's name and email.
///
/// `user` is `None` when the owning account has since been deleted.
#[derive(Debug, Clone, Serialize)]
pub struct OrderListing {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<UserSummary>,
}

/// Order count and revenue for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlyTotal {
    pub year: i32,
    pub month: i32,
    pub count: i64,
    pub revenue: Money,
}

/// Headline order counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct OrderCounts {
    pub total_orders: i64,
    pub pending_orders: i64,
    pub delivered_orders: i64,
    pub total_revenue: Money,
}

// =============================================================================
// Repository
// =============================================================================

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert an order and append it to the owner's order list.
    ///
    /// Both writes happen in one transaction: either the order exists and is
    /// listed on the user, or neither change is visible.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn create(&self, order: NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let user_exists = sqlx::query_scalar::<_, Uuid>(
            "SELECT id FROM users WHERE id = $1 FOR UPDATE",
        )
        .bind(order.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .is_some();

        if !user_exists {
            return Err(RepositoryError::NotFound);
        }

        let order_id = OrderId::generate();
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            INSERT INTO orders AS o (id, user_id, items, amount, address, payment_method)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(order_id)
        .bind(order.user_id)
        .bind(to_json(&order.items, "order items")?)
        .bind(order.amount)
        .bind(to_json(&order.address, "order address")?)
        .bind(&order.payment_method)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query(
            r"
            UPDATE users
            SET order_ids = array_append(order_ids, $2), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(order.user_id)
        .bind(order_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        row.try_into()
    }

    /// Get an order by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn get_by_id(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(TryInto::try_into).transpose()
    }

    /// All orders placed by one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS} FROM orders o
            WHERE o.user_id = $1
            ORDER BY o.created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// All orders with their owners, newest first, optionally limited.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the data is invalid.
    pub async fn list_with_owners(
        &self,
        limit: Option<i64>,
    ) -> Result<Vec<OrderListing>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderListingRow>(&format!(
            r"
            SELECT {ORDER_COLUMNS}, u.name AS owner_name, u.email AS owner_email
            FROM orders o
            LEFT JOIN users u ON u.id = o.user_id
            ORDER BY o.created_at DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(TryInto::try_into).collect()
    }

    /// Set an order's status and, optionally, its payment status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: OrderId,
        status: OrderStatus,
        payment_status: Option<PaymentStatus>,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(&format!(
            r"
            UPDATE orders AS o SET
                status = $2,
                payment_status = COALESCE($3, payment_status),
                updated_at = NOW()
            WHERE o.id = $1
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(payment_status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete an order and drop it from the owner's order list.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let owner = sqlx::query_scalar::<_, Uuid>("DELETE FROM orders WHERE id = $1 RETURNING user_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        sqlx::query(
            r"
            UPDATE users
            SET order_ids = array_remove(order_ids, $2), updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(owner)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    /// Headline counters across all orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<OrderCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, OrderCounts>(
            r"
            SELECT
                COUNT(*) AS total_orders,
                COUNT(*) FILTER (WHERE status = 'pending') AS pending_orders,
                COUNT(*) FILTER (WHERE status = 'delivered') AS delivered_orders,
                COALESCE(SUM(amount) FILTER (WHERE status = ANY($1)), 0) AS total_revenue
            FROM orders
            ",
        )
        .bind(OrderStatus::REVENUE)
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Order count and revenue per month for orders placed since `since`.
    ///
    /// With `revenue_only`, only orders in a revenue status are counted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_totals(
        &self,
        since: DateTime<Utc>,
        revenue_only: bool,
    ) -> Result<Vec<MonthlyTotal>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthlyTotal>(
            r"
            SELECT
                EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int AS year,
                EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int AS month,
                COUNT(*) AS count,
                COALESCE(SUM(amount), 0) AS revenue
            FROM orders
            WHERE created_at >= $1
              AND (NOT $2 OR status = ANY($3))
            GROUP BY 1, 2
            ORDER BY 1, 2
            ",
        )
        .bind(since)
        .bind(revenue_only)
        .bind(OrderStatus::REVENUE)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }
}
