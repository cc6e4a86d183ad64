//! Aggregate queries behind the admin dashboard.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use shopdesk_core::{Money, OrderStatus};

use super::RepositoryError;

/// Store-wide counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StoreTotals {
    pub total_users: i64,
    pub total_products: i64,
    pub total_orders: i64,
    pub total_revenue: Money,
}

/// Number of orders in one status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct StatusCount {
    pub status: OrderStatus,
    pub count: i64,
}

/// Number of accounts registered in one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: i32,
    pub count: i64,
}

/// Sales placed within a time window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct SalesWindow {
    pub sales: Money,
    pub orders: i64,
}

/// Repository for dashboard aggregates.
pub struct DashboardRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> DashboardRepository<'a> {
    /// Create a new dashboard repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Users, products, orders and revenue across the whole store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn totals(&self) -> Result<StoreTotals, RepositoryError> {
        let totals = sqlx::query_as::<_, StoreTotals>(
            r"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM products) AS total_products,
                (SELECT COUNT(*) FROM orders) AS total_orders,
                (SELECT COALESCE(SUM(amount), 0) FROM orders WHERE status = ANY($1))
                    AS total_revenue
            ",
        )
        .bind(OrderStatus::REVENUE)
        .fetch_one(self.pool)
        .await?;

        Ok(totals)
    }

    /// Order counts grouped by status. Statuses with no orders are absent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn orders_by_status(&self) -> Result<Vec<StatusCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, StatusCount>(
            "SELECT status, COUNT(*) AS count FROM orders GROUP BY status ORDER BY status",
        )
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Account registrations per month since `since`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn monthly_registrations(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<MonthlyCount>, RepositoryError> {
        let rows = sqlx::query_as::<_, MonthlyCount>(
            r"
            SELECT
                EXTRACT(YEAR FROM created_at AT TIME ZONE 'UTC')::int AS year,
                EXTRACT(MONTH FROM created_at AT TIME ZONE 'UTC')::int AS month,
                COUNT(*) AS count
            FROM users
            WHERE created_at >= $1
            GROUP BY 1, 2
            ORDER BY 1, 2
            ",
        )
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Non-cancelled sales placed in `[start, end)`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn sales_between(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<SalesWindow, RepositoryError> {
        let window = sqlx::query_as::<_, SalesWindow>(
            r"
            SELECT
                COALESCE(SUM(amount) FILTER (WHERE status <> 'cancelled'), 0) AS sales,
                COUNT(*) AS orders
            FROM orders
            WHERE created_at >= $1 AND created_at < $2
            ",
        )
        .bind(start)
        .bind(end)
        .fetch_one(self.pool)
        .await?;

        Ok(window)
    }
}
