//! Admin dashboard figures.

use chrono::{DateTime, Days, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::months_ago;
use crate::db::dashboard::{DashboardRepository, MonthlyCount, SalesWindow, StatusCount, StoreTotals};
use crate::db::orders::{MonthlyTotal, OrderListing, OrderRepository};
use crate::db::products::ProductRepository;
use crate::db::users::UserRepository;
use crate::db::RepositoryError;
use crate::models::Product;
use crate::models::user::UserSummary;

const RECENT_LIMIT: i64 = 5;

/// Reporting window for the analytics view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Period {
    ThreeMonths,
    SixMonths,
    OneYear,
}

impl Period {
    /// Parse a `period` query value. Anything unrecognized means three months.
    #[must_use]
    pub fn parse(raw: Option<&str>) -> Self {
        match raw.map(str::trim) {
            Some("6months") => Self::SixMonths,
            Some("1year") => Self::OneYear,
            _ => Self::ThreeMonths,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThreeMonths => "3months",
            Self::SixMonths => "6months",
            Self::OneYear => "1year",
        }
    }

    const fn months(self) -> u32 {
        match self {
            Self::ThreeMonths => 3,
            Self::SixMonths => 6,
            Self::OneYear => 12,
        }
    }
}

/// `GET /api/dashboard/stats` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    #[serde(flatten)]
    pub totals: StoreTotals,
    pub recent_orders: Vec<OrderListing>,
    pub top_products: Vec<Product>,
    pub orders_by_status: Vec<StatusCount>,
    pub recent_users: Vec<UserSummary>,
}

/// `GET /api/dashboard/analytics` payload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analytics {
    pub monthly_data: Vec<MonthlyTotal>,
    pub user_registrations: Vec<MonthlyCount>,
    pub period: &'static str,
}

/// Start and end of the UTC day containing `now`.
fn utc_day(now: DateTime<Utc>) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map_or(now, |naive| naive.and_utc());
    let end = start.checked_add_days(Days::new(1)).unwrap_or(DateTime::<Utc>::MAX_UTC);
    (start, end)
}

/// Dashboard service.
pub struct DashboardService<'a> {
    dashboard: DashboardRepository<'a>,
    orders: OrderRepository<'a>,
    products: ProductRepository<'a>,
    users: UserRepository<'a>,
}

impl<'a> DashboardService<'a> {
    /// Create a new dashboard service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            dashboard: DashboardRepository::new(pool),
            orders: OrderRepository::new(pool),
            products: ProductRepository::new(pool),
            users: UserRepository::new(pool),
        }
    }

    /// Store totals with the most recent activity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any query fails.
    pub async fn stats(&self) -> Result<DashboardStats, RepositoryError> {
        Ok(DashboardStats {
            totals: self.dashboard.totals().await?,
            recent_orders: self.orders.list_with_owners(Some(RECENT_LIMIT)).await?,
            top_products: self.products.top_selling(RECENT_LIMIT).await?,
            orders_by_status: self.dashboard.orders_by_status().await?,
            recent_users: self.users.recent(RECENT_LIMIT).await?,
        })
    }

    /// Monthly revenue and registrations over `period`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if any query fails.
    pub async fn analytics(&self, period: Period) -> Result<Analytics, RepositoryError> {
        let since = months_ago(Utc::now(), period.months());
        Ok(Analytics {
            monthly_data: self.orders.monthly_totals(since, true).await?,
            user_registrations: self.dashboard.monthly_registrations(since).await?,
            period: period.as_str(),
        })
    }

    /// Sales and order count for the current UTC day.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the query fails.
    pub async fn quick_stats(&self) -> Result<SalesWindow, RepositoryError> {
        let (start, end) = utc_day(Utc::now());
        self.dashboard.sales_between(start, end).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_period_parse_defaults_to_three_months() {
        assert_eq!(Period::parse(Some("6months")), Period::SixMonths);
        assert_eq!(Period::parse(Some("1year")), Period::OneYear);
        assert_eq!(Period::parse(Some("forever")), Period::ThreeMonths);
        assert_eq!(Period::parse(None), Period::ThreeMonths);
    }

    #[test]
    fn test_utc_day_bounds() {
        let now = Utc.with_ymd_and_hms(2024, 12, 31, 23, 59, 59).unwrap();
        let (start, end) = utc_day(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap());
    }
}
