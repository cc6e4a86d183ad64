//! Business logic layer.
//!
//! Services validate requests, call the repositories and log business
//! events. Each has its own error type whose `Display` is the message shown
//! to clients.

pub mod accounts;
pub mod auth;
pub mod catalog;
pub mod contacts;
pub mod dashboard;
pub mod orders;
pub mod stock;

use chrono::{DateTime, Datelike, Months, Utc};

/// The instant `months` calendar months before `now`, clamped to the start
/// of that month so grouped reports cover whole months.
#[must_use]
pub fn months_ago(now: DateTime<Utc>, months: u32) -> DateTime<Utc> {
    let start = now
        .checked_sub_months(Months::new(months))
        .unwrap_or(DateTime::<Utc>::MIN_UTC);
    start
        .date_naive()
        .with_day0(0)
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map_or(start, |naive| naive.and_utc())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_months_ago_starts_at_month_boundary() {
        let now = Utc.with_ymd_and_hms(2024, 8, 31, 15, 30, 0).unwrap();
        assert_eq!(
            months_ago(now, 6),
            Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_months_ago_crosses_year() {
        let now = Utc.with_ymd_and_hms(2024, 3, 10, 0, 0, 0).unwrap();
        assert_eq!(
            months_ago(now, 12),
            Utc.with_ymd_and_hms(2023, 3, 1, 0, 0, 0).unwrap()
        );
    }
}
