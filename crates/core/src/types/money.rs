//! Type-safe monetary amounts using decimal arithmetic.
//!
//! The store runs a single currency, so `Money` is a plain non-negative
//! decimal. Amounts serialize as JSON numbers for the admin UI and accept
//! either numbers or numeric strings on input.

use core::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing [`Money`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum MoneyError {
    /// Amount is below zero.
    #[error("amount cannot be negative")]
    Negative,

    /// Amount does not fit a stored price column.
    #[error("amount is too large")]
    TooLarge,
}

/// A non-negative monetary amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(feature = "postgres", sqlx(transparent))]
#[serde(try_from = "Decimal")]
pub struct Money(#[serde(serialize_with = "rust_decimal::serde::float::serialize")] Decimal);

impl Money {
    /// Zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Exclusive upper bound of a `NUMERIC(12, 2)` column (10^10).
    pub const STORAGE_LIMIT: Decimal = Decimal::from_parts(1_410_065_408, 2, 0, false, 0);

    /// Create a new amount.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` if `amount` is below zero.
    pub fn new(amount: Decimal) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative);
        }
        Ok(Self(amount))
    }

    /// Get the underlying decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Create an amount that fits a stored price or order total.
    ///
    /// # Errors
    ///
    /// Returns `MoneyError::Negative` below zero and `MoneyError::TooLarge`
    /// at or above [`Money::STORAGE_LIMIT`].
    pub fn storable(amount: Decimal) -> Result<Self, MoneyError> {
        let money = Self::new(amount)?;
        if money.is_storable() {
            Ok(money)
        } else {
            Err(MoneyError::TooLarge)
        }
    }

    /// Whether the amount fits a `NUMERIC(12, 2)` column.
    #[must_use]
    pub fn is_storable(self) -> bool {
        self.0.round_dp(2) < Self::STORAGE_LIMIT
    }

    /// Price of `quantity` units at this unit price, `None` on overflow.
    #[must_use]
    pub fn checked_line_total(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(Decimal::from(quantity)).map(Self)
    }

    /// Sum of two amounts, `None` on overflow.
    #[must_use]
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    /// Sum of `amounts`, `None` on overflow.
    #[must_use]
    pub fn checked_sum<I: IntoIterator<Item = Self>>(amounts: I) -> Option<Self> {
        amounts
            .into_iter()
            .try_fold(Self::ZERO, Self::checked_add)
    }

    /// Compare two amounts at cent precision.
    #[must_use]
    pub fn same_cents(self, other: Self) -> bool {
        self.0.round_dp(2) == other.0.round_dp(2)
    }
}

impl TryFrom<Decimal> for Money {
    type Error = MoneyError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn money(s: &str) -> Money {
        Money::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_rejects_negative() {
        assert_eq!(
            Money::new(Decimal::from_str("-0.01").unwrap()),
            Err(MoneyError::Negative)
        );
        assert!(Money::new(Decimal::ZERO).is_ok());
    }

    #[test]
    fn test_line_total_and_sum() {
        let total = Money::checked_sum([
            money("10").checked_line_total(2).unwrap(),
            money("5").checked_line_total(1).unwrap(),
        ]);
        assert_eq!(total, Some(money("25")));
    }

    #[test]
    fn test_overflow_is_none_not_panic() {
        let max = Money::new(Decimal::MAX).unwrap();
        assert_eq!(max.checked_line_total(2), None);
        assert_eq!(max.checked_add(money("1")), None);
        assert_eq!(Money::checked_sum([money("1"), max]), None);
    }

    #[test]
    fn test_storage_limit() {
        assert_eq!(Money::STORAGE_LIMIT, Decimal::from(10_000_000_000_i64));
        assert!(Money::storable(Decimal::from_str("9999999999.99").unwrap()).is_ok());
        assert_eq!(
            Money::storable(Decimal::from(10_000_000_000_i64)),
            Err(MoneyError::TooLarge)
        );
        assert_eq!(
            Money::storable(Decimal::from_str("9999999999.995").unwrap()),
            Err(MoneyError::TooLarge)
        );
    }

    #[test]
    fn test_same_cents_ignores_sub_cent_noise() {
        assert!(money("19.999").same_cents(money("20.00")));
        assert!(!money("19.98").same_cents(money("19.99")));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&money("12.5")).unwrap();
        assert_eq!(json, "12.5");
    }

    #[test]
    fn test_deserializes_numbers_and_strings() {
        let from_number: Money = serde_json::from_str("19.99").unwrap();
        let from_string: Money = serde_json::from_str("\"19.99\"").unwrap();
        assert_eq!(from_number, money("19.99"));
        assert_eq!(from_string, money("19.99"));
        assert!(serde_json::from_str::<Money>("-1").is_err());
    }

    #[test]
    fn test_display_two_places() {
        assert_eq!(money("7").to_string(), "7.00");
    }
}
