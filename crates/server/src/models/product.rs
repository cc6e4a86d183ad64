//! Catalog products.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use shopdesk_core::{Money, ProductId};

/// Maximum number of images per product.
pub const MAX_IMAGES: usize = 4;

/// A catalog product with its stock counters.
///
/// `is_available` is always false when `stock` is zero; a product with stock
/// may still be switched off by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: ProductId,
    #[serde(rename = "_type")]
    pub product_type: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(with = "rust_decimal::serde::float")]
    pub discounted_percentage: Decimal,
    pub stock: i32,
    pub sold_quantity: i32,
    pub category: String,
    pub brand: String,
    pub badge: bool,
    pub is_available: bool,
    pub offer: bool,
    pub images: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// First image URL, or an empty string.
    #[must_use]
    pub fn primary_image(&self) -> &str {
        self.images.first().map_or("", String::as_str)
    }
}

/// Stock counters after a decrement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct StockSnapshot {
    #[serde(rename = "_id")]
    pub id: ProductId,
    pub name: String,
    pub stock: i32,
    pub sold_quantity: i32,
    pub is_available: bool,
}

/// Availability after applying the out-of-stock rule.
#[must_use]
pub const fn effective_availability(requested: bool, stock: i32) -> bool {
    requested && stock > 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_stock_is_never_available() {
        assert!(!effective_availability(true, 0));
        assert!(!effective_availability(false, 5));
        assert!(effective_availability(true, 1));
    }
}
