//! Per-user shopping cart.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use shopdesk_core::ProductId;

/// A cart mapping line keys to quantities.
///
/// A line key is the product ID, or `{productId}_{size}` when the line is
/// for a specific size. Quantities are always positive; setting a line to
/// zero removes it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart(BTreeMap<String, u32>);

impl Cart {
    /// Build the line key for a product and optional size.
    #[must_use]
    pub fn line_key(product_id: ProductId, size: Option<&str>) -> String {
        match size.map(str::trim).filter(|s| !s.is_empty()) {
            Some(size) => format!("{product_id}_{size}"),
            None => product_id.to_string(),
        }
    }

    /// Add `quantity` units to a line, returning the new line quantity.
    pub fn add(&mut self, key: String, quantity: u32) -> u32 {
        let line = self.0.entry(key).or_insert(0);
        *line = line.saturating_add(quantity);
        *line
    }

    /// Set a line to an exact quantity; zero or less removes it.
    pub fn set(&mut self, key: String, quantity: i64) {
        if quantity <= 0 {
            self.0.remove(&key);
        } else {
            self.0
                .insert(key, u32::try_from(quantity).unwrap_or(u32::MAX));
        }
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Quantity on a line, if present.
    #[must_use]
    pub fn quantity(&self, key: &str) -> Option<u32> {
        self.0.get(key).copied()
    }

    /// Number of distinct lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
