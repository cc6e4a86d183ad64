//! Stock reconciliation for checkout and single-product sales.
//!
//! A checkout either decrements every product it names or none of them.
//! Product rows are locked for the whole check-then-write sequence, so a
//! concurrent checkout sees the reduced stock or waits.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use shopdesk_core::ProductId;

use crate::db::RepositoryError;
use crate::db::products::{ProductRepository, StockLevel};
use crate::models::StockSnapshot;

/// Errors from stock operations.
#[derive(Debug, Error)]
pub enum StockError {
    /// Checkout called with no items.
    #[error("Cart items are required")]
    EmptyCart,

    /// Single-product update with a missing ID or non-positive quantity.
    #[error("Product ID and valid quantity are required")]
    InvalidRequest,

    /// Product does not exist.
    #[error("Product not found")]
    ProductNotFound,

    /// Product exists but has fewer units than requested.
    #[error("Insufficient stock available")]
    Insufficient,

    /// One or more checkout lines failed; every problem is listed.
    #[error("Stock validation failed")]
    Validation(Vec<String>),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// A checkout line as sent by the storefront.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutLine {
    #[serde(alias = "_id")]
    pub product_id: Option<String>,
    pub quantity: Option<i64>,
}

/// Result of a successful checkout: the new counters of each product touched.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutOutcome {
    pub updated_products: Vec<StockSnapshot>,
}

/// A checkout line after ID parsing and duplicate merging.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PlanLine {
    /// Missing ID or a quantity below one.
    Invalid,
    /// ID that cannot name any product.
    Unknown(String),
    /// Well-formed line; quantities of repeated IDs are summed.
    Product { id: ProductId, quantity: i64 },
}

/// Parse lines and merge repeated products into their first occurrence.
fn merge_lines(lines: &[CheckoutLine]) -> Vec<PlanLine> {
    let mut merged: Vec<PlanLine> = Vec::with_capacity(lines.len());

    for line in lines {
        let (Some(raw), Some(quantity)) = (line.product_id.as_deref(), line.quantity) else {
            merged.push(PlanLine::Invalid);
            continue;
        };
        let raw = raw.trim();
        if raw.is_empty() || quantity < 1 {
            merged.push(PlanLine::Invalid);
            continue;
        }
        let Ok(id) = raw.parse::<ProductId>() else {
            merged.push(PlanLine::Unknown(raw.to_owned()));
            continue;
        };

        let existing = merged.iter_mut().find_map(|entry| match entry {
            PlanLine::Product { id: seen, quantity } if *seen == id => Some(quantity),
            _ => None,
        });
        match existing {
            Some(total) => *total = total.saturating_add(quantity),
            None => merged.push(PlanLine::Product { id, quantity }),
        }
    }

    merged
}

fn product_ids(lines: &[PlanLine]) -> Vec<ProductId> {
    lines
        .iter()
        .filter_map(|line| match line {
            PlanLine::Product { id, .. } => Some(*id),
            _ => None,
        })
        .collect()
}

/// Check every line against current stock.
///
/// Returns the decrements to apply, or every problem found. Nothing is
/// applied unless the whole plan is clean.
fn plan(lines: &[PlanLine], levels: &[StockLevel]) -> Result<Vec<(ProductId, i32)>, Vec<String>> {
    let mut errors = Vec::new();
    let mut decrements = Vec::with_capacity(lines.len());

    for line in lines {
        match line {
            PlanLine::Invalid => errors.push("Invalid product or quantity".to_owned()),
            PlanLine::Unknown(raw) => errors.push(format!("Product not found: {raw}")),
            PlanLine::Product { id, quantity } => {
                let Some(level) = levels.iter().find(|level| level.id == *id) else {
                    errors.push(format!("Product not found: {id}"));
                    continue;
                };
                match i32::try_from(*quantity) {
                    Ok(qty) if qty <= level.stock => decrements.push((*id, qty)),
                    _ => errors.push(format!(
                        "Insufficient stock for {}. Available: {}, Requested: {quantity}",
                        level.name, level.stock
                    )),
                }
            }
        }
    }

    if errors.is_empty() { Ok(decrements) } else { Err(errors) }
}

/// Stock service.
pub struct StockService<'a> {
    pool: &'a PgPool,
    products: ProductRepository<'a>,
}

impl<'a> StockService<'a> {
    /// Create a new stock service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            products: ProductRepository::new(pool),
        }
    }

    /// Reserve stock for a whole cart.
    ///
    /// # Errors
    ///
    /// Returns `StockError::EmptyCart` for an empty cart and
    /// `StockError::Validation` listing every failing line. No stock changes
    /// in either case.
    #[tracing::instrument(skip(self, lines), fields(lines = lines.len()))]
    pub async fn checkout(&self, lines: &[CheckoutLine]) -> Result<CheckoutOutcome, StockError> {
        if lines.is_empty() {
            return Err(StockError::EmptyCart);
        }

        let merged = merge_lines(lines);
        let ids = product_ids(&merged);

        let mut tx = self.pool.begin().await.map_err(RepositoryError::from)?;
        let levels = ProductRepository::lock_stock_levels(&mut *tx, &ids).await?;

        let decrements = plan(&merged, &levels).map_err(|errors| {
            tracing::info!(errors = errors.len(), "Checkout rejected");
            StockError::Validation(errors)
        })?;

        let mut updated_products = Vec::with_capacity(decrements.len());
        for (id, quantity) in decrements {
            // Rows are locked and were checked above, so this always matches.
            let snapshot = ProductRepository::decrement_stock_in(&mut *tx, id, quantity)
                .await?
                .ok_or_else(|| {
                    StockError::Repository(RepositoryError::DataCorruption(format!(
                        "locked product {id} changed during checkout"
                    )))
                })?;
            updated_products.push(snapshot);
        }

        tx.commit().await.map_err(RepositoryError::from)?;

        tracing::info!(products = updated_products.len(), "Checkout stock reserved");
        Ok(CheckoutOutcome { updated_products })
    }

    /// Sell `quantity` units of one product.
    ///
    /// # Errors
    ///
    /// Returns `StockError::InvalidRequest` for missing or non-positive input,
    /// `StockError::ProductNotFound` for an unknown product and
    /// `StockError::Insufficient` when too few units remain.
    #[tracing::instrument(skip(self))]
    pub async fn sell(
        &self,
        product_id: Option<&str>,
        quantity: Option<i64>,
    ) -> Result<StockSnapshot, StockError> {
        let (Some(raw), Some(quantity)) = (product_id.map(str::trim), quantity) else {
            return Err(StockError::InvalidRequest);
        };
        if raw.is_empty() || quantity < 1 {
            return Err(StockError::InvalidRequest);
        }

        let id = raw
            .parse::<ProductId>()
            .map_err(|_| StockError::ProductNotFound)?;
        let quantity = i32::try_from(quantity).map_err(|_| StockError::Insufficient)?;

        if let Some(snapshot) = self.products.decrement_stock(id, quantity).await? {
            tracing::info!(
                product_id = %id,
                quantity,
                stock = snapshot.stock,
                "Stock updated"
            );
            return Ok(snapshot);
        }

        if self.products.exists(id).await? {
            Err(StockError::Insufficient)
        } else {
            Err(StockError::ProductNotFound)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn line(id: &str, quantity: i64) -> CheckoutLine {
        CheckoutLine {
            product_id: Some(id.to_owned()),
            quantity: Some(quantity),
        }
    }

    fn level(id: ProductId, name: &str, stock: i32) -> StockLevel {
        StockLevel {
            id,
            name: name.to_owned(),
            stock,
        }
    }

    #[test]
    fn test_merge_sums_repeated_products_in_first_position() {
        let a = ProductId::generate();
        let b = ProductId::generate();
        let merged = merge_lines(&[
            line(&a.to_string(), 2),
            line(&b.to_string(), 1),
            line(&a.to_string(), 3),
        ]);

        assert_eq!(
            merged,
            vec![
                PlanLine::Product { id: a, quantity: 5 },
                PlanLine::Product { id: b, quantity: 1 },
            ]
        );
    }

    #[test]
    fn test_merge_flags_malformed_lines() {
        let merged = merge_lines(&[
            CheckoutLine::default(),
            line("", 1),
            line(&ProductId::generate().to_string(), 0),
            line("abc123", 1),
        ]);

        assert_eq!(merged[0], PlanLine::Invalid);
        assert_eq!(merged[1], PlanLine::Invalid);
        assert_eq!(merged[2], PlanLine::Invalid);
        assert_eq!(merged[3], PlanLine::Unknown("abc123".to_owned()));
    }

    #[test]
    fn test_plan_accepts_exact_stock() {
        let id = ProductId::generate();
        let lines = merge_lines(&[line(&id.to_string(), 3)]);

        assert_eq!(plan(&lines, &[level(id, "Lamp", 3)]).unwrap(), vec![(id, 3)]);
    }

    #[test]
    fn test_plan_reports_every_problem() {
        let short = ProductId::generate();
        let missing = ProductId::generate();
        let lines = merge_lines(&[
            line(&short.to_string(), 2),
            line(&short.to_string(), 2),
            line(&missing.to_string(), 1),
            CheckoutLine::default(),
        ]);

        let errors = plan(&lines, &[level(short, "Lamp", 3)]).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Insufficient stock for Lamp. Available: 3, Requested: 4".to_owned(),
                format!("Product not found: {missing}"),
                "Invalid product or quantity".to_owned(),
            ]
        );
    }

    #[test]
    fn test_plan_fails_whole_cart_on_one_bad_line() {
        let ok = ProductId::generate();
        let bad = ProductId::generate();
        let lines = merge_lines(&[line(&ok.to_string(), 1), line(&bad.to_string(), 9)]);

        let result = plan(&lines, &[level(ok, "Mug", 10), level(bad, "Pan", 1)]);
        assert_eq!(result.unwrap_err().len(), 1);
    }

    #[test]
    fn test_product_ids_skip_invalid_lines() {
        let id = ProductId::generate();
        let lines = merge_lines(&[line("nope", 1), line(&id.to_string(), 1)]);
        assert_eq!(product_ids(&lines), vec![id]);
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(StockError::EmptyCart.to_string(), "Cart items are required");
        assert_eq!(
            StockError::InvalidRequest.to_string(),
            "Product ID and valid quantity are required"
        );
        assert_eq!(StockError::Validation(vec![]).to_string(), "Stock validation failed");
    }
}
