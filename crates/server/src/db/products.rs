//! Product repository for catalog and stock operations.
//!
//! Stock is only ever decremented by a single conditional `UPDATE`, so two
//! concurrent sales of the last unit cannot both succeed.

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};

use shopdesk_core::{Money, ProductId};

use super::RepositoryError;
use crate::models::{Product, StockSnapshot};

const PRODUCT_COLUMNS: &str = r"
    id, product_type, name, description, price, discounted_percentage, stock,
    sold_quantity, category, brand, badge, is_available, offer, images, tags,
    created_at, updated_at
";

/// Decrement stock by `$2` if at least `$2` units remain.
///
/// All SET expressions see the pre-update row, so `stock - $2` is the new
/// stock and availability flips off exactly when it reaches zero.
const DECREMENT_SQL: &str = r"
    UPDATE products SET
        stock = stock - $2,
        sold_quantity = sold_quantity + $2,
        is_available = CASE WHEN stock - $2 = 0 THEN FALSE ELSE is_available END,
        updated_at = NOW()
    WHERE id = $1 AND stock >= $2
    RETURNING id, name, stock, sold_quantity, is_available
";

/// A validated product ready to insert.
#[derive(Debug, Clone)]
pub struct NewProduct {
    pub product_type: String,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub discounted_percentage: Decimal,
    pub stock: i32,
    pub category: String,
    pub brand: String,
    pub badge: bool,
    pub is_available: bool,
    pub offer: bool,
    pub images: Vec<String>,
    pub tags: Vec<String>,
}

/// Partial product update. Absent fields keep their value.
#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub product_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub discounted_percentage: Option<Decimal>,
    pub stock: Option<i32>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub badge: Option<bool>,
    pub is_available: Option<bool>,
    pub offer: Option<bool>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

/// Listing filters.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    pub product_type: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub offer_only: bool,
    pub include_unavailable: bool,
}

/// Stock level of a row locked for checkout.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct StockLevel {
    pub id: ProductId,
    pub name: String,
    pub stock: i32,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, product: NewProduct) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r"
            INSERT INTO products (
                id, product_type, name, description, price, discounted_percentage,
                stock, category, brand, badge, is_available, offer, images, tags
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(ProductId::generate())
        .bind(product.product_type)
        .bind(product.name)
        .bind(product.description)
        .bind(product.price)
        .bind(product.discounted_percentage)
        .bind(product.stock)
        .bind(product.category)
        .bind(product.brand)
        .bind(product.badge)
        .bind(product.is_available)
        .bind(product.offer)
        .bind(product.images)
        .bind(product.tags)
        .fetch_one(self.pool)
        .await?;

        Ok(row)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row)
    }

    /// List products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, filter: &ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            WHERE ($1 OR is_available)
              AND ($2::text IS NULL OR product_type = $2)
              AND ($3::text IS NULL OR brand = $3)
              AND ($4::text IS NULL OR category = $4)
              AND (NOT $5 OR offer)
            ORDER BY created_at DESC
            "
        ))
        .bind(filter.include_unavailable)
        .bind(filter.product_type.as_deref())
        .bind(filter.brand.as_deref())
        .bind(filter.category.as_deref())
        .bind(filter.offer_only)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Best sellers by units sold.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn top_selling(&self, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, Product>(&format!(
            r"
            SELECT {PRODUCT_COLUMNS} FROM products
            ORDER BY sold_quantity DESC, created_at DESC
            LIMIT $1
            "
        ))
        .bind(limit)
        .fetch_all(self.pool)
        .await?;

        Ok(rows)
    }

    /// Apply a partial update.
    ///
    /// Stock columns are updated in place rather than overwritten from a
    /// stale read, so an edit never undoes a concurrent sale. Availability is
    /// forced off when the resulting stock is zero.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r"
            UPDATE products SET
                product_type = COALESCE($2, product_type),
                name = COALESCE($3, name),
                description = COALESCE($4, description),
                price = COALESCE($5, price),
                discounted_percentage = COALESCE($6, discounted_percentage),
                stock = COALESCE($7, stock),
                category = COALESCE($8, category),
                brand = COALESCE($9, brand),
                badge = COALESCE($10, badge),
                is_available = CASE
                    WHEN COALESCE($7, stock) = 0 THEN FALSE
                    ELSE COALESCE($11, is_available)
                END,
                offer = COALESCE($12, offer),
                images = COALESCE($13, images),
                tags = COALESCE($14, tags),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.product_type)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.price)
        .bind(changes.discounted_percentage)
        .bind(changes.stock)
        .bind(changes.category)
        .bind(changes.brand)
        .bind(changes.badge)
        .bind(changes.is_available)
        .bind(changes.offer)
        .bind(changes.images)
        .bind(changes.tags)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ProductId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Whether a product exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Atomically take `quantity` units of one product.
    ///
    /// Returns `None` when the product is missing or has fewer than
    /// `quantity` units; nothing is changed in that case.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn decrement_stock(
        &self,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<StockSnapshot>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        Self::decrement_stock_in(&mut *conn, id, quantity).await
    }

    /// [`Self::decrement_stock`] on an existing connection or transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn decrement_stock_in(
        conn: &mut PgConnection,
        id: ProductId,
        quantity: i32,
    ) -> Result<Option<StockSnapshot>, RepositoryError> {
        let row = sqlx::query_as::<_, StockSnapshot>(DECREMENT_SQL)
            .bind(id)
            .bind(quantity)
            .fetch_optional(conn)
            .await?;

        Ok(row)
    }

    /// Lock product rows for a checkout and read their stock.
    ///
    /// Rows are locked in ID order so concurrent checkouts over overlapping
    /// products cannot deadlock. Missing IDs are simply absent from the result.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn lock_stock_levels(
        conn: &mut PgConnection,
        ids: &[ProductId],
    ) -> Result<Vec<StockLevel>, RepositoryError> {
        let rows = sqlx::query_as::<_, StockLevel>(
            r"
            SELECT id, name, stock FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(ids)
        .fetch_all(conn)
        .await?;

        Ok(rows)
    }
}
