//! Catalog management: products, categories and brands.

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use shopdesk_core::{BrandId, CategoryId, Money, MoneyError, ProductId};

use crate::db::RepositoryError;
use crate::db::catalog::{BrandRepository, CategoryRepository, TaxonomyChanges};
use crate::db::products::{NewProduct, ProductChanges, ProductFilter, ProductRepository};
use crate::models::product::{MAX_IMAGES, effective_availability};
use crate::models::{Brand, Category, Product};

/// Discount applied to new products that do not specify one.
pub const DEFAULT_DISCOUNT_PERCENT: Decimal = Decimal::TEN;

const MISSING_PRODUCT_FIELDS: &str =
    "Missing required fields: name, price, category, and description are mandatory.";

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Request failed validation.
    #[error("{0}")]
    Invalid(String),

    /// Entity does not exist.
    #[error("{0}")]
    NotFound(&'static str),

    /// Name already used by another entity of the same kind.
    #[error("{0}")]
    Duplicate(&'static str),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

fn invalid(message: &str) -> CatalogError {
    CatalogError::Invalid(message.to_owned())
}

// =============================================================================
// Products
// =============================================================================

/// Product fields as sent by the admin panel. Used for create and update.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
    #[serde(rename = "_type")]
    pub product_type: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub discounted_percentage: Option<Decimal>,
    pub stock: Option<i64>,
    pub category: Option<String>,
    pub brand: Option<String>,
    pub badge: Option<bool>,
    pub is_available: Option<bool>,
    pub offer: Option<bool>,
    pub images: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

fn text(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

fn price(value: Decimal) -> Result<Money, CatalogError> {
    Money::storable(value).map_err(|err| match err {
        MoneyError::Negative => invalid("Price cannot be negative"),
        MoneyError::TooLarge => invalid("Price is too large"),
    })
}

fn discount(value: Decimal) -> Result<Decimal, CatalogError> {
    if value < Decimal::ZERO || value > Decimal::ONE_HUNDRED {
        return Err(invalid("Discount percentage must be between 0 and 100"));
    }
    Ok(value)
}

fn stock(value: i64) -> Result<i32, CatalogError> {
    i32::try_from(value)
        .ok()
        .filter(|s| *s >= 0)
        .ok_or_else(|| invalid("Stock cannot be negative"))
}

fn images(value: Vec<String>) -> Result<Vec<String>, CatalogError> {
    let urls: Vec<String> = value
        .into_iter()
        .map(|url| url.trim().to_owned())
        .filter(|url| !url.is_empty())
        .collect();
    if urls.is_empty() {
        return Err(invalid("At least one product image is required"));
    }
    if urls.len() > MAX_IMAGES {
        return Err(invalid("A product can have at most 4 images"));
    }
    Ok(urls)
}

fn tags(value: Vec<String>) -> Vec<String> {
    value
        .into_iter()
        .map(|tag| tag.trim().to_owned())
        .filter(|tag| !tag.is_empty())
        .collect()
}

/// Validate a new product.
///
/// # Errors
///
/// Returns `CatalogError::Invalid` naming the first problem.
pub fn validate_new_product(input: ProductInput) -> Result<NewProduct, CatalogError> {
    let (Some(name), Some(raw_price), Some(category), Some(description)) = (
        text(input.name),
        input.price,
        text(input.category),
        text(input.description),
    ) else {
        return Err(invalid(MISSING_PRODUCT_FIELDS));
    };

    let stock = input.stock.map(stock).transpose()?.unwrap_or(0);

    Ok(NewProduct {
        product_type: text(input.product_type).unwrap_or_default(),
        name,
        description,
        price: price(raw_price)?,
        discounted_percentage: input
            .discounted_percentage
            .map(discount)
            .transpose()?
            .unwrap_or(DEFAULT_DISCOUNT_PERCENT),
        stock,
        category,
        brand: text(input.brand).unwrap_or_default(),
        badge: input.badge.unwrap_or(false),
        is_available: effective_availability(input.is_available.unwrap_or(true), stock),
        offer: input.offer.unwrap_or(false),
        images: images(input.images.unwrap_or_default())?,
        tags: input.tags.map(tags).unwrap_or_default(),
    })
}

/// Validate a partial product update. Absent or blank fields are left alone.
///
/// # Errors
///
/// Returns `CatalogError::Invalid` naming the first problem.
pub fn validate_product_changes(input: ProductInput) -> Result<ProductChanges, CatalogError> {
    Ok(ProductChanges {
        product_type: text(input.product_type),
        name: text(input.name),
        description: text(input.description),
        price: input.price.map(price).transpose()?,
        discounted_percentage: input.discounted_percentage.map(discount).transpose()?,
        stock: input.stock.map(stock).transpose()?,
        category: text(input.category),
        brand: text(input.brand),
        badge: input.badge,
        is_available: input.is_available,
        offer: input.offer,
        images: input.images.map(images).transpose()?,
        tags: input.tags.map(tags),
    })
}

/// Input for creating or editing a category or brand.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxonomyInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

impl TaxonomyInput {
    fn into_changes(self) -> TaxonomyChanges {
        TaxonomyChanges {
            name: text(self.name),
            description: self.description.map(|d| d.trim().to_owned()),
            website: self.website.map(|w| w.trim().to_owned()),
            image: self.image.map(|i| i.trim().to_owned()),
            is_active: self.is_active,
        }
    }
}

/// Labels used in taxonomy messages.
#[derive(Debug, Clone, Copy)]
struct Kind {
    name_required: &'static str,
    exists: &'static str,
    name_taken: &'static str,
    not_found: &'static str,
}

const CATEGORY: Kind = Kind {
    name_required: "Category name is required",
    exists: "Category already exists",
    name_taken: "Category name already exists",
    not_found: "Category not found",
};

const BRAND: Kind = Kind {
    name_required: "Brand name is required",
    exists: "Brand already exists",
    name_taken: "Brand name already exists",
    not_found: "Brand not found",
};

impl Kind {
    fn map(self, e: RepositoryError, conflict: &'static str) -> CatalogError {
        match e {
            RepositoryError::NotFound => CatalogError::NotFound(self.not_found),
            RepositoryError::Conflict(_) => CatalogError::Duplicate(conflict),
            other => CatalogError::Repository(other),
        }
    }
}

// =============================================================================
// Service
// =============================================================================

/// Catalog service.
pub struct CatalogService<'a> {
    products: ProductRepository<'a>,
    categories: CategoryRepository<'a>,
    brands: BrandRepository<'a>,
}

impl<'a> CatalogService<'a> {
    /// Create a new catalog service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            products: ProductRepository::new(pool),
            categories: CategoryRepository::new(pool),
            brands: BrandRepository::new(pool),
        }
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` if validation fails.
    #[tracing::instrument(skip(self, input))]
    pub async fn add_product(&self, input: ProductInput) -> Result<Product, CatalogError> {
        let product = self.products.create(validate_new_product(input)?).await?;
        tracing::info!(product_id = %product.id, name = %product.name, stock = product.stock, "Product added");
        Ok(product)
    }

    /// Edit a product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Invalid` if validation fails and
    /// `CatalogError::NotFound` if the product does not exist.
    #[tracing::instrument(skip(self, input))]
    pub async fn update_product(&self, id: ProductId, input: ProductInput) -> Result<Product, CatalogError> {
        let changes = validate_product_changes(input)?;
        let product = self.products.update(id, changes).await.map_err(product_not_found)?;
        tracing::info!(product_id = %product.id, stock = product.stock, "Product updated");
        Ok(product)
    }

    /// Delete a product. Orders keep their snapshots.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn remove_product(&self, id: ProductId) -> Result<(), CatalogError> {
        self.products.delete(id).await.map_err(product_not_found)?;
        tracing::info!(product_id = %id, "Product removed");
        Ok(())
    }

    /// One product.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the product does not exist.
    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound("Product not found"))
    }

    /// Products matching `filter`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn products(&self, filter: &ProductFilter) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.list(filter).await?)
    }

    // -------------------------------------------------------------------------
    // Categories
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `CatalogError::Duplicate` if the name is taken, ignoring case.
    pub async fn add_category(&self, input: TaxonomyInput) -> Result<Category, CatalogError> {
        let changes = input.into_changes();
        let name = changes.name.ok_or_else(|| invalid(CATEGORY.name_required))?;
        let category = self
            .categories
            .create(
                &name,
                changes.description.as_deref().unwrap_or_default(),
                changes.image.as_deref().unwrap_or_default(),
            )
            .await
            .map_err(|e| CATEGORY.map(e, CATEGORY.exists))?;
        tracing::info!(category_id = %category.id, name = %category.name, "Category created");
        Ok(category)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn categories(&self) -> Result<Vec<Category>, CatalogError> {
        Ok(self.categories.list_active().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the category does not exist.
    pub async fn category(&self, id: CategoryId) -> Result<Category, CatalogError> {
        self.categories
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(CATEGORY.not_found))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` or `CatalogError::Duplicate`.
    pub async fn update_category(&self, id: CategoryId, input: TaxonomyInput) -> Result<Category, CatalogError> {
        self.categories
            .update(id, input.into_changes())
            .await
            .map_err(|e| CATEGORY.map(e, CATEGORY.name_taken))
    }

    /// Soft-delete a category.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the category does not exist.
    pub async fn remove_category(&self, id: CategoryId) -> Result<(), CatalogError> {
        self.categories
            .deactivate(id)
            .await
            .map_err(|e| CATEGORY.map(e, CATEGORY.name_taken))
    }

    // -------------------------------------------------------------------------
    // Brands
    // -------------------------------------------------------------------------

    /// # Errors
    ///
    /// Returns `CatalogError::Duplicate` if the name is taken, ignoring case.
    pub async fn add_brand(&self, input: TaxonomyInput) -> Result<Brand, CatalogError> {
        let changes = input.into_changes();
        let name = changes.name.ok_or_else(|| invalid(BRAND.name_required))?;
        let brand = self
            .brands
            .create(
                &name,
                changes.description.as_deref().unwrap_or_default(),
                changes.website.as_deref().unwrap_or_default(),
                changes.image.as_deref().unwrap_or_default(),
            )
            .await
            .map_err(|e| BRAND.map(e, BRAND.exists))?;
        tracing::info!(brand_id = %brand.id, name = %brand.name, "Brand created");
        Ok(brand)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the query fails.
    pub async fn brands(&self) -> Result<Vec<Brand>, CatalogError> {
        Ok(self.brands.list_active().await?)
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the brand does not exist.
    pub async fn brand(&self, id: BrandId) -> Result<Brand, CatalogError> {
        self.brands
            .get_by_id(id)
            .await?
            .ok_or(CatalogError::NotFound(BRAND.not_found))
    }

    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` or `CatalogError::Duplicate`.
    pub async fn update_brand(&self, id: BrandId, input: TaxonomyInput) -> Result<Brand, CatalogError> {
        self.brands
            .update(id, input.into_changes())
            .await
            .map_err(|e| BRAND.map(e, BRAND.name_taken))
    }

    /// Soft-delete a brand.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if the brand does not exist.
    pub async fn remove_brand(&self, id: BrandId) -> Result<(), CatalogError> {
        self.brands
            .deactivate(id)
            .await
            .map_err(|e| BRAND.map(e, BRAND.name_taken))
    }
}

fn product_not_found(e: RepositoryError) -> CatalogError {
    match e {
        RepositoryError::NotFound => CatalogError::NotFound("Product not found"),
        other => CatalogError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn input(value: serde_json::Value) -> ProductInput {
        serde_json::from_value(value).unwrap()
    }

    fn lamp() -> serde_json::Value {
        json!({
            "_type": "home",
            "name": "Desk Lamp",
            "description": "Warm light",
            "price": 39.5,
            "category": "lighting",
            "stock": 12,
            "images": ["https://cdn.test/lamp.jpg"]
        })
    }

    #[test]
    fn test_new_product_defaults() {
        let product = validate_new_product(input(lamp())).unwrap();
        assert_eq!(product.discounted_percentage, Decimal::TEN);
        assert!(product.is_available);
        assert!(!product.offer);
        assert_eq!(product.product_type, "home");
    }

    #[test]
    fn test_new_product_requires_core_fields() {
        let mut body = lamp();
        body["description"] = json!("  ");
        let err = validate_new_product(input(body)).unwrap_err();
        assert_eq!(err.to_string(), MISSING_PRODUCT_FIELDS);
    }

    #[test]
    fn test_zero_stock_product_is_unavailable() {
        let mut body = lamp();
        body["stock"] = json!(0);
        body["isAvailable"] = json!(true);
        assert!(!validate_new_product(input(body)).unwrap().is_available);
    }

    #[test]
    fn test_image_count_is_bounded() {
        let mut body = lamp();
        body["images"] = json!([]);
        assert!(validate_new_product(input(body.clone())).is_err());

        body["images"] = json!(["a", "b", "c", "d", "e"]);
        let err = validate_new_product(input(body)).unwrap_err();
        assert_eq!(err.to_string(), "A product can have at most 4 images");
    }

    #[test]
    fn test_discount_range() {
        let mut body = lamp();
        body["discountedPercentage"] = json!(101);
        assert!(validate_new_product(input(body.clone())).is_err());
        body["discountedPercentage"] = json!(0);
        assert_eq!(
            validate_new_product(input(body)).unwrap().discounted_percentage,
            Decimal::ZERO
        );
    }

    #[test]
    fn test_price_bounds() {
        let mut body = lamp();
        body["price"] = json!("10000000000");
        let err = validate_new_product(input(body)).unwrap_err();
        assert_eq!(err.to_string(), "Price is too large");

        let err = validate_product_changes(input(json!({ "price": -1 }))).unwrap_err();
        assert_eq!(err.to_string(), "Price cannot be negative");

        let changes = validate_product_changes(input(json!({ "price": "9999999999.99" }))).unwrap();
        assert!(changes.price.is_some());
    }

    #[test]
    fn test_negative_stock_rejected() {
        let err = validate_product_changes(input(json!({ "stock": -1 }))).unwrap_err();
        assert_eq!(err.to_string(), "Stock cannot be negative");
    }

    #[test]
    fn test_changes_ignore_blank_text() {
        let changes = validate_product_changes(input(json!({ "name": " ", "brand": "Acme" }))).unwrap();
        assert!(changes.name.is_none());
        assert_eq!(changes.brand.as_deref(), Some("Acme"));
        assert!(changes.images.is_none());
    }

    #[test]
    fn test_taxonomy_conflict_messages() {
        let err = CATEGORY.map(RepositoryError::Conflict("category name".into()), CATEGORY.exists);
        assert_eq!(err.to_string(), "Category already exists");
        let err = BRAND.map(RepositoryError::NotFound, BRAND.name_taken);
        assert_eq!(err.to_string(), "Brand not found");
    }
}
