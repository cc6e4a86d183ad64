//! Category and brand repositories.
//!
//! Both tables enforce case-insensitive unique names through a `LOWER(name)`
//! index; deletes only clear `is_active`.

use sqlx::PgPool;

use shopdesk_core::{BrandId, CategoryId};

use super::RepositoryError;
use crate::models::{Brand, Category};

const CATEGORY_COLUMNS: &str = "id, name, description, image, is_active, created_at, updated_at";
const BRAND_COLUMNS: &str =
    "id, name, description, website, image, is_active, created_at, updated_at";

/// Fields accepted when creating or editing a category or brand.
///
/// On update, absent fields keep their value. `website` is ignored for
/// categories.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
}

// =============================================================================
// Categories
// =============================================================================

/// Repository for category database operations.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken, ignoring case.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        image: &str,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r"
            INSERT INTO categories (id, name, description, image)
            VALUES ($1, $2, $3, $4)
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(CategoryId::generate())
        .bind(name)
        .bind(description)
        .bind(image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category name"))?;

        Ok(category)
    }

    /// Get a category by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(category)
    }

    /// Active categories, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Category>, RepositoryError> {
        let categories = sqlx::query_as::<_, Category>(&format!(
            r"
            SELECT {CATEGORY_COLUMNS} FROM categories
            WHERE is_active
            ORDER BY created_at DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(categories)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: CategoryId,
        changes: TaxonomyChanges,
    ) -> Result<Category, RepositoryError> {
        let category = sqlx::query_as::<_, Category>(&format!(
            r"
            UPDATE categories SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                image = COALESCE($4, image),
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CATEGORY_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.image)
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "category name"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(category)
    }

    /// Deactivate a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the category does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(&self, id: CategoryId) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE categories SET is_active = FALSE, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

// =============================================================================
// Brands
// =============================================================================

/// Repository for brand database operations.
pub struct BrandRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BrandRepository<'a> {
    /// Create a new brand repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the name is taken, ignoring case.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(
        &self,
        name: &str,
        description: &str,
        website: &str,
        image: &str,
    ) -> Result<Brand, RepositoryError> {
        let brand = sqlx::query_as::<_, Brand>(&format!(
            r"
            INSERT INTO brands (id, name, description, website, image)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {BRAND_COLUMNS}
            "
        ))
        .bind(BrandId::generate())
        .bind(name)
        .bind(description)
        .bind(website)
        .bind(image)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "brand name"))?;

        Ok(brand)
    }

    /// Get a brand by ID, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BrandId) -> Result<Option<Brand>, RepositoryError> {
        let brand = sqlx::query_as::<_, Brand>(&format!(
            "SELECT {BRAND_COLUMNS} FROM brands WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(brand)
    }

    /// Active brands, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Brand>, RepositoryError> {
        let brands = sqlx::query_as::<_, Brand>(&format!(
            r"
            SELECT {BRAND_COLUMNS} FROM brands
            WHERE is_active
            ORDER BY created_at DESC
            "
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(brands)
    }

    /// Apply a partial update.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand does not exist.
    /// Returns `RepositoryError::Conflict` if the new name is taken.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update(
        &self,
        id: BrandId,
        changes: TaxonomyChanges,
    ) -> Result<Brand, RepositoryError> {
        let brand = sqlx::query_as::<_, Brand>(&format!(
            r"
            UPDATE brands SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                website = COALESCE($4, website),
                image = COALESCE($5, image),
                is_active = COALESCE($6, is_active),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BRAND_COLUMNS}
            "
        ))
        .bind(id)
        .bind(changes.name)
        .bind(changes.description)
        .bind(changes.website)
        .bind(changes.image)
        .bind(changes.is_active)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "brand name"))?
        .ok_or(RepositoryError::NotFound)?;

        Ok(brand)
    }

    /// Deactivate a brand.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the brand does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn deactivate(&self, id: BrandId) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE brands SET is_active = FALSE, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
