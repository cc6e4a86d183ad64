//! Account self-service and user administration.
//!
//! Covers profiles, carts, address books and the admin user screens.
//! Cart and address-book edits go through a locked read-modify-write of the
//! user row so concurrent edits never interleave.

use serde::Deserialize;
use sqlx::PgPool;
use thiserror::Error;

use shopdesk_core::{AddressId, Email, EmailError, ProductId, UserId, UserRole};

use super::auth::{AuthError, AuthService, TokenService, hash_password, validate_password};
use crate::db::RepositoryError;
use crate::db::users::{AccountChanges, UserRepository};
use crate::models::{Address, AddressBook, AddressBookError, AddressInput, Cart, User};

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Email is malformed.
    #[error("Please enter a valid email address")]
    InvalidEmail(#[from] EmailError),

    /// Another account already uses the email.
    #[error("Email is already taken by another user")]
    EmailTaken,

    /// No such account.
    #[error("User not found")]
    UserNotFound,

    /// Cart request without a product.
    #[error("Item ID is required")]
    MissingItem,

    /// Role filter or role change names an unknown role.
    #[error("Invalid role")]
    InvalidRole,

    /// Address book rule violated.
    #[error(transparent)]
    Address(#[from] AddressBookError),

    /// Credential rule violated while creating or updating an account.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for AccountError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::UserNotFound,
            RepositoryError::Conflict(_) => Self::EmailTaken,
            other => Self::Repository(other),
        }
    }
}

/// Body of `PUT /api/user/profile`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
}

/// Body of the admin `PUT /api/user/update/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminUserUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
    pub password: Option<String>,
}

/// Body of the cart endpoints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: Option<String>,
    pub size: Option<String>,
    pub quantity: Option<i64>,
}

impl CartLine {
    fn key(&self) -> Result<String, AccountError> {
        let id = self
            .item_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or(AccountError::MissingItem)?
            .parse::<ProductId>()
            .map_err(|_| AccountError::MissingItem)?;
        Ok(Cart::line_key(id, self.size.as_deref()))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Account service.
pub struct AccountService<'a> {
    pool: &'a PgPool,
    users: UserRepository<'a>,
}

impl<'a> AccountService<'a> {
    /// Create a new account service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            pool,
            users: UserRepository::new(pool),
        }
    }

    /// Load an account.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` if the account does not exist.
    pub async fn get(&self, id: UserId) -> Result<User, AccountError> {
        self.users.get_by_id(id).await?.ok_or(AccountError::UserNotFound)
    }

    /// Update the caller's own name, email and avatar.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail` for a malformed email and
    /// `AccountError::EmailTaken` if another account uses it.
    #[tracing::instrument(skip(self, update))]
    pub async fn update_profile(&self, id: UserId, update: ProfileUpdate) -> Result<User, AccountError> {
        let changes = AccountChanges {
            name: non_blank(update.name),
            email: non_blank(update.email).map(|e| Email::parse(&e)).transpose()?,
            avatar: update.avatar.map(|a| a.trim().to_owned()),
            ..AccountChanges::default()
        };

        let user = self.users.update(id, changes).await?;
        tracing::info!(user_id = %user.id, "Profile updated");
        Ok(user)
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Add units of a product (and optional size) to the cart.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::MissingItem` if no valid item ID is given.
    pub async fn add_to_cart(&self, id: UserId, line: CartLine) -> Result<Cart, AccountError> {
        let key = line.key()?;
        let quantity = line
            .quantity
            .filter(|q| *q > 0)
            .map_or(1, |q| u32::try_from(q).unwrap_or(u32::MAX));

        let (_, cart) = self
            .users
            .update_cart(id, |cart| Ok::<_, AccountError>(cart.add(key, quantity)))
            .await?;
        Ok(cart)
    }

    /// Overwrite a cart line's quantity; zero or less removes it.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::MissingItem` if no valid item ID is given.
    pub async fn update_cart(&self, id: UserId, line: CartLine) -> Result<Cart, AccountError> {
        let key = line.key()?;
        let quantity = line.quantity.unwrap_or(0);

        let ((), cart) = self
            .users
            .update_cart(id, |cart| {
                cart.set(key, quantity);
                Ok::<_, AccountError>(())
            })
            .await?;
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` if the account does not exist.
    pub async fn clear_cart(&self, id: UserId) -> Result<(), AccountError> {
        self.users
            .update_cart(id, |cart| {
                cart.clear();
                Ok::<_, AccountError>(())
            })
            .await?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Address book
    // -------------------------------------------------------------------------

    /// Add an address. The first address becomes the default.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` if a required field is missing.
    #[tracing::instrument(skip(self, input))]
    pub async fn add_address(
        &self,
        id: UserId,
        input: AddressInput,
    ) -> Result<(Address, AddressBook), AccountError> {
        let result = self
            .users
            .update_addresses(id, |book| Ok::<_, AccountError>(book.add(input)?.clone()))
            .await?;
        tracing::info!(user_id = %id, address_id = %result.0.id, "Address added");
        Ok(result)
    }

    /// Edit an address. Blank fields are ignored.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` if the address does not exist.
    pub async fn update_address(
        &self,
        id: UserId,
        address_id: AddressId,
        input: AddressInput,
    ) -> Result<(Address, AddressBook), AccountError> {
        self.users
            .update_addresses(id, |book| {
                Ok::<_, AccountError>(book.update(address_id, input)?.clone())
            })
            .await
    }

    /// Delete an address, promoting another to default if needed.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` if the address does not exist.
    pub async fn remove_address(
        &self,
        id: UserId,
        address_id: AddressId,
    ) -> Result<AddressBook, AccountError> {
        let (_, book) = self
            .users
            .update_addresses(id, |book| Ok::<_, AccountError>(book.remove(address_id)?))
            .await?;
        Ok(book)
    }

    /// Make one address the default.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Address` if the address does not exist.
    pub async fn set_default_address(
        &self,
        id: UserId,
        address_id: AddressId,
    ) -> Result<AddressBook, AccountError> {
        let ((), book) = self
            .users
            .update_addresses(id, |book| Ok::<_, AccountError>(book.set_default(address_id)?))
            .await?;
        Ok(book)
    }

    // -------------------------------------------------------------------------
    // Administration
    // -------------------------------------------------------------------------

    /// List accounts, optionally restricted to one role.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidRole` for an unknown role filter.
    pub async fn list(&self, role: Option<&str>) -> Result<Vec<User>, AccountError> {
        let role = role
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .map(str::parse::<UserRole>)
            .transpose()
            .map_err(|_| AccountError::InvalidRole)?;
        Ok(self.users.list(role).await?)
    }

    /// Delete an account. Its orders are kept.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::UserNotFound` if the account does not exist.
    #[tracing::instrument(skip(self))]
    pub async fn remove(&self, id: UserId) -> Result<(), AccountError> {
        self.users.delete(id).await?;
        tracing::info!(user_id = %id, "User deleted");
        Ok(())
    }

    /// Apply an admin edit, re-hashing the password when one is given.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::InvalidEmail`, `AccountError::InvalidRole` or a
    /// weak-password `AccountError::Auth` before writing anything.
    #[tracing::instrument(skip(self, update))]
    pub async fn admin_update(&self, id: UserId, update: AdminUserUpdate) -> Result<User, AccountError> {
        let password_hash = match non_blank(update.password) {
            Some(password) => {
                validate_password(&password)?;
                Some(hash_password(&password)?)
            }
            None => None,
        };

        let changes = AccountChanges {
            name: non_blank(update.name),
            email: non_blank(update.email).map(|e| Email::parse(&e)).transpose()?,
            avatar: update.avatar.map(|a| a.trim().to_owned()),
            role: non_blank(update.role)
                .map(|r| r.parse::<UserRole>())
                .transpose()
                .map_err(|_| AccountError::InvalidRole)?,
            is_active: update.is_active,
            password_hash,
        };

        let user = self.users.update(id, changes).await?;
        tracing::info!(user_id = %user.id, role = %user.role, active = user.is_active, "User updated");
        Ok(user)
    }

    /// Create another admin account.
    ///
    /// # Errors
    ///
    /// Returns `AccountError::Auth` for invalid credentials or an email
    /// already in use.
    pub async fn create_admin(
        &self,
        tokens: &TokenService,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AccountError> {
        Ok(AuthService::new(self.pool, tokens)
            .create_admin(name, email, password)
            .await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_line_key_requires_valid_item() {
        let missing = CartLine::default();
        assert!(matches!(missing.key(), Err(AccountError::MissingItem)));

        let garbage = CartLine {
            item_id: Some("sku-1".to_owned()),
            ..CartLine::default()
        };
        assert!(matches!(garbage.key(), Err(AccountError::MissingItem)));
    }

    #[test]
    fn test_cart_line_key_includes_size() {
        let id = ProductId::generate();
        let line = CartLine {
            item_id: Some(id.to_string()),
            size: Some("XL".to_owned()),
            quantity: Some(2),
        };
        assert_eq!(line.key().unwrap(), format!("{id}_XL"));
    }

    #[test]
    fn test_repository_errors_map_to_account_errors() {
        assert!(matches!(
            AccountError::from(RepositoryError::NotFound),
            AccountError::UserNotFound
        ));
        assert!(matches!(
            AccountError::from(RepositoryError::Conflict("email".to_owned())),
            AccountError::EmailTaken
        ));
    }

    #[test]
    fn test_address_errors_keep_their_message() {
        assert_eq!(
            AccountError::from(AddressBookError::NotFound).to_string(),
            "Address not found"
        );
    }
}
