//! Authentication service.
//!
//! Provides password login, registration and access tokens.

mod error;
mod token;

pub use error::AuthError;
pub use token::{Claims, TokenService};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use serde::Serialize;
use sqlx::PgPool;

use shopdesk_core::{Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::{CurrentUser, User};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// A signed-in caller: the token to send back and who it belongs to.
#[derive(Debug, Clone, Serialize)]
pub struct AuthSession {
    pub token: String,
    pub user: CurrentUser,
}

/// Authentication service.
///
/// Handles registration, password login and admin account creation.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
        }
    }

    /// Register a customer account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        let user = self.create_account(name, email, password, UserRole::User).await?;
        tracing::info!(user_id = %user.id, "User registered");
        self.session_for(&user)
    }

    /// Create an admin account. Does not sign it in.
    ///
    /// # Errors
    ///
    /// Same as [`Self::register`].
    pub async fn create_admin(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let user = self.create_account(name, email, password, UserRole::Admin).await?;
        tracing::info!(user_id = %user.id, "Admin account created");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account uses the email.
    /// Returns `AuthError::AccountDeactivated` if the account is switched off.
    /// Returns `AuthError::InvalidCredentials` if the password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self.check_password(email, password, false).await?;
        self.session_for(&user)
    }

    /// Sign in to the admin panel.
    ///
    /// # Errors
    ///
    /// As [`Self::login`], plus `AuthError::AdminRequired` for non-admin accounts.
    pub async fn admin_login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let user = self.check_password(email, password, true).await?;
        self.session_for(&user)
    }

    /// Resolve a token to an active account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidToken` if the token does not verify.
    /// Returns `AuthError::TokenUserMissing` if the account was deleted.
    /// Returns `AuthError::AccountDeactivated` if the account is switched off.
    pub async fn authenticate(&self, token: &str) -> Result<User, AuthError> {
        let claims = self.tokens.verify(token)?;
        let user = self
            .users
            .get_by_id(claims.id)
            .await?
            .ok_or(AuthError::TokenUserMissing)?;

        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }
        Ok(user)
    }

    async fn create_account(
        &self,
        name: &str,
        email: &str,
        password: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        self.users
            .create(name.trim(), &email, &password_hash, role)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })
    }

    async fn check_password(
        &self,
        email: &str,
        password: &str,
        require_admin: bool,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::UserNotFound)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if require_admin && user.role != UserRole::Admin {
            return Err(AuthError::AdminRequired);
        }
        if !user.is_active {
            return Err(AuthError::AccountDeactivated);
        }

        verify_password(password, &password_hash)?;

        self.users.touch_last_login(user.id).await?;
        tracing::info!(user_id = %user.id, admin = require_admin, "User logged in");

        Ok(user)
    }

    fn session_for(&self, user: &User) -> Result<AuthSession, AuthError> {
        Ok(AuthSession {
            token: self.tokens.issue(user)?,
            user: CurrentUser::from(user),
        })
    }
}

// =============================================================================
// Password Helpers
// =============================================================================

/// Reject passwords shorter than [`MIN_PASSWORD_LENGTH`].
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is too short.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_password_length() {
        assert!(matches!(validate_password("short"), Err(AuthError::WeakPassword)));
        assert!(validate_password("eightchr").is_ok());
    }

    #[test]
    fn test_hash_and_verify_password() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash).is_ok());
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash_password("same password").unwrap();
        let b = hash_password("same password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(AuthError::UserNotFound.to_string(), "User doesn't exist");
        assert_eq!(
            AuthError::WeakPassword.to_string(),
            "Password length should be equal or greater than 8"
        );
        assert_eq!(
            AuthError::MissingToken.to_string(),
            "Not Authorized, login required"
        );
    }
}
