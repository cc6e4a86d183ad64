//! Authentication error types.
//!
//! The `Display` text of each client-facing variant is the message returned
//! in the response body.

use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("Please enter a valid email address")]
    InvalidEmail(#[from] shopdesk_core::EmailError),

    /// Password shorter than the minimum length.
    #[error("Password length should be equal or greater than 8")]
    WeakPassword,

    /// Wrong password.
    #[error("Invalid credentials, try again")]
    InvalidCredentials,

    /// No account with the given email.
    #[error("User doesn't exist")]
    UserNotFound,

    /// Email already registered.
    #[error("User already exists")]
    UserAlreadyExists,

    /// Account has been switched off by an admin.
    #[error("Account is deactivated")]
    AccountDeactivated,

    /// Caller is not an admin.
    #[error("Admin access required")]
    AdminRequired,

    /// No token on the request.
    #[error("Not Authorized, login required")]
    MissingToken,

    /// Token is malformed, tampered with, or expired.
    #[error("Invalid token")]
    InvalidToken,

    /// Token is valid but its account no longer exists.
    #[error("User not found")]
    TokenUserMissing,

    /// Token signing failed.
    #[error("token generation failed: {0}")]
    TokenGeneration(String),

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}
