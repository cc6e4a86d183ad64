//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! shopdesk admin create -e admin@example.com -n "Admin Name" --password '...'
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPDESK_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//! - `ADMIN_EMAIL`, `ADMIN_NAME`, `ADMIN_PASSWORD` - defaults for the flags

use secrecy::{ExposeSecret, SecretString};
use shopdesk_core::{Email, UserId, UserRole};
use shopdesk_server::db::{self, RepositoryError, UserRepository};
use shopdesk_server::services::auth::{AuthError, hash_password, validate_password};
use thiserror::Error;

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error("Missing environment variable: DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("{0}")]
    Credentials(#[from] AuthError),

    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("{0}")]
    Repository(RepositoryError),
}

/// Create an active admin account.
///
/// Returns the ID of the created user.
pub async fn create_user(
    email: &str,
    name: &str,
    password: &SecretString,
) -> Result<UserId, AdminError> {
    let email = Email::parse(email).map_err(|_| AdminError::InvalidEmail(email.to_owned()))?;
    validate_password(password.expose_secret())?;
    let password_hash = hash_password(password.expose_secret())?;

    let database_url = super::database_url().ok_or(AdminError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    let user = UserRepository::new(&pool)
        .create(name.trim(), &email, &password_hash, UserRole::Admin)
        .await
        .map_err(|e| match e {
            RepositoryError::Conflict(_) => AdminError::UserExists(email.to_string()),
            other => AdminError::Repository(other),
        })?;

    tracing::info!(user_id = %user.id, email = %user.email, "Admin user created");
    Ok(user.id)
}
