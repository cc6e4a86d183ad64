//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! shopdesk migrate
//! ```
//!
//! # Environment Variables
//!
//! - `SHOPDESK_DATABASE_URL` or `DATABASE_URL` - `PostgreSQL` connection string
//!
//! Migrations are embedded from `crates/server/migrations/`.

use shopdesk_server::db::{self, MIGRATOR};
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Missing environment variable: DATABASE_URL")]
    MissingDatabaseUrl,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = super::database_url().ok_or(MigrationError::MissingDatabaseUrl)?;

    tracing::info!("Connecting to database...");
    let pool = db::create_pool(&database_url).await?;

    tracing::info!("Running migrations...");
    MIGRATOR.run(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
