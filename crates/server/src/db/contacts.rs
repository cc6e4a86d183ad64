//! Contact message repository.

use sqlx::PgPool;

use shopdesk_core::{ContactId, ContactStatus, UserId};

use super::RepositoryError;
use crate::models::ContactMessage;
use crate::models::contact::ContactCounts;

const CONTACT_COLUMNS: &str = r"
    id, user_id, name, email, subject, message, status, admin_notes,
    created_at, updated_at
";

/// A contact form submission ready to insert.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub user_id: UserId,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}

/// Repository for contact message database operations.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new message as unread.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, input: NewContactMessage) -> Result<ContactMessage, RepositoryError> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            r"
            INSERT INTO contact_messages (id, user_id, name, email, subject, message)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CONTACT_COLUMNS}
            "
        ))
        .bind(ContactId::generate())
        .bind(input.user_id)
        .bind(input.name)
        .bind(input.email)
        .bind(input.subject)
        .bind(input.message)
        .fetch_one(self.pool)
        .await?;

        Ok(message)
    }

    /// Messages sent by one user, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<ContactMessage>, RepositoryError> {
        let messages = sqlx::query_as::<_, ContactMessage>(&format!(
            r"
            SELECT {CONTACT_COLUMNS} FROM contact_messages
            WHERE user_id = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// All messages, newest first, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<ContactStatus>,
    ) -> Result<Vec<ContactMessage>, RepositoryError> {
        let messages = sqlx::query_as::<_, ContactMessage>(&format!(
            r"
            SELECT {CONTACT_COLUMNS} FROM contact_messages
            WHERE $1::contact_status IS NULL OR status = $1
            ORDER BY created_at DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        Ok(messages)
    }

    /// Message counts per status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn counts(&self) -> Result<ContactCounts, RepositoryError> {
        let counts = sqlx::query_as::<_, ContactCounts>(
            r"
            SELECT
                COUNT(*) FILTER (WHERE status = 'unread') AS unread,
                COUNT(*) FILTER (WHERE status = 'read') AS read,
                COUNT(*) FILTER (WHERE status = 'replied') AS replied,
                COUNT(*) AS total
            FROM contact_messages
            ",
        )
        .fetch_one(self.pool)
        .await?;

        Ok(counts)
    }

    /// Get a message by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: ContactId) -> Result<Option<ContactMessage>, RepositoryError> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            "SELECT {CONTACT_COLUMNS} FROM contact_messages WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(message)
    }

    /// Set a message's status, and its admin notes when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn update_status(
        &self,
        id: ContactId,
        status: ContactStatus,
        admin_notes: Option<&str>,
    ) -> Result<ContactMessage, RepositoryError> {
        let message = sqlx::query_as::<_, ContactMessage>(&format!(
            r"
            UPDATE contact_messages SET
                status = $2,
                admin_notes = COALESCE($3, admin_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CONTACT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .bind(admin_notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(message)
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: ContactId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
