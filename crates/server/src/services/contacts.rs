//! Contact form submissions and their admin triage.

use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use thiserror::Error;

use shopdesk_core::{ContactId, ContactStatus, Email, UserId};

use crate::db::RepositoryError;
use crate::db::contacts::{ContactRepository, NewContactMessage};
use crate::models::ContactMessage;
use crate::models::contact::ContactCounts;

/// Errors from contact operations.
#[derive(Debug, Error)]
pub enum ContactError {
    #[error("All fields are required")]
    MissingFields,

    #[error("Please provide a valid email address")]
    InvalidEmail,

    #[error("Invalid status value")]
    InvalidStatus,

    #[error("Contact message not found")]
    NotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ContactError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Repository(other),
        }
    }
}

/// Body of `POST /api/contact`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContactForm {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
}

/// Body of `PUT /api/contact/admin/{id}/status`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: Option<String>,
    pub admin_notes: Option<String>,
}

/// Admin inbox: messages plus counts across every status.
#[derive(Debug, Clone, Serialize)]
pub struct Inbox {
    pub data: Vec<ContactMessage>,
    pub counts: ContactCounts,
}

fn required(value: Option<String>) -> Result<String, ContactError> {
    value
        .map(|v| v.trim().to_owned())
        .filter(|v| !v.is_empty())
        .ok_or(ContactError::MissingFields)
}

/// Validate a contact form.
///
/// # Errors
///
/// Returns `ContactError::MissingFields` or `ContactError::InvalidEmail`.
pub fn validate_form(user_id: UserId, form: ContactForm) -> Result<NewContactMessage, ContactError> {
    let name = required(form.name)?;
    let email = required(form.email)?;
    let subject = required(form.subject)?;
    let message = required(form.message)?;

    let email = Email::parse(&email).map_err(|_| ContactError::InvalidEmail)?;

    Ok(NewContactMessage {
        user_id,
        name,
        email: email.to_string(),
        subject,
        message,
    })
}

fn parse_status(raw: &str) -> Result<ContactStatus, ContactError> {
    raw.trim().parse().map_err(|_| ContactError::InvalidStatus)
}

/// Contact service.
pub struct ContactService<'a> {
    contacts: ContactRepository<'a>,
}

impl<'a> ContactService<'a> {
    /// Create a new contact service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            contacts: ContactRepository::new(pool),
        }
    }

    /// Store a message from `user_id`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before anything is stored.
    #[tracing::instrument(skip(self, form))]
    pub async fn submit(&self, user_id: UserId, form: ContactForm) -> Result<ContactMessage, ContactError> {
        let message = self.contacts.create(validate_form(user_id, form)?).await?;
        tracing::info!(contact_id = %message.id, user_id = %user_id, "Contact message received");
        Ok(message)
    }

    /// Messages the caller has sent.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::Repository` if the query fails.
    pub async fn for_user(&self, user_id: UserId) -> Result<Vec<ContactMessage>, ContactError> {
        Ok(self.contacts.list_for_user(user_id).await?)
    }

    /// Every message, optionally filtered by status, with overall counts.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::InvalidStatus` for an unknown status filter.
    pub async fn inbox(&self, status: Option<&str>) -> Result<Inbox, ContactError> {
        let status = status
            .filter(|s| !s.trim().is_empty() && s.trim() != "all")
            .map(parse_status)
            .transpose()?;

        Ok(Inbox {
            data: self.contacts.list(status).await?,
            counts: self.contacts.counts().await?,
        })
    }

    /// # Errors
    ///
    /// Returns `ContactError::NotFound` if the message does not exist.
    pub async fn get(&self, id: ContactId) -> Result<ContactMessage, ContactError> {
        self.contacts.get_by_id(id).await?.ok_or(ContactError::NotFound)
    }

    /// Move a message to another status, optionally recording notes.
    ///
    /// # Errors
    ///
    /// Returns `ContactError::InvalidStatus` or `ContactError::NotFound`.
    pub async fn set_status(&self, id: ContactId, update: StatusUpdate) -> Result<ContactMessage, ContactError> {
        let status = parse_status(update.status.as_deref().unwrap_or_default())?;
        let message = self
            .contacts
            .update_status(id, status, update.admin_notes.as_deref().map(str::trim))
            .await?;
        tracing::info!(contact_id = %id, status = %status, "Contact status updated");
        Ok(message)
    }

    /// # Errors
    ///
    /// Returns `ContactError::NotFound` if the message does not exist.
    pub async fn delete(&self, id: ContactId) -> Result<(), ContactError> {
        self.contacts.delete(id).await?;
        tracing::info!(contact_id = %id, "Contact message deleted");
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form() -> ContactForm {
        ContactForm {
            name: Some("Ada".into()),
            email: Some(" Ada@Example.com ".into()),
            subject: Some("Order".into()),
            message: Some("Where is my parcel?".into()),
        }
    }

    #[test]
    fn test_valid_form_normalizes_email() {
        let message = validate_form(UserId::generate(), form()).unwrap();
        assert_eq!(message.email, "ada@example.com");
    }

    #[test]
    fn test_blank_field_rejected() {
        let err = validate_form(
            UserId::generate(),
            ContactForm {
                subject: Some("   ".into()),
                ..form()
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");
    }

    #[test]
    fn test_bad_email_rejected() {
        let err = validate_form(
            UserId::generate(),
            ContactForm {
                email: Some("not-an-email".into()),
                ..form()
            },
        )
        .unwrap_err();
        assert!(matches!(err, ContactError::InvalidEmail));
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!(parse_status("replied").unwrap(), ContactStatus::Replied);
        assert!(matches!(parse_status("archived"), Err(ContactError::InvalidStatus)));
        assert!(matches!(parse_status(""), Err(ContactError::InvalidStatus)));
    }
}
