//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Service errors convert into
//! `AppError` with `?`, and each one maps to a status code and a
//! `{"success": false, "message": ...}` body. Server errors are captured to
//! Sentry and their details are never sent to the client.

use axum::{
    Json,
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::models::AddressBookError;
use crate::services::accounts::AccountError;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::contacts::ContactError;
use crate::services::orders::OrderError;
use crate::services::stock::StockError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Stock(#[from] StockError),

    #[error(transparent)]
    Account(#[from] AccountError),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error(transparent)]
    Contact(#[from] ContactError),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("{0}")]
    BadRequest(String),
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a [String]>,
}

const fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidEmail(_) | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
        AuthError::InvalidCredentials
        | AuthError::UserNotFound
        | AuthError::MissingToken
        | AuthError::InvalidToken
        | AuthError::TokenUserMissing => StatusCode::UNAUTHORIZED,
        AuthError::AccountDeactivated | AuthError::AdminRequired => StatusCode::FORBIDDEN,
        AuthError::UserAlreadyExists => StatusCode::CONFLICT,
        AuthError::TokenGeneration(_) | AuthError::Repository(_) | AuthError::PasswordHash => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Auth(err) => auth_status(err),
            Self::Order(err) => match err {
                OrderError::Validation(_)
                | OrderError::MissingAddressFields(_)
                | OrderError::AmountMismatch => StatusCode::BAD_REQUEST,
                OrderError::NotFound | OrderError::UserNotFound => StatusCode::NOT_FOUND,
                OrderError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Stock(err) => match err {
                StockError::EmptyCart | StockError::InvalidRequest => StatusCode::BAD_REQUEST,
                StockError::ProductNotFound => StatusCode::NOT_FOUND,
                StockError::Insufficient | StockError::Validation(_) => StatusCode::CONFLICT,
                StockError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Account(err) => match err {
                AccountError::InvalidEmail(_)
                | AccountError::MissingItem
                | AccountError::InvalidRole
                | AccountError::Address(AddressBookError::MissingFields) => StatusCode::BAD_REQUEST,
                AccountError::UserNotFound | AccountError::Address(AddressBookError::NotFound) => {
                    StatusCode::NOT_FOUND
                }
                AccountError::EmailTaken => StatusCode::CONFLICT,
                AccountError::Auth(inner) => auth_status(inner),
                AccountError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Catalog(err) => match err {
                CatalogError::Invalid(_) => StatusCode::BAD_REQUEST,
                CatalogError::NotFound(_) => StatusCode::NOT_FOUND,
                CatalogError::Duplicate(_) => StatusCode::CONFLICT,
                CatalogError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            Self::Contact(err) => match err {
                ContactError::MissingFields
                | ContactError::InvalidEmail
                | ContactError::InvalidStatus => StatusCode::BAD_REQUEST,
                ContactError::NotFound => StatusCode::NOT_FOUND,
                ContactError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        let errors = match &self {
            Self::Stock(StockError::Validation(errors)) => Some(errors.as_slice()),
            _ => None,
        };

        let body = ErrorBody {
            success: false,
            message: &message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// JSON body extractor whose rejections use the API error shape.
#[derive(Debug, Clone, Copy, Default, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Set the Sentry user context for the authenticated caller.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::Value;

    use super::*;

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Order not found".to_string());
        assert_eq!(err.to_string(), "Order not found");

        let err = AppError::from(StockError::EmptyCart);
        assert_eq!(err.to_string(), "Cart items are required");
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: impl Into<AppError>) -> StatusCode {
            err.into().into_response().status()
        }

        assert_eq!(get_status(AppError::NotFound("x".into())), StatusCode::NOT_FOUND);
        assert_eq!(get_status(AuthError::MissingToken), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AuthError::InvalidToken), StatusCode::UNAUTHORIZED);
        assert_eq!(get_status(AuthError::AdminRequired), StatusCode::FORBIDDEN);
        assert_eq!(get_status(AuthError::AccountDeactivated), StatusCode::FORBIDDEN);
        assert_eq!(get_status(OrderError::AmountMismatch), StatusCode::BAD_REQUEST);
        assert_eq!(get_status(OrderError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(get_status(StockError::Insufficient), StatusCode::CONFLICT);
        assert_eq!(get_status(StockError::Validation(vec![])), StatusCode::CONFLICT);
        assert_eq!(get_status(AccountError::EmailTaken), StatusCode::CONFLICT);
        assert_eq!(
            get_status(AccountError::Address(AddressBookError::NotFound)),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AccountError::Auth(AuthError::UserAlreadyExists)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(CatalogError::Duplicate("Brand already exists")),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(RepositoryError::NotFound),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let body = body_json(AppError::from(OrderError::NotFound).into_response()).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Order not found");
        assert!(body.get("errors").is_none());
    }

    #[tokio::test]
    async fn test_stock_validation_lists_every_error() {
        let err = StockError::Validation(vec![
            "Invalid product or quantity".to_string(),
            "Product not found: abc".to_string(),
        ]);
        let body = body_json(AppError::from(err).into_response()).await;
        assert_eq!(body["message"], "Stock validation failed");
        assert_eq!(body["errors"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_internal_details_are_hidden() {
        let err = AppError::Database(RepositoryError::DataCorruption("secret table".into()));
        let body = body_json(err.into_response()).await;
        assert_eq!(body["message"], "Internal server error");
    }
}
