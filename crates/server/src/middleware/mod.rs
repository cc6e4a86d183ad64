//! Request extractors shared by the route handlers.
//!
//! Authentication is declarative: a handler that takes [`RequireUser`] or
//! [`RequireAdmin`] only runs for a caller with a valid token, an existing
//! account and (for admin routes) the admin role.

mod auth;

pub use auth::{RequireAdmin, RequireUser, bearer_token};
