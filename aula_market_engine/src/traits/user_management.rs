use am_common::{Locale, UnsupportedLocaleError};
use thiserror::Error;

use crate::db_types::{NewUser, User};

#[derive(Debug, Clone, Error)]
pub enum ProfileApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("{0}")]
    UnsupportedLocale(#[from] UnsupportedLocaleError),
    #[error("The requested user {0} does not exist")]
    UserNotFound(i64),
    #[error("A user with email {0} already exists")]
    DuplicateEmail(String),
    #[error("{0} is not a valid email address")]
    InvalidEmail(String),
}

impl From<sqlx::Error> for ProfileApiError {
    fn from(e: sqlx::Error) -> Self {
        ProfileApiError::DatabaseError(e.to_string())
    }
}

/// The `UserManagement` trait defines behaviour for managing user accounts and their stored
/// preferences. The language preference drives every localized surface the marketplace renders,
/// so writes go through a single validated path.
#[allow(async_fn_in_trait)]
pub trait UserManagement {
    /// Stores a new user. The email must not belong to an existing user.
    async fn insert_user(&self, user: NewUser) -> Result<User, ProfileApiError>;

    /// Fetches the user with the given id. If no user exists, `None` is returned.
    async fn fetch_user_by_id(&self, user_id: i64) -> Result<Option<User>, ProfileApiError>;

    /// Fetches the user holding the given email address, if any.
    async fn fetch_user_by_email(&self, email: &str) -> Result<Option<User>, ProfileApiError>;

    /// Persists a new language preference for the user and returns the updated record.
    async fn update_preferred_language(&self, user_id: i64, language: Locale) -> Result<User, ProfileApiError>;
}
