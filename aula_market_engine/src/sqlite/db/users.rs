use am_common::Locale;
use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{NewUser, User},
    traits::ProfileApiError,
};

/// Inserts a new user into the database using the given connection. The email address must not already be in use.
pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, ProfileApiError> {
    if fetch_user_by_email(&user.email, conn).await?.is_some() {
        return Err(ProfileApiError::DuplicateEmail(user.email));
    }
    let user: User = sqlx::query_as(
        r#"
            INSERT INTO users (email, name, role, preferred_language) VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user.email)
    .bind(user.name)
    .bind(user.role.to_string())
    .bind(user.preferred_language.to_string())
    .fetch_one(conn)
    .await?;
    debug!("📝️ User [{}] inserted with id {}", user.email, user.id);
    Ok(user)
}

pub async fn fetch_user_by_id(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(user)
}

pub async fn fetch_user_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    let user = sqlx::query_as("SELECT * FROM users WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(user)
}

/// Stores a new language preference for the user. The value is a supported locale code by construction, so the
/// column's CHECK constraint never fires for engine-originated writes.
pub async fn update_preferred_language(
    user_id: i64,
    language: Locale,
    conn: &mut SqliteConnection,
) -> Result<User, ProfileApiError> {
    let user: Option<User> = sqlx::query_as(
        "UPDATE users SET preferred_language = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(language.to_string())
    .bind(user_id)
    .fetch_optional(conn)
    .await?;
    user.ok_or(ProfileApiError::UserNotFound(user_id))
}
