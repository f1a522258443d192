use am_common::Locale;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{Role, User};

/// The response to `profile` calls. A trimmed-down view of a user record, suitable for returning to the storefront.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub preferred_language: Locale,
    pub member_since: DateTime<Utc>,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            role: user.role,
            preferred_language: user.preferred_language,
            member_since: user.created_at,
        }
    }
}
