//! Unifies API for accessing user profiles and language preferences.

use std::fmt::Debug;

use am_common::Locale;
use log::*;

use crate::{
    ame_api::profile_objects::UserProfile,
    db_types::{NewUser, User},
    helpers::is_valid_email,
    traits::{ProfileApiError, UserManagement},
};

/// The `ProfileApi` provides a unified API for managing user accounts and their language preferences.
pub struct ProfileApi<B> {
    db: B,
}

impl<B: Debug> Debug for ProfileApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProfileApi ({:?})", self.db)
    }
}

impl<B> ProfileApi<B>
where B: UserManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Registers a new user account.
    ///
    /// The email address is syntax-checked before it goes anywhere near the database, and must not already be in use.
    /// New accounts default to the `en` locale unless the [`NewUser`] says otherwise.
    pub async fn create_user(&self, user: NewUser) -> Result<User, ProfileApiError> {
        if !is_valid_email(&user.email) {
            return Err(ProfileApiError::InvalidEmail(user.email));
        }
        let user = self.db.insert_user(user).await?;
        debug!("🧑️ New user #{} registered with email {}", user.id, user.email);
        Ok(user)
    }

    /// Fetches the profile view for the given user id.
    pub async fn profile(&self, user_id: i64) -> Result<UserProfile, ProfileApiError> {
        let user = self.db.fetch_user_by_id(user_id).await?.ok_or(ProfileApiError::UserNotFound(user_id))?;
        Ok(UserProfile::from(user))
    }

    /// Fetches the user record for the given email address, if one exists.
    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, ProfileApiError> {
        self.db.fetch_user_by_email(email).await
    }

    /// Updates the user's preferred language and returns the refreshed profile.
    ///
    /// `language` is the raw string from the storefront (e.g. `"es"`). It is validated against the supported locale
    /// list before being stored, so the preference column only ever holds codes the formatting layer understands.
    pub async fn update_preferred_language(&self, user_id: i64, language: &str) -> Result<UserProfile, ProfileApiError> {
        let locale = language.parse::<Locale>()?;
        let user = self.db.update_preferred_language(user_id, locale).await?;
        debug!("🧑️ User #{user_id} switched their language preference to {locale}");
        Ok(UserProfile::from(user))
    }

    /// Fetches the user's preferred language.
    pub async fn preferred_language(&self, user_id: i64) -> Result<Locale, ProfileApiError> {
        let user = self.db.fetch_user_by_id(user_id).await?.ok_or(ProfileApiError::UserNotFound(user_id))?;
        Ok(user.preferred_language)
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}
