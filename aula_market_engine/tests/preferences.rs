use aula_market_engine::{
    db_types::*,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{MarketplaceDatabase, ProfileApiError},
    ProfileApi,
    SqliteDatabase,
};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

async fn setup() -> ProfileApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");
    ProfileApi::new(db)
}

async fn tear_down(api: ProfileApi<SqliteDatabase>) {
    let mut db = api.db().clone();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(db.url()).await.unwrap();
}

#[test]
fn new_users_default_to_english() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let user = api.create_user(NewUser::new("alice@example.com", "Alice")).await.expect("Error creating user");
        assert_eq!(user.preferred_language, Locale::En);
        assert_eq!(user.role, Role::Customer);

        let profile = api.profile(user.id).await.expect("Error fetching profile");
        assert_eq!(profile.email, "alice@example.com");
        assert_eq!(profile.name, "Alice");
        assert_eq!(profile.preferred_language, Locale::En);

        let lang = api.preferred_language(user.id).await.expect("Error fetching language");
        assert_eq!(lang, Locale::En);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn users_can_sign_up_in_their_own_language() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let user = api
            .create_user(NewUser::new("carmen@example.com", "Carmen").with_language(Locale::Es))
            .await
            .expect("Error creating user");
        assert_eq!(user.preferred_language, Locale::Es);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn language_preference_round_trips() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let user = api.create_user(NewUser::new("alice@example.com", "Alice")).await.expect("Error creating user");

        let updated = api.update_preferred_language(user.id, "es").await.expect("Error updating language");
        assert_eq!(updated.preferred_language, Locale::Es);
        assert_eq!(api.preferred_language(user.id).await.unwrap(), Locale::Es);

        // Codes are case-insensitive and may carry whitespace
        let updated = api.update_preferred_language(user.id, " EN ").await.expect("Error updating language");
        assert_eq!(updated.preferred_language, Locale::En);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn unknown_language_codes_are_rejected() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let user = api.create_user(NewUser::new("alice@example.com", "Alice")).await.expect("Error creating user");
        let err = api.update_preferred_language(user.id, "fr").await.unwrap_err();
        assert!(matches!(err, ProfileApiError::UnsupportedLocale(_)));
        // The stored preference is untouched
        assert_eq!(api.preferred_language(user.id).await.unwrap(), Locale::En);
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn duplicate_and_malformed_emails_are_rejected() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        api.create_user(NewUser::new("alice@example.com", "Alice")).await.expect("Error creating user");

        let err = api.create_user(NewUser::new("alice@example.com", "Impostor")).await.unwrap_err();
        assert!(matches!(err, ProfileApiError::DuplicateEmail(_)));

        let err = api.create_user(NewUser::new("not-an-email", "Nobody")).await.unwrap_err();
        assert!(matches!(err, ProfileApiError::InvalidEmail(_)));
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn users_can_be_looked_up_by_email() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let user = api.create_user(NewUser::new("alice@example.com", "Alice")).await.expect("Error creating user");

        let found = api.user_by_email("alice@example.com").await.expect("Error fetching user");
        assert_eq!(found.map(|u| u.id), Some(user.id));
        let missing = api.user_by_email("nobody@example.com").await.expect("Error fetching user");
        assert!(missing.is_none());

        let err = api.profile(999).await.unwrap_err();
        assert!(matches!(err, ProfileApiError::UserNotFound(999)));
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}
