use aula_market_engine::{
    booking::Availability,
    config::EngineConfig,
    db_types::*,
    events::EventProducers,
    test_utils::prepare_env::{prepare_test_env, random_db_path},
    traits::{CatalogApiError, MarketplaceDatabase},
    CatalogApi,
    OrderFlowApi,
    ProfileApi,
    SqliteDatabase,
};
use chrono::{Duration, Utc};
use log::*;
use sqlx::{migrate::MigrateDatabase, Sqlite};
use tokio::runtime::Runtime;

async fn setup() -> CatalogApi<SqliteDatabase> {
    let url = random_db_path();
    prepare_test_env(&url).await;
    let db = SqliteDatabase::new_with_url(&url, 1).await.expect("Error creating database");
    CatalogApi::new(db)
}

async fn tear_down(api: CatalogApi<SqliteDatabase>) {
    let mut db = api.db().clone();
    if let Err(e) = db.close().await {
        error!("🚀️ Failed to close database: {e}");
    }
    Sqlite::drop_database(db.url()).await.unwrap();
}

#[test]
fn slugs_are_generated_from_titles() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let course =
            api.add_course(NewCourse::new("Rust for Beginners", Cents::from(4599))).await.expect("Error adding course");
        assert_eq!(course.slug, "rust-for-beginners");

        let course = api
            .add_course(NewCourse::new("Programación 101", Cents::from(2999)))
            .await
            .expect("Error adding course");
        assert_eq!(course.slug, "programación-101");

        let course = api
            .add_course(NewCourse::new("Advanced Rust", Cents::from(7999)).with_slug("rust-level-2"))
            .await
            .expect("Error adding course");
        assert_eq!(course.slug, "rust-level-2");
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn bad_listings_are_rejected() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let err = api.add_course(NewCourse::new("Freebie", Cents::from(-100))).await.unwrap_err();
        assert!(matches!(err, CatalogApiError::InvalidListing(_)));

        let err = api.add_course(NewCourse::new("  ", Cents::from(1000))).await.unwrap_err();
        assert!(matches!(err, CatalogApiError::InvalidListing(_)));

        let err =
            api.add_product(NewProduct::new("Mug", Cents::from(1500)).with_currency("XXX")).await.unwrap_err();
        assert!(matches!(err, CatalogApiError::InvalidListing(_)));

        let starts_at = Utc::now() + Duration::days(7);
        let err = api
            .add_event_listing(NewEventListing::new("Ghost Event", Cents::from(1000), starts_at, -5))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogApiError::InvalidListing(_)));
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn course_details_render_prices_for_the_locale() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let course = api
            .add_course(
                NewCourse::new("Rust for Beginners", Cents::from(4599))
                    .with_description("Ownership, borrowing and the rest."),
            )
            .await
            .expect("Error adding course");

        let detail = api.course_detail(course.id, Locale::En).await.expect("Error fetching detail");
        assert_eq!(detail.display_price, "$45.99");
        assert_eq!(detail.slug, "rust-for-beginners");
        assert_eq!(detail.description.as_deref(), Some("Ownership, borrowing and the rest."));

        let detail = api.course_detail(course.id, Locale::Es).await.expect("Error fetching detail");
        assert_eq!(detail.display_price, "45,99 $");

        let err = api.course_detail(999, Locale::En).await.unwrap_err();
        assert!(matches!(err, CatalogApiError::CourseNotFound(999)));
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn event_details_track_availability_as_seats_sell() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let starts_at = Utc::now() + Duration::days(7);
        let event = api
            .add_event_listing(
                NewEventListing::new("Taller de Rust", Cents::from(2500), starts_at, 8).with_currency("EUR"),
            )
            .await
            .expect("Error adding event");

        let detail = api.event_detail(event.id, Locale::Es).await.expect("Error fetching detail");
        assert_eq!(detail.availability, Availability::Available);
        assert_eq!(detail.capacity_percent, 100.0);
        assert_eq!(detail.booking_url, "/events/taller-de-rust/book");
        assert_eq!(detail.booking_label, "Reservar ahora");
        assert_eq!(detail.display_price, "25,00 €");

        // Sell 7 of the 8 seats, putting the event into the limited band
        let orders = OrderFlowApi::new(api.db().clone(), EngineConfig::default(), EventProducers::default());
        let alice = ProfileApi::new(api.db().clone())
            .create_user(NewUser::new("alice@example.com", "Alice"))
            .await
            .expect("Error creating user");
        orders.process_new_order(NewOrder::new(alice.id).with_event(event.id, 7)).await.expect("Error booking seats");

        let detail = api.event_detail(event.id, Locale::Es).await.expect("Error fetching detail");
        assert_eq!(detail.availability, Availability::Limited);
        assert_eq!(detail.capacity_percent, 12.5);
        assert_eq!(detail.booking_label, "Quedan pocas plazas");

        // And the last one
        orders.process_new_order(NewOrder::new(alice.id).with_event(event.id, 1)).await.expect("Error booking seats");
        let detail = api.event_detail(event.id, Locale::En).await.expect("Error fetching detail");
        assert_eq!(detail.availability, Availability::SoldOut);
        assert_eq!(detail.capacity_percent, 0.0);
        assert_eq!(detail.booking_label, "Sold out");
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}

#[test]
fn products_can_be_fetched_by_id() {
    let sys = Runtime::new().unwrap();
    sys.block_on(async {
        let api = setup().await;
        let product =
            api.add_product(NewProduct::new("Crab Stickers", Cents::from(999))).await.expect("Error adding product");
        let found = api.product_by_id(product.id).await.expect("Error fetching product");
        assert_eq!(found.map(|p| p.slug), Some("crab-stickers".to_string()));
        let missing = api.product_by_id(999).await.expect("Error fetching product");
        assert!(missing.is_none());
        tear_down(api).await;
    });
    info!("🚀️ test complete");
}
