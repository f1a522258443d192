use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Course, EventListing, NewCourse, NewEventListing, NewProduct, Product},
    helpers::slugify,
    traits::{CatalogApiError, MarketDbError},
};

pub async fn insert_course(course: NewCourse, conn: &mut SqliteConnection) -> Result<Course, CatalogApiError> {
    let slug = course.slug.unwrap_or_else(|| slugify(&course.title));
    let course: Course = sqlx::query_as(
        r#"
            INSERT INTO courses (slug, title, description, price, currency, published)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(slug)
    .bind(course.title)
    .bind(course.description)
    .bind(course.price.value())
    .bind(course.currency)
    .bind(course.published)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Course [{}] inserted with id {}", course.slug, course.id);
    Ok(course)
}

pub async fn insert_product(product: NewProduct, conn: &mut SqliteConnection) -> Result<Product, CatalogApiError> {
    let slug = product.slug.unwrap_or_else(|| slugify(&product.title));
    let product: Product = sqlx::query_as(
        r#"
            INSERT INTO products (slug, title, description, price, currency, published)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *;
        "#,
    )
    .bind(slug)
    .bind(product.title)
    .bind(product.description)
    .bind(product.price.value())
    .bind(product.currency)
    .bind(product.published)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Product [{}] inserted with id {}", product.slug, product.id);
    Ok(product)
}

/// Inserts a new event. Every seat starts out available, so `available_spots` is set to the capacity.
pub async fn insert_event_listing(
    listing: NewEventListing,
    conn: &mut SqliteConnection,
) -> Result<EventListing, CatalogApiError> {
    let slug = listing.slug.unwrap_or_else(|| slugify(&listing.title));
    let listing: EventListing = sqlx::query_as(
        r#"
            INSERT INTO events (slug, title, description, price, currency, starts_at, capacity, available_spots, published)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(slug)
    .bind(listing.title)
    .bind(listing.description)
    .bind(listing.price.value())
    .bind(listing.currency)
    .bind(listing.starts_at)
    .bind(listing.capacity)
    .bind(listing.published)
    .fetch_one(conn)
    .await?;
    debug!("📝️ Event [{}] inserted with id {} and {} seat(s)", listing.slug, listing.id, listing.capacity);
    Ok(listing)
}

pub async fn fetch_course(id: i64, conn: &mut SqliteConnection) -> Result<Option<Course>, sqlx::Error> {
    let course = sqlx::query_as("SELECT * FROM courses WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(course)
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_event_listing(id: i64, conn: &mut SqliteConnection) -> Result<Option<EventListing>, sqlx::Error> {
    let event = sqlx::query_as("SELECT * FROM events WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(event)
}

/// Adjusts a course's enrollment counter by `delta`. The counter floors at zero.
pub async fn adjust_enrollment(course_id: i64, delta: i64, conn: &mut SqliteConnection) -> Result<(), MarketDbError> {
    let _ = sqlx::query(
        "UPDATE courses SET enrollment_count = MAX(0, enrollment_count + $1), updated_at = CURRENT_TIMESTAMP WHERE \
         id = $2",
    )
    .bind(delta)
    .bind(course_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Adjusts a product's download counter by `delta`. The counter floors at zero.
pub async fn adjust_downloads(product_id: i64, delta: i64, conn: &mut SqliteConnection) -> Result<(), MarketDbError> {
    let _ = sqlx::query(
        "UPDATE products SET download_count = MAX(0, download_count + $1), updated_at = CURRENT_TIMESTAMP WHERE id = \
         $2",
    )
    .bind(delta)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(())
}

/// Takes `seats` from the event's available spots. The guard in the WHERE clause makes the check-and-decrement a
/// single atomic statement, so two orders racing for the last seats cannot both win. Returns `false`, without
/// changing anything, if the event does not have that many seats left (or does not exist).
pub async fn reserve_spots(event_id: i64, seats: i64, conn: &mut SqliteConnection) -> Result<bool, MarketDbError> {
    let result = sqlx::query(
        "UPDATE events SET available_spots = available_spots - $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 AND \
         available_spots >= $1",
    )
    .bind(seats)
    .bind(event_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Returns `seats` to the event. The count is capped at the event's capacity.
pub async fn release_spots(event_id: i64, seats: i64, conn: &mut SqliteConnection) -> Result<(), MarketDbError> {
    let _ = sqlx::query(
        "UPDATE events SET available_spots = MIN(capacity, available_spots + $1), updated_at = CURRENT_TIMESTAMP \
         WHERE id = $2",
    )
    .bind(seats)
    .bind(event_id)
    .execute(conn)
    .await?;
    Ok(())
}
