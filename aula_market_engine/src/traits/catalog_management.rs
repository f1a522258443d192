use thiserror::Error;

use crate::db_types::{Course, EventListing, NewCourse, NewEventListing, NewProduct, Product};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested course {0} does not exist")]
    CourseNotFound(i64),
    #[error("The requested product {0} does not exist")]
    ProductNotFound(i64),
    #[error("The requested event {0} does not exist")]
    EventNotFound(i64),
    #[error("Invalid listing. {0}")]
    InvalidListing(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// The `CatalogManagement` trait defines behaviour for storing and fetching the three kinds of
/// listing the marketplace sells: courses, digital products, and bookable events.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Stores a new course. The slug is generated from the title when not supplied.
    async fn insert_course(&self, course: NewCourse) -> Result<Course, CatalogApiError>;

    /// Stores a new digital product. The slug is generated from the title when not supplied.
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;

    /// Stores a new event. `available_spots` starts at the event's capacity.
    async fn insert_event_listing(&self, listing: NewEventListing) -> Result<EventListing, CatalogApiError>;

    /// Fetches the course with the given id. If no course exists, `None` is returned.
    async fn fetch_course(&self, course_id: i64) -> Result<Option<Course>, CatalogApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;

    async fn fetch_event_listing(&self, event_id: i64) -> Result<Option<EventListing>, CatalogApiError>;
}
