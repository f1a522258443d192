//! Unifies API for managing the catalog of courses, digital products and bookable events.

use std::fmt::Debug;

use am_common::{
    currency::{currency_for_code, format_money},
    Cents,
    Locale,
};
use log::*;

use crate::{
    ame_api::catalog_objects::{CourseDetail, EventDetail},
    booking,
    db_types::{Course, EventListing, NewCourse, NewEventListing, NewProduct, Product},
    traits::{CatalogApiError, CatalogManagement},
};

/// The `CatalogApi` provides a unified API for publishing listings and rendering locale-aware detail views of them.
pub struct CatalogApi<B> {
    db: B,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Adds a course to the catalog. The slug is generated from the title when not supplied.
    pub async fn add_course(&self, course: NewCourse) -> Result<Course, CatalogApiError> {
        validate_listing(&course.title, course.price, &course.currency)?;
        let course = self.db.insert_course(course).await?;
        debug!("🏷️️ Course '{}' added to the catalog as #{}", course.title, course.id);
        Ok(course)
    }

    /// Adds a digital product to the catalog. The slug is generated from the title when not supplied.
    pub async fn add_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        validate_listing(&product.title, product.price, &product.currency)?;
        let product = self.db.insert_product(product).await?;
        debug!("🏷️️ Product '{}' added to the catalog as #{}", product.title, product.id);
        Ok(product)
    }

    /// Adds a bookable event to the catalog. On top of the usual listing checks, the capacity must not be negative.
    /// The event starts with all of its seats available.
    pub async fn add_event_listing(&self, listing: NewEventListing) -> Result<EventListing, CatalogApiError> {
        validate_listing(&listing.title, listing.price, &listing.currency)?;
        if listing.capacity < 0 {
            return Err(CatalogApiError::InvalidListing(format!(
                "the capacity cannot be negative: {}",
                listing.capacity
            )));
        }
        let listing = self.db.insert_event_listing(listing).await?;
        debug!("🏷️️ Event '{}' added to the catalog as #{} with {} seat(s)", listing.title, listing.id, listing.capacity);
        Ok(listing)
    }

    /// Renders the detail view of a course, with the price formatted for the viewer's locale.
    pub async fn course_detail(&self, course_id: i64, locale: Locale) -> Result<CourseDetail, CatalogApiError> {
        let course = self.db.fetch_course(course_id).await?.ok_or(CatalogApiError::CourseNotFound(course_id))?;
        let display_price = format_money(course.price, &course.currency, locale)
            .map_err(|e| CatalogApiError::InvalidListing(e.to_string()))?;
        Ok(CourseDetail {
            id: course.id,
            slug: course.slug,
            title: course.title,
            description: course.description,
            price: course.price,
            currency: course.currency,
            display_price,
            enrollment_count: course.enrollment_count,
            published: course.published,
        })
    }

    /// Renders the detail view of an event: the formatted price plus everything the booking call-to-action needs
    /// (availability bucket, capacity meter, booking link and button copy in the viewer's language).
    pub async fn event_detail(&self, event_id: i64, locale: Locale) -> Result<EventDetail, CatalogApiError> {
        let event = self.db.fetch_event_listing(event_id).await?.ok_or(CatalogApiError::EventNotFound(event_id))?;
        let display_price = format_money(event.price, &event.currency, locale)
            .map_err(|e| CatalogApiError::InvalidListing(e.to_string()))?;
        let availability = booking::availability(event.available_spots, event.capacity);
        let capacity_percent = booking::capacity_percentage(event.available_spots, event.capacity);
        let booking_url = booking::booking_url(&event.slug);
        let booking_label = booking::booking_button_label(availability, locale).to_string();
        Ok(EventDetail {
            id: event.id,
            slug: event.slug,
            title: event.title,
            description: event.description,
            price: event.price,
            currency: event.currency,
            display_price,
            starts_at: event.starts_at,
            capacity: event.capacity,
            available_spots: event.available_spots,
            availability,
            capacity_percent,
            booking_url,
            booking_label,
            published: event.published,
        })
    }

    /// Fetches the raw product record for the given id. If no product exists, `None` is returned.
    pub async fn product_by_id(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        self.db.fetch_product(product_id).await
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

fn validate_listing(title: &str, price: Cents, currency: &str) -> Result<(), CatalogApiError> {
    if title.trim().is_empty() {
        return Err(CatalogApiError::InvalidListing("the title cannot be empty".to_string()));
    }
    if price.is_negative() {
        return Err(CatalogApiError::InvalidListing(format!("the price cannot be negative: {price}")));
    }
    currency_for_code(currency).map_err(|e| CatalogApiError::InvalidListing(e.to_string()))?;
    Ok(())
}
