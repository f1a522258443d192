use am_common::Cents;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::booking::Availability;

/// The response to `course_detail` calls. Carries the course fields plus the price formatted for the viewer's
/// locale.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CourseDetail {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    /// The price rendered for the viewer, e.g. `$49.00` or `49,00 €`.
    pub display_price: String,
    pub enrollment_count: i64,
    pub published: bool,
}

/// The response to `event_detail` calls. Everything an event page needs: the listing fields, the formatted price,
/// and the booking call-to-action state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDetail {
    pub id: i64,
    pub slug: String,
    pub title: String,
    pub description: Option<String>,
    pub price: Cents,
    pub currency: String,
    pub display_price: String,
    pub starts_at: DateTime<Utc>,
    pub capacity: i64,
    pub available_spots: i64,
    pub availability: Availability,
    /// How much of the event is still open, as a percentage of capacity.
    pub capacity_percent: f64,
    pub booking_url: String,
    /// Button copy in the viewer's language, matching `availability`.
    pub booking_label: String,
    pub published: bool,
}
