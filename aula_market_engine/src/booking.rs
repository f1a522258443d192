//! Seat availability rules for bookable events.
//!
//! These are pure functions over the `(available_spots, capacity)` pair. The storefront uses them to decide what to
//! render on an event page; the database layer enforces the underlying invariant that spots stay within
//! `0..=capacity`.

use std::fmt::Display;

use am_common::Locale;
use serde::{Deserialize, Serialize};

/// How full an event is, bucketed for display purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Availability {
    /// No seats left, or the event never had any.
    SoldOut,
    /// 20% or fewer of the seats remain.
    Limited,
    Available,
}

impl Display for Availability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Availability::SoldOut => write!(f, "sold_out"),
            Availability::Limited => write!(f, "limited"),
            Availability::Available => write!(f, "available"),
        }
    }
}

/// Buckets the remaining seats of an event. The limited band is inclusive: an event with exactly 20% of its seats
/// left is `Limited`. Integer arithmetic only, so a 21-seat event with 4 spots left (19%) is also `Limited`.
pub fn availability(available_spots: i64, capacity: i64) -> Availability {
    if available_spots <= 0 || capacity <= 0 {
        return Availability::SoldOut;
    }
    if available_spots * 5 <= capacity {
        Availability::Limited
    } else {
        Availability::Available
    }
}

/// The percentage of seats still open, for capacity meters. An event with no capacity reports 0.0.
pub fn capacity_percentage(available_spots: i64, capacity: i64) -> f64 {
    if capacity <= 0 {
        return 0.0;
    }
    available_spots as f64 / capacity as f64 * 100.0
}

/// The storefront path where seats for this event can be booked.
pub fn booking_url(slug: &str) -> String {
    format!("/events/{slug}/book")
}

/// The call-to-action copy for an event's booking button, in the viewer's language.
pub fn booking_button_label(availability: Availability, locale: Locale) -> &'static str {
    match (locale, availability) {
        (Locale::En, Availability::Available) => "Book now",
        (Locale::En, Availability::Limited) => "Only a few spots left",
        (Locale::En, Availability::SoldOut) => "Sold out",
        (Locale::Es, Availability::Available) => "Reservar ahora",
        (Locale::Es, Availability::Limited) => "Quedan pocas plazas",
        (Locale::Es, Availability::SoldOut) => "Agotado",
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn availability_buckets() {
        assert_eq!(availability(0, 50), Availability::SoldOut);
        assert_eq!(availability(-1, 50), Availability::SoldOut);
        assert_eq!(availability(10, 0), Availability::SoldOut);
        // The 20% boundary is inclusive
        assert_eq!(availability(10, 50), Availability::Limited);
        assert_eq!(availability(11, 50), Availability::Available);
        assert_eq!(availability(4, 21), Availability::Limited);
        assert_eq!(availability(50, 50), Availability::Available);
        assert_eq!(availability(1, 1), Availability::Available);
    }

    #[test]
    fn capacity_percentages() {
        assert_eq!(capacity_percentage(0, 0), 0.0);
        assert_eq!(capacity_percentage(25, 50), 50.0);
        assert_eq!(capacity_percentage(50, 50), 100.0);
        assert_eq!(capacity_percentage(0, 50), 0.0);
    }

    #[test]
    fn booking_urls() {
        assert_eq!(booking_url("rust-workshop"), "/events/rust-workshop/book");
    }

    #[test]
    fn button_labels_follow_the_locale() {
        assert_eq!(booking_button_label(Availability::Available, Locale::En), "Book now");
        assert_eq!(booking_button_label(Availability::Limited, Locale::En), "Only a few spots left");
        assert_eq!(booking_button_label(Availability::SoldOut, Locale::Es), "Agotado");
        assert_eq!(booking_button_label(Availability::Available, Locale::Es), "Reservar ahora");
    }
}
