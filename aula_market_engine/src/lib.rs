//! Aula Market Engine
//!
//! The Aula Market Engine is the core of a marketplace for online courses, digital products and live events. This
//! library contains the catalog, order and user-profile logic of the marketplace. It is front-end agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@traits`]). Currently, Sqlite is the supported backend. You should never
//!    need to access the database directly. Instead, use the public API provided by the engine. The exception is the
//!    data types used in the database. These are defined in the `db_types` module and are public.
//! 2. The market engine public API ([`OrderFlowApi`], [`CatalogApi`], [`ProfileApi`]). This provides the
//!    public-facing functionality of the engine. It is responsible for managing orders, the catalog, bookings and
//!    user profiles. Specific backends (e.g. SQLite) need to implement the traits in [`mod@traits`] in order to act
//!    as a backend for the engine.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when an order's payment is confirmed, an `OrderPaidEvent` is emitted.
//! A simple Actor framework is used so that you can easily hook into these events and perform custom actions.
mod ame_api;

pub mod booking;
pub mod config;
pub mod db_types;
pub mod events;
pub mod helpers;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use ame_api::{
    catalog_api::CatalogApi,
    catalog_objects,
    errors::OrderManagerError,
    order_flow_api::OrderFlowApi,
    order_objects,
    profile_api::ProfileApi,
    profile_objects,
};
