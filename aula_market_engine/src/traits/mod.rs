//! #  Database management and control.
//!
//! This module provides the interfaces that define the interface contracts of the marketplace engine database
//! *backends*.
//!
//! ## Orders
//! An order records what a user is buying: a set of immutable line items snapshotted from the catalog, the money
//! totals, and a status that walks a fixed lifecycle from `pending` through payment to fulfillment (or out through
//! cancellation and refunds).
//!
//! The [`MarketplaceDatabase`] trait provides the mechanisms for moving orders through that lifecycle atomically,
//! including the seat reservations that back event bookings. The [`OrderManagement`] trait provides methods for
//! querying orders, their items, bookings and audit trail.
//!
//! ## Traits
//! The module defines behaviour that database backends need to expose in order to be supported by the Aula Market
//! engine.
//!
//! * [`MarketplaceDatabase`] defines the highest level of behaviour for backends supporting the engine.
//! * [`OrderManagement`] provides methods for querying information about orders.
//! * [`UserManagement`] defines behaviour for managing users and their stored language preference.
//! * [`CatalogManagement`] defines behaviour for storing and fetching courses, products and events.
mod catalog_management;
mod marketplace_database;
mod order_management;
mod user_management;

mod data_objects;

pub use catalog_management::{CatalogApiError, CatalogManagement};
pub use data_objects::ExpiryResult;
pub use marketplace_database::{MarketDbError, MarketplaceDatabase};
pub use order_management::{OrderManagement, OrderQueryError};
pub use user_management::{ProfileApiError, UserManagement};
