//! # Aula market engine public API
//!
//! The `ame_api` module exposes the programmatic API for the Aula market engine.
//! The API is modular, so that clients of the API can pick and choose the functionality they want.
//! Or different parts (e.g. the catalog and the order flow) could be configured on different machines, or even use
//! Sqlite for one and Postgres for the other.
//!
//! * [`catalog_api`] provides methods for publishing courses, products and event listings, and for rendering
//!   locale-aware detail views of them.
//! * [`order_flow_api`] is the primary API for handling order and payment flows in response to storefront checkout
//!   events and payment provider callbacks.
//! * [`profile_api`] provides methods for managing user accounts and their language preferences.
//!
//! The other submodules in this module are support and utility functions and types.
//!
//! # API usage
//!
//! The pattern for using all the APIs is the same. An API instance is created by supplying a database backend that
//! implements the specific backend traits required by the API.
//!
//! For example, to create an API instance to query a user's profile on the database:
//!
//! ```rust,ignore
//! use aula_market_engine::{ProfileApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url(...).await?;
//! // SqliteDatabase implements UserManagement
//! let api = ProfileApi::new(db);
//! // use the api to access information
//! let profile = api.profile(user_id).await?;
//! ```

pub mod catalog_api;
pub mod catalog_objects;
pub mod errors;
pub mod order_flow_api;
pub mod order_objects;
pub mod profile_api;
pub mod profile_objects;
