//! SQLite database module for the Aula Market Engine.

mod sqlite_impl;

pub mod db;
pub use sqlite_impl::SqliteDatabase;
