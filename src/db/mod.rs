//! Storage substrate for the read-side server.
//!
//! The admin application owns all writes; this module only opens the shared
//! SQLite store and exposes the status vocabulary used by projections.
//!
//! - `error`: storage error types
//! - `database`: pool wrapper and migrations
//! - `models`: status enums shared by the resource layer

mod database;
mod error;
mod models;


pub use database::SqliteDatabase;
pub use error::{DbError, DbResult};
pub use models::*;
