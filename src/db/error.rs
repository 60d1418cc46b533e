//! Storage error types.

use miette::Diagnostic;
use thiserror::Error;

/// Errors raised by the storage substrate.
#[derive(Error, Diagnostic, Debug)]
pub enum DbError {
    #[error("Connection error: {message}")]
    #[diagnostic(code(atelier::db::connection_error))]
    Connection { message: String },

    #[error("Migration error: {message}")]
    #[diagnostic(code(atelier::db::migration_error))]
    Migration { message: String },

    #[error("Database error: {message}")]
    #[diagnostic(code(atelier::db::database_error))]
    Database { message: String },
}

impl From<sqlx::Error> for DbError {
    fn from(e: sqlx::Error) -> Self {
        DbError::Database {
            message: e.to_string(),
        }
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;
