//! Resource error types and identifier validation.
//!
//! Every resource reports failures through the same two typed variants:
//! `InvalidId` for malformed identifiers and `NotFound` for lookups that hit
//! nothing. Store-level failures pass through unchanged. The MCP dispatcher
//! maps the first two to tool-level error responses and lets the rest
//! surface as protocol errors.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::db::DbError;
use crate::serde_utils::value_as_i64;

/// Errors raised by the resource layer.
#[derive(Error, Diagnostic, Debug)]
pub enum ResourceError {
    #[error("{resource} with id {id} not found")]
    #[diagnostic(code(atelier::resource::not_found))]
    NotFound { resource: &'static str, id: i64 },

    #[error("Invalid {resource} id: '{value}' is not a positive integer")]
    #[diagnostic(code(atelier::resource::invalid_id))]
    InvalidId {
        resource: &'static str,
        value: String,
    },

    #[error(transparent)]
    #[diagnostic(transparent)]
    Database(#[from] DbError),
}

impl From<sqlx::Error> for ResourceError {
    fn from(e: sqlx::Error) -> Self {
        ResourceError::Database(DbError::from(e))
    }
}

/// Result type for resource operations.
pub type ResourceResult<T> = Result<T, ResourceError>;

/// Normalize a raw identifier into a positive integer.
///
/// Accepts JSON numbers and numeric strings; anything else, and anything
/// non-positive, is an `InvalidId` naming the resource it was meant for.
pub fn validate_id(value: &Value, resource: &'static str) -> ResourceResult<i64> {
    match value_as_i64(value) {
        Some(id) if id > 0 => Ok(id),
        _ => Err(ResourceError::InvalidId {
            resource,
            value: display_value(value),
        }),
    }
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_string_normalizes() {
        let id = validate_id(&json!("42"), "client").expect("'42' should validate");
        assert_eq!(id, 42);
    }

    #[test]
    fn plain_number_passes_through() {
        let id = validate_id(&json!(7), "task").expect("7 should validate");
        assert_eq!(id, 7);
    }

    #[test]
    fn non_numeric_is_invalid() {
        let err = validate_id(&json!("abc"), "client").unwrap_err();
        match err {
            ResourceError::InvalidId { resource, value } => {
                assert_eq!(resource, "client");
                assert_eq!(value, "abc");
            }
            other => panic!("Expected InvalidId, got {:?}", other),
        }
    }

    #[test]
    fn zero_and_negative_are_invalid() {
        assert!(validate_id(&json!(0), "invoice").is_err());
        assert!(validate_id(&json!(-4), "invoice").is_err());
    }

    #[test]
    fn fractional_is_invalid() {
        assert!(validate_id(&json!(3.5), "note").is_err());
    }

    #[test]
    fn not_found_names_resource_and_id() {
        let err = ResourceError::NotFound {
            resource: "quote",
            id: 99,
        };
        assert_eq!(err.to_string(), "quote with id 99 not found");
    }
}
