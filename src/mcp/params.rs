//! Parameter types shared by several tools.
//!
//! Entity-specific filter params live next to their resource; only the
//! generic identifier wrapper is defined here.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

/// Identifier argument for `get_*` tools.
///
/// Accepted as a JSON number or a numeric string; validation happens in the
/// tool handler so a malformed id becomes a tool error, not a protocol one.
#[derive(Debug, Deserialize, JsonSchema)]
pub struct IdParams {
    /// Numeric identifier of the record.
    pub id: Value,
}
