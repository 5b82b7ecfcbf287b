//! Schemas that only exist for documentation.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every endpoint.
///
/// Fields beyond `kind` and `message` depend on the kind: `entity`/`id` for `not_found`,
/// `have`/`want` for `insufficient_quantity`, `current`/`limit`/`attempted` for `capacity_exceeded`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "kind": "capacity_exceeded",
    "message": "Deck capacity exceeded: current 59, limit 60, attempted add 2",
    "current": 59,
    "limit": 60,
    "attempted": 2
}))]
pub struct ErrorResponse {
    /// One of `not_found`, `invalid_argument`, `insufficient_quantity`, `capacity_exceeded`,
    /// `conflict`, `storage` or `internal`.
    #[schema(example = "insufficient_quantity")]
    pub kind: String,

    /// Human-readable description.
    pub message: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub have: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub want: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attempted: Option<i64>,
}
