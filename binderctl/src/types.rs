//! Common type definitions shared by the storage, ledger and API layers.
//!
//! # ID Types
//!
//! All entity IDs are UUIDs wrapped in type aliases for readability:
//!
//! - [`UserId`]: User account identifier
//! - [`CardId`]: Card printing identifier (stable catalog id)
//! - [`DeckId`]: Deck identifier
//!
//! # Zones
//!
//! A deck splits its allocated cards into two independent buckets, see [`Zone`].
//!
//! # Utility Functions
//!
//! - [`abbrev_uuid`]: Abbreviate UUIDs to first 8 chars for logging

use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

// Type aliases for IDs
pub type UserId = Uuid;
pub type CardId = Uuid;
pub type DeckId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

/// Deck zone, stored as TEXT in the database.
///
/// The ordering (`Main` before `Sideboard`) is the priority used when a removal does not name a
/// zone explicitly.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Zone {
    #[default]
    Main,
    Sideboard,
}

impl Zone {
    /// Zones in removal priority order
    pub const PRIORITY: [Zone; 2] = [Zone::Main, Zone::Sideboard];
}

impl fmt::Display for Zone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Zone::Main => write!(f, "main"),
            Zone::Sideboard => write!(f, "sideboard"),
        }
    }
}
