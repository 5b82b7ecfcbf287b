//! Database models for binder entries (unallocated inventory).

use crate::types::{CardId, UserId};
use chrono::{DateTime, Utc};

/// A (user, card) holding. Quantity is always positive: depleted rows are deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct BinderEntry {
    pub user_id: UserId,
    pub card_id: CardId,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

/// A binder entry joined with the catalog fields needed for display
#[derive(Debug, Clone, PartialEq)]
pub struct BinderListing {
    pub card_id: CardId,
    pub quantity: i32,
    pub name: String,
    pub set_code: Option<String>,
    pub rarity: Option<String>,
}
