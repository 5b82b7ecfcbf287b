//! Database models for decks and deck entries.

use crate::types::{CardId, DeckId, UserId, Zone};
use chrono::{DateTime, Utc};

/// Database request for creating a deck
#[derive(Debug, Clone)]
pub struct DeckCreateDBRequest {
    pub owner_id: UserId,
    pub name: String,
    pub format: String,
    /// `None` stores an unlimited deck
    pub capacity: Option<i32>,
    pub notes: Option<String>,
}

/// Database request for updating deck metadata. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct DeckUpdateDBRequest {
    pub name: Option<String>,
    pub format: Option<String>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
    /// `Some(None)` removes the limit
    pub capacity: Option<Option<i32>>,
}

/// Database response for a deck
#[derive(Debug, Clone, PartialEq)]
pub struct Deck {
    pub id: DeckId,
    pub owner_id: UserId,
    pub name: String,
    pub format: String,
    pub capacity: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A deck together with its total allocated quantity
#[derive(Debug, Clone, PartialEq)]
pub struct DeckSummary {
    pub deck: Deck,
    pub card_count: i64,
}

/// A (deck, card, zone) allocation. Quantity is always positive: depleted rows are deleted.
#[derive(Debug, Clone, PartialEq)]
pub struct DeckEntry {
    pub deck_id: DeckId,
    pub card_id: CardId,
    pub zone: Zone,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}
