//! API request/response models for decks.

use crate::db::models::decks::{Deck, DeckEntry, DeckSummary, DeckUpdateDBRequest};
use crate::ledger::{DeckDetail, DeckDraft, DeckTotals, ReleasedDeck};
use crate::types::{CardId, DeckId, UserId, Zone};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Create a deck
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckCreate {
    #[schema(value_type = String, format = "uuid")]
    pub owner_id: UserId,
    pub name: String,
    /// Format label, e.g. "modern" or "commander"
    pub format: String,
    /// Maximum total copies across both zones. Defaults to the configured limit.
    pub capacity: Option<i32>,
    /// Store no limit. Takes precedence over `capacity`.
    #[serde(default)]
    pub unlimited: bool,
    pub notes: Option<String>,
}

impl From<DeckCreate> for DeckDraft {
    fn from(api: DeckCreate) -> Self {
        DeckDraft::builder()
            .owner_id(api.owner_id)
            .name(api.name)
            .format(api.format)
            .maybe_capacity(api.capacity)
            .unlimited(api.unlimited)
            .maybe_notes(api.notes)
            .build()
    }
}

/// Partial metadata update. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct DeckUpdate {
    pub name: Option<String>,
    pub format: Option<String>,
    /// `null` clears the notes
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<String>)]
    pub notes: Option<Option<String>>,
    /// A number sets the limit, `null` removes it
    #[serde(default, with = "::serde_with::rust::double_option", skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<i32>)]
    pub capacity: Option<Option<i32>>,
}

impl From<DeckUpdate> for DeckUpdateDBRequest {
    fn from(api: DeckUpdate) -> Self {
        Self {
            name: api.name,
            format: api.format,
            notes: api.notes,
            capacity: api.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DeckId,
    #[schema(value_type = String, format = "uuid")]
    pub owner_id: UserId,
    pub name: String,
    pub format: String,
    /// `null` when unlimited
    pub capacity: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Deck> for DeckResponse {
    fn from(db: Deck) -> Self {
        Self {
            id: db.id,
            owner_id: db.owner_id,
            name: db.name,
            format: db.format,
            capacity: db.capacity,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// A deck in a user's deck list
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckSummaryResponse {
    #[serde(flatten)]
    pub deck: DeckResponse,
    /// Total copies across both zones
    pub card_count: i64,
}

impl From<DeckSummary> for DeckSummaryResponse {
    fn from(db: DeckSummary) -> Self {
        Self {
            deck: db.deck.into(),
            card_count: db.card_count,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckEntryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub zone: Zone,
    pub quantity: i32,
}

impl From<DeckEntry> for DeckEntryResponse {
    fn from(db: DeckEntry) -> Self {
        Self {
            card_id: db.card_id,
            zone: db.zone,
            quantity: db.quantity,
        }
    }
}

/// A deck with all of its entries
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckDetailResponse {
    #[serde(flatten)]
    pub deck: DeckResponse,
    pub entries: Vec<DeckEntryResponse>,
}

impl From<DeckDetail> for DeckDetailResponse {
    fn from(detail: DeckDetail) -> Self {
        Self {
            deck: detail.deck.into(),
            entries: detail.entries.into_iter().map(Into::into).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckTotalsResponse {
    #[schema(value_type = String, format = "uuid")]
    pub deck_id: DeckId,
    pub main: i64,
    pub sideboard: i64,
    pub total: i64,
    pub capacity: Option<i32>,
}

impl From<DeckTotals> for DeckTotalsResponse {
    fn from(t: DeckTotals) -> Self {
        Self {
            deck_id: t.deck_id,
            main: t.main,
            sideboard: t.sideboard,
            total: t.total,
            capacity: t.capacity,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReturnedCards {
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i64,
}

/// A deleted deck and what went back to the binder
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeckDeletedResponse {
    #[schema(value_type = String, format = "uuid")]
    pub deck_id: DeckId,
    pub returned: Vec<ReturnedCards>,
}

impl From<ReleasedDeck> for DeckDeletedResponse {
    fn from(released: ReleasedDeck) -> Self {
        Self {
            deck_id: released.deck.id,
            returned: released
                .returned
                .into_iter()
                .map(|(card_id, quantity)| ReturnedCards { card_id, quantity })
                .collect(),
        }
    }
}
