//! API request/response models for moving cards between the binder and decks.

use crate::db::models::decks::DeckEntry;
use crate::ledger::{Removal, TransferOutcome, ZoneMove};
use crate::types::{CardId, DeckId, Zone};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::decks::DeckEntryResponse;

/// Move copies from the owner's binder into a deck
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AllocateRequest {
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i32,
    /// Defaults to `main`
    #[serde(default)]
    pub zone: Zone,
}

/// Move copies from a deck back to the owner's binder
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeallocateRequest {
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i32,
    /// Without a zone the main entry is used if present, otherwise the sideboard entry
    pub zone: Option<Zone>,
}

/// Move copies between the zones of one deck
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ZoneMoveRequest {
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i32,
    pub from: Zone,
    pub to: Zone,
}

/// Move copies from one deck to the main zone of another
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferRequest {
    #[schema(value_type = String, format = "uuid")]
    pub source_deck_id: DeckId,
    #[schema(value_type = String, format = "uuid")]
    pub destination_deck_id: DeckId,
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i32,
    pub source_zone: Option<Zone>,
}

/// State of a zone entry after copies were taken out of it
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RemovalResponse {
    pub zone: Zone,
    /// Copies left in the entry; 0 means the entry was removed
    pub remaining: i32,
}

impl From<Removal> for RemovalResponse {
    fn from(removal: Removal) -> Self {
        match removal {
            Removal::Remaining(entry) => Self {
                zone: entry.zone,
                remaining: entry.quantity,
            },
            Removal::Removed { zone } => Self { zone, remaining: 0 },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TransferResponse {
    pub source: RemovalResponse,
    pub destination: DeckEntryResponse,
}

impl From<TransferOutcome> for TransferResponse {
    fn from(outcome: TransferOutcome) -> Self {
        Self {
            source: outcome.source.into(),
            destination: outcome.destination.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ZoneMoveResponse {
    pub from: RemovalResponse,
    pub to: DeckEntryResponse,
}

impl From<ZoneMove> for ZoneMoveResponse {
    fn from(moved: ZoneMove) -> Self {
        Self {
            from: moved.from.into(),
            to: moved.to.into(),
        }
    }
}

impl From<DeckEntry> for RemovalResponse {
    fn from(entry: DeckEntry) -> Self {
        Self {
            zone: entry.zone,
            remaining: entry.quantity,
        }
    }
}
