//! Storage seams used by the ledger.
//!
//! A [`LedgerStore`] hands out a [`UnitOfWork`] per operation. Everything read or written through
//! a unit becomes visible to other units only once [`UnitOfWork::commit`] returns; dropping the
//! unit instead discards its writes. Locking reads (`lock_*`) hold their rows until the unit ends.

use crate::db::errors::Result;
use crate::db::models::{
    binder::{BinderEntry, BinderListing},
    cards::{CardCreateDBRequest, CardPrinting, CardSearch},
    decks::{Deck, DeckCreateDBRequest, DeckEntry, DeckSummary, DeckUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::{CardId, DeckId, UserId, Zone};
use std::collections::HashMap;

/// Read access to the card catalog. The write path exists for importers and tests.
#[async_trait::async_trait]
pub trait CardCatalog {
    async fn card_exists(&mut self, id: CardId) -> Result<bool>;

    async fn get_card(&mut self, id: CardId) -> Result<Option<CardPrinting>>;

    async fn get_cards(&mut self, ids: Vec<CardId>) -> Result<HashMap<CardId, CardPrinting>>;

    /// One page of printings matching the search, ordered by name, and the total match count
    async fn search_cards(&mut self, search: &CardSearch) -> Result<(Vec<CardPrinting>, i64)>;

    async fn create_card(&mut self, request: &CardCreateDBRequest) -> Result<CardPrinting>;
}

/// Lookup of the users that own binders and decks
#[async_trait::async_trait]
pub trait UserDirectory {
    async fn user_exists(&mut self, id: UserId) -> Result<bool>;

    async fn get_user(&mut self, id: UserId) -> Result<Option<UserDBResponse>>;

    async fn create_user(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse>;
}

/// One atomic unit of work against the inventory tables
#[async_trait::async_trait]
pub trait UnitOfWork: CardCatalog + UserDirectory + Send {
    // Binder entries
    async fn lock_binder_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<Option<BinderEntry>>;

    async fn add_binder_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry>;

    async fn set_binder_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry>;

    async fn delete_binder_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<bool>;

    async fn list_binder(&mut self, user_id: UserId, search: &CardSearch) -> Result<(Vec<BinderListing>, i64)>;

    // Decks
    async fn create_deck(&mut self, request: &DeckCreateDBRequest) -> Result<Deck>;

    async fn get_deck(&mut self, id: DeckId) -> Result<Option<Deck>>;

    /// Lock decks in ascending id order, returning the ones that exist
    async fn lock_decks(&mut self, ids: &[DeckId]) -> Result<HashMap<DeckId, Deck>>;

    async fn update_deck(&mut self, id: DeckId, request: &DeckUpdateDBRequest) -> Result<Deck>;

    async fn delete_deck(&mut self, id: DeckId) -> Result<bool>;

    async fn list_user_decks(&mut self, owner_id: UserId) -> Result<Vec<DeckSummary>>;

    // Deck entries
    async fn deck_entries(&mut self, deck_id: DeckId) -> Result<Vec<DeckEntry>>;

    async fn lock_deck_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<Option<DeckEntry>>;

    async fn add_deck_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry>;

    async fn set_deck_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry>;

    async fn delete_deck_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<bool>;

    async fn delete_deck_entries(&mut self, deck_id: DeckId) -> Result<u64>;

    async fn total_allocated(&mut self, deck_id: DeckId) -> Result<i64>;

    /// Make every write of this unit visible
    async fn commit(self: Box<Self>) -> Result<()>;
}

/// Factory for units of work
#[async_trait::async_trait]
pub trait LedgerStore: Send + Sync {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>>;
}
