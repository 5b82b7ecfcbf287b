//! The inventory service: every public operation as one committed unit of work.

use super::errors::{Entity, LedgerError, Result};
use super::export::{ExportLine, render_deck_list};
use super::store::{LedgerStore, UnitOfWork};
use super::transfer::{self, ReleasedDeck, TransferOutcome, ZoneMove};
use super::{BinderLedger, DeckLedger, Removal, capacity::check_capacity};
use crate::db::models::{
    binder::{BinderEntry, BinderListing},
    cards::{CardCreateDBRequest, CardPrinting, CardSearch},
    decks::{Deck, DeckCreateDBRequest, DeckEntry, DeckSummary, DeckUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::types::{CardId, DeckId, UserId, Zone, abbrev_uuid};
use bon::Builder;
use std::sync::Arc;
use tracing::{info, instrument};

/// Parameters for creating a deck
#[derive(Debug, Clone, Builder)]
pub struct DeckDraft {
    pub owner_id: UserId,
    #[builder(into)]
    pub name: String,
    #[builder(into)]
    pub format: String,
    /// Explicit limit; falls back to the configured default when absent
    pub capacity: Option<i32>,
    /// Store no limit at all. Takes precedence over `capacity`.
    #[builder(default)]
    pub unlimited: bool,
    pub notes: Option<String>,
}

/// A deck with all of its entries
#[derive(Debug, Clone, PartialEq)]
pub struct DeckDetail {
    pub deck: Deck,
    pub entries: Vec<DeckEntry>,
}

/// Allocated totals of a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeckTotals {
    pub deck_id: DeckId,
    pub main: i64,
    pub sideboard: i64,
    pub total: i64,
    pub capacity: Option<i32>,
}

fn non_blank(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LedgerError::invalid(format!("Deck {field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

fn valid_capacity(capacity: i32) -> Result<i32> {
    if capacity < 1 {
        return Err(LedgerError::invalid(format!("Deck capacity must be at least 1, got {capacity}")));
    }
    Ok(capacity)
}

#[derive(Clone)]
pub struct Inventory {
    store: Arc<dyn LedgerStore>,
    default_capacity: i32,
}

impl Inventory {
    pub fn new(store: Arc<dyn LedgerStore>, default_capacity: i32) -> Self {
        Self { store, default_capacity }
    }

    pub fn default_capacity(&self) -> i32 {
        self.default_capacity
    }

    /// Open a unit of work for callers that compose several operations themselves
    pub async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        Ok(self.store.begin().await?)
    }

    // Users and catalog

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    pub async fn create_user(&self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        if request.username.trim().is_empty() {
            return Err(LedgerError::invalid("Username must not be blank"));
        }
        let mut uow = self.begin().await?;
        let user = uow.create_user(request).await?;
        uow.commit().await?;
        Ok(user)
    }

    pub async fn get_user(&self, id: UserId) -> Result<UserDBResponse> {
        let mut uow = self.begin().await?;
        uow.get_user(id).await?.ok_or_else(|| LedgerError::not_found(Entity::User, id))
    }

    #[instrument(skip(self, request), fields(card_id = %abbrev_uuid(&request.id)), err)]
    pub async fn register_card(&self, request: &CardCreateDBRequest) -> Result<CardPrinting> {
        if request.name.trim().is_empty() {
            return Err(LedgerError::invalid("Card name must not be blank"));
        }
        if request.faces.is_empty() {
            return Err(LedgerError::invalid("A card printing needs at least one face"));
        }
        let mut uow = self.begin().await?;
        let card = uow.create_card(request).await?;
        uow.commit().await?;
        Ok(card)
    }

    pub async fn search_cards(&self, search: &CardSearch) -> Result<(Vec<CardPrinting>, i64)> {
        let mut uow = self.begin().await?;
        Ok(uow.search_cards(search).await?)
    }

    pub async fn get_card(&self, id: CardId) -> Result<CardPrinting> {
        let mut uow = self.begin().await?;
        uow.get_card(id).await?.ok_or_else(|| LedgerError::not_found(Entity::Card, id))
    }

    // Binder

    pub async fn credit_binder(&self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        let mut uow = self.begin().await?;
        let entry = BinderLedger::new(uow.as_mut()).credit(user_id, card_id, quantity).await?;
        uow.commit().await?;
        Ok(entry)
    }

    pub async fn debit_binder(&self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<Option<BinderEntry>> {
        let mut uow = self.begin().await?;
        let entry = BinderLedger::new(uow.as_mut()).debit(user_id, card_id, quantity).await?;
        uow.commit().await?;
        Ok(entry)
    }

    pub async fn binder_quantity(&self, user_id: UserId, card_id: CardId) -> Result<i64> {
        let mut uow = self.begin().await?;
        BinderLedger::new(uow.as_mut()).quantity_of(user_id, card_id).await
    }

    pub async fn list_binder(&self, user_id: UserId, search: &CardSearch) -> Result<(Vec<BinderListing>, i64)> {
        let mut uow = self.begin().await?;
        if !uow.user_exists(user_id).await? {
            return Err(LedgerError::not_found(Entity::User, user_id));
        }
        Ok(uow.list_binder(user_id, search).await?)
    }

    // Decks

    #[instrument(skip(self, draft), fields(owner_id = %abbrev_uuid(&draft.owner_id)), err)]
    pub async fn create_deck(&self, draft: DeckDraft) -> Result<Deck> {
        let name = non_blank("name", &draft.name)?;
        let format = non_blank("format", &draft.format)?;
        let capacity = match (draft.unlimited, draft.capacity) {
            (true, _) => None,
            (false, Some(capacity)) => Some(valid_capacity(capacity)?),
            (false, None) => Some(self.default_capacity),
        };

        let mut uow = self.begin().await?;
        if !uow.user_exists(draft.owner_id).await? {
            return Err(LedgerError::not_found(Entity::User, draft.owner_id));
        }
        let deck = uow
            .create_deck(&DeckCreateDBRequest {
                owner_id: draft.owner_id,
                name,
                format,
                capacity,
                notes: draft.notes,
            })
            .await?;
        uow.commit().await?;

        info!(deck_id = %abbrev_uuid(&deck.id), capacity = ?deck.capacity, "Deck created");
        Ok(deck)
    }

    pub async fn get_deck(&self, id: DeckId) -> Result<DeckDetail> {
        let mut uow = self.begin().await?;
        let deck = uow.get_deck(id).await?.ok_or_else(|| LedgerError::not_found(Entity::Deck, id))?;
        let entries = uow.deck_entries(id).await?;
        Ok(DeckDetail { deck, entries })
    }

    pub async fn list_user_decks(&self, owner_id: UserId) -> Result<Vec<DeckSummary>> {
        let mut uow = self.begin().await?;
        if !uow.user_exists(owner_id).await? {
            return Err(LedgerError::not_found(Entity::User, owner_id));
        }
        Ok(uow.list_user_decks(owner_id).await?)
    }

    /// Update name, format, notes and limit. A limit below the current total is rejected.
    #[instrument(skip(self, update), fields(deck_id = %abbrev_uuid(&id)), err)]
    pub async fn update_deck_metadata(&self, id: DeckId, update: DeckUpdateDBRequest) -> Result<Deck> {
        let update = DeckUpdateDBRequest {
            name: update.name.as_deref().map(|n| non_blank("name", n)).transpose()?,
            format: update.format.as_deref().map(|f| non_blank("format", f)).transpose()?,
            notes: update.notes,
            capacity: match update.capacity {
                Some(Some(capacity)) => Some(Some(valid_capacity(capacity)?)),
                other => other,
            },
        };

        let mut uow = self.begin().await?;
        DeckLedger::new(uow.as_mut()).lock_deck(id).await?;
        if let Some(limit) = update.capacity {
            let current = uow.total_allocated(id).await?;
            check_capacity(limit, current, 0)?;
        }
        let deck = uow.update_deck(id, &update).await?;
        uow.commit().await?;
        Ok(deck)
    }

    /// Delete a deck after returning every copy in it to the owner's binder
    pub async fn delete_deck(&self, id: DeckId) -> Result<ReleasedDeck> {
        let mut uow = self.begin().await?;
        let released = transfer::release_deck(uow.as_mut(), id).await?;
        uow.commit().await?;

        info!(deck_id = %abbrev_uuid(&id), returned = released.total_returned(), "Deck deleted");
        Ok(released)
    }

    pub async fn deck_totals(&self, id: DeckId) -> Result<DeckTotals> {
        let mut uow = self.begin().await?;
        let deck = uow.get_deck(id).await?.ok_or_else(|| LedgerError::not_found(Entity::Deck, id))?;
        let entries = uow.deck_entries(id).await?;

        let sum = |zone: Zone| -> i64 { entries.iter().filter(|e| e.zone == zone).map(|e| i64::from(e.quantity)).sum() };
        let main = sum(Zone::Main);
        let sideboard = sum(Zone::Sideboard);

        Ok(DeckTotals {
            deck_id: id,
            main,
            sideboard,
            total: main + sideboard,
            capacity: deck.capacity,
        })
    }

    pub async fn export_deck_list(&self, id: DeckId) -> Result<String> {
        let mut uow = self.begin().await?;
        if uow.get_deck(id).await?.is_none() {
            return Err(LedgerError::not_found(Entity::Deck, id));
        }
        let entries = uow.deck_entries(id).await?;
        let cards = uow.get_cards(entries.iter().map(|e| e.card_id).collect()).await?;

        let lines = entries
            .into_iter()
            .map(|e| {
                let name = cards
                    .get(&e.card_id)
                    .map(|c| c.name.clone())
                    .ok_or_else(|| LedgerError::not_found(Entity::Card, e.card_id))?;
                Ok(ExportLine {
                    zone: e.zone,
                    quantity: e.quantity,
                    name,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(render_deck_list(lines))
    }

    // Transfers

    pub async fn allocate(&self, deck_id: DeckId, card_id: CardId, quantity: i32, zone: Zone) -> Result<DeckEntry> {
        let mut uow = self.begin().await?;
        let entry = transfer::allocate(uow.as_mut(), deck_id, card_id, quantity, zone).await?;
        uow.commit().await?;
        Ok(entry)
    }

    pub async fn deallocate(&self, deck_id: DeckId, card_id: CardId, quantity: i32, zone: Option<Zone>) -> Result<Removal> {
        let mut uow = self.begin().await?;
        let removal = transfer::deallocate(uow.as_mut(), deck_id, card_id, quantity, zone).await?;
        uow.commit().await?;
        Ok(removal)
    }

    pub async fn transfer(
        &self,
        source_id: DeckId,
        destination_id: DeckId,
        card_id: CardId,
        quantity: i32,
        source_zone: Option<Zone>,
    ) -> Result<TransferOutcome> {
        let mut uow = self.begin().await?;
        let outcome = transfer::transfer(uow.as_mut(), source_id, destination_id, card_id, quantity, source_zone).await?;
        uow.commit().await?;
        Ok(outcome)
    }

    pub async fn move_zone(&self, deck_id: DeckId, card_id: CardId, quantity: i32, from: Zone, to: Zone) -> Result<ZoneMove> {
        let mut uow = self.begin().await?;
        let moved = transfer::move_zone(uow.as_mut(), deck_id, card_id, quantity, from, to).await?;
        uow.commit().await?;
        Ok(moved)
    }
}
