//! Deck ledger: per-(deck, card, zone) allocations.

use super::binder::ensure_positive;
use super::capacity::check_capacity;
use super::errors::{Entity, LedgerError, Result};
use super::store::UnitOfWork;
use crate::db::models::decks::{Deck, DeckEntry};
use crate::types::{CardId, DeckId, Zone, abbrev_uuid};
use tracing::instrument;

/// Outcome of removing copies from a deck zone
#[derive(Debug, Clone, PartialEq)]
pub enum Removal {
    /// The entry still holds copies
    Remaining(DeckEntry),
    /// The entry was exactly depleted and deleted
    Removed { zone: Zone },
}

impl Removal {
    pub fn zone(&self) -> Zone {
        match self {
            Removal::Remaining(entry) => entry.zone,
            Removal::Removed { zone } => *zone,
        }
    }
}

/// Deck zone operations scoped to one unit of work
pub struct DeckLedger<'u> {
    uow: &'u mut dyn UnitOfWork,
}

impl<'u> DeckLedger<'u> {
    pub fn new(uow: &'u mut dyn UnitOfWork) -> Self {
        Self { uow }
    }

    /// Fetch a deck for update, or `NotFound`
    pub async fn lock_deck(&mut self, deck_id: DeckId) -> Result<Deck> {
        self.uow
            .lock_decks(&[deck_id])
            .await?
            .remove(&deck_id)
            .ok_or_else(|| LedgerError::not_found(Entity::Deck, deck_id))
    }

    /// Total allocated across both zones; 0 for an empty deck
    pub async fn total_allocated(&mut self, deck_id: DeckId) -> Result<i64> {
        Ok(self.uow.total_allocated(deck_id).await?)
    }

    /// Check `attempted` more copies against the deck's limit
    pub async fn check_capacity(&mut self, deck: &Deck, attempted: i32) -> Result<()> {
        let current = self.uow.total_allocated(deck.id).await?;
        check_capacity(deck.capacity, current, i64::from(attempted))
    }

    /// Add copies to a zone, merging with an existing entry.
    ///
    /// Callers are responsible for the capacity check and for debiting the binder first.
    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = %zone), err)]
    pub async fn add_to_zone(&mut self, deck_id: DeckId, card_id: CardId, quantity: i32, zone: Zone) -> Result<DeckEntry> {
        ensure_positive(quantity)?;

        if self.uow.get_deck(deck_id).await?.is_none() {
            return Err(LedgerError::not_found(Entity::Deck, deck_id));
        }
        if !self.uow.card_exists(card_id).await? {
            return Err(LedgerError::not_found(Entity::Card, card_id));
        }

        let current = self.uow.lock_deck_entry(deck_id, card_id, zone).await?.map_or(0, |e| e.quantity);
        if current.checked_add(quantity).is_none() {
            return Err(LedgerError::invalid(format!("Entry of {current} cannot grow by {quantity}")));
        }

        Ok(self.uow.add_deck_quantity(deck_id, card_id, zone, quantity).await?)
    }

    /// Remove copies from a zone.
    ///
    /// With an explicit zone exactly that entry is targeted. Without one the card must resolve to
    /// a single entry, main before sideboard; a removal never spills across zones.
    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = ?zone), err)]
    pub async fn remove_from_zone(&mut self, deck_id: DeckId, card_id: CardId, quantity: i32, zone: Option<Zone>) -> Result<Removal> {
        ensure_positive(quantity)?;

        let entry = self.resolve_entry(deck_id, card_id, zone).await?;

        if quantity > entry.quantity {
            return Err(LedgerError::InsufficientQuantity {
                have: i64::from(entry.quantity),
                want: i64::from(quantity),
            });
        }

        if quantity == entry.quantity {
            self.uow.delete_deck_entry(deck_id, card_id, entry.zone).await?;
            return Ok(Removal::Removed { zone: entry.zone });
        }

        let remaining = self
            .uow
            .set_deck_quantity(deck_id, card_id, entry.zone, entry.quantity - quantity)
            .await?;
        Ok(Removal::Remaining(remaining))
    }

    async fn resolve_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Option<Zone>) -> Result<DeckEntry> {
        let candidates: &[Zone] = match &zone {
            Some(zone) => std::slice::from_ref(zone),
            None => &Zone::PRIORITY,
        };

        for zone in candidates {
            if let Some(entry) = self.uow.lock_deck_entry(deck_id, card_id, *zone).await? {
                return Ok(entry);
            }
        }

        Err(LedgerError::not_found(Entity::DeckEntry, format!("{deck_id}/{card_id}")))
    }
}
