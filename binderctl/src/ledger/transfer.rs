//! Multi-step moves between the binder and decks.
//!
//! Every function here runs inside the caller's unit of work and either completes or returns the
//! first error unchanged. Rolling back partial writes is the unit's job: callers drop it instead of
//! committing.

use super::binder::{BinderLedger, ensure_positive};
use super::deck::{DeckLedger, Removal};
use super::errors::{Entity, LedgerError, Result};
use super::store::UnitOfWork;
use crate::db::models::decks::{Deck, DeckEntry};
use crate::types::{CardId, DeckId, Zone, abbrev_uuid};
use std::collections::BTreeMap;
use tracing::{debug, instrument};

/// Result of a deck-to-deck transfer
#[derive(Debug, Clone, PartialEq)]
pub struct TransferOutcome {
    pub source: Removal,
    pub destination: DeckEntry,
}

/// Result of moving copies between the zones of one deck
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneMove {
    pub from: Removal,
    pub to: DeckEntry,
}

/// A deleted deck and the copies it returned to its owner's binder
#[derive(Debug, Clone, PartialEq)]
pub struct ReleasedDeck {
    pub deck: Deck,
    pub returned: Vec<(CardId, i64)>,
}

impl ReleasedDeck {
    pub fn total_returned(&self) -> i64 {
        self.returned.iter().map(|(_, q)| q).sum()
    }
}

/// Move copies from the owner's binder into a deck zone
#[instrument(skip(uow), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = %zone), err)]
pub async fn allocate(uow: &mut dyn UnitOfWork, deck_id: DeckId, card_id: CardId, quantity: i32, zone: Zone) -> Result<DeckEntry> {
    ensure_positive(quantity)?;

    let deck = DeckLedger::new(uow).lock_deck(deck_id).await?;
    if !uow.card_exists(card_id).await? {
        return Err(LedgerError::not_found(Entity::Card, card_id));
    }

    DeckLedger::new(uow).check_capacity(&deck, quantity).await?;

    let have = BinderLedger::new(uow).quantity_of(deck.owner_id, card_id).await?;
    if have < i64::from(quantity) {
        return Err(LedgerError::InsufficientQuantity {
            have,
            want: i64::from(quantity),
        });
    }

    BinderLedger::new(uow).debit(deck.owner_id, card_id, quantity).await?;
    DeckLedger::new(uow).add_to_zone(deck_id, card_id, quantity, zone).await
}

/// Move copies from a deck zone back to the owner's binder
#[instrument(skip(uow), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = ?zone), err)]
pub async fn deallocate(uow: &mut dyn UnitOfWork, deck_id: DeckId, card_id: CardId, quantity: i32, zone: Option<Zone>) -> Result<Removal> {
    ensure_positive(quantity)?;

    let deck = DeckLedger::new(uow).lock_deck(deck_id).await?;
    let removal = DeckLedger::new(uow).remove_from_zone(deck_id, card_id, quantity, zone).await?;
    BinderLedger::new(uow).credit(deck.owner_id, card_id, quantity).await?;

    Ok(removal)
}

/// Move copies from one deck to the main zone of another deck of the same owner
#[instrument(skip(uow), fields(source = %abbrev_uuid(&source_id), destination = %abbrev_uuid(&destination_id), card_id = %abbrev_uuid(&card_id)), err)]
pub async fn transfer(
    uow: &mut dyn UnitOfWork,
    source_id: DeckId,
    destination_id: DeckId,
    card_id: CardId,
    quantity: i32,
    source_zone: Option<Zone>,
) -> Result<TransferOutcome> {
    ensure_positive(quantity)?;
    if source_id == destination_id {
        return Err(LedgerError::invalid("Source and destination decks must differ"));
    }

    // Both rows are locked here, in id order, before either is touched
    let mut decks = uow.lock_decks(&[source_id, destination_id]).await?;
    let source = decks
        .remove(&source_id)
        .ok_or_else(|| LedgerError::not_found(Entity::Deck, source_id))?;
    let destination = decks
        .remove(&destination_id)
        .ok_or_else(|| LedgerError::not_found(Entity::Deck, destination_id))?;

    if source.owner_id != destination.owner_id {
        return Err(LedgerError::invalid("Cards can only be transferred between decks of the same owner"));
    }

    DeckLedger::new(uow).check_capacity(&destination, quantity).await?;

    let removed = deallocate(uow, source_id, card_id, quantity, source_zone).await?;
    let added = allocate(uow, destination_id, card_id, quantity, Zone::Main).await?;

    Ok(TransferOutcome {
        source: removed,
        destination: added,
    })
}

/// Return every entry of a deck to its owner's binder and delete the deck
#[instrument(skip(uow), fields(deck_id = %abbrev_uuid(&deck_id)), err)]
pub async fn release_deck(uow: &mut dyn UnitOfWork, deck_id: DeckId) -> Result<ReleasedDeck> {
    let deck = DeckLedger::new(uow).lock_deck(deck_id).await?;
    let mut entries = uow.deck_entries(deck_id).await?;

    // Binder rows are locked in ascending card order so crossed releases cannot deadlock
    entries.sort_by_key(|entry| (entry.card_id, entry.zone));

    let mut returned: BTreeMap<CardId, i64> = BTreeMap::new();
    for entry in &entries {
        BinderLedger::new(uow).credit(deck.owner_id, entry.card_id, entry.quantity).await?;
        *returned.entry(entry.card_id).or_default() += i64::from(entry.quantity);
    }

    let cleared = uow.delete_deck_entries(deck_id).await?;
    if !uow.delete_deck(deck_id).await? {
        return Err(LedgerError::not_found(Entity::Deck, deck_id));
    }
    debug!(entries = cleared, "Deck released");

    Ok(ReleasedDeck {
        deck,
        returned: returned.into_iter().collect(),
    })
}

/// Move copies between the zones of one deck; the binder and the deck total are unchanged
#[instrument(skip(uow), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), from = %from, to = %to), err)]
pub async fn move_zone(uow: &mut dyn UnitOfWork, deck_id: DeckId, card_id: CardId, quantity: i32, from: Zone, to: Zone) -> Result<ZoneMove> {
    ensure_positive(quantity)?;
    if from == to {
        return Err(LedgerError::invalid(format!("Card is already in the {to} zone")));
    }

    DeckLedger::new(uow).lock_deck(deck_id).await?;
    let removed = DeckLedger::new(uow).remove_from_zone(deck_id, card_id, quantity, Some(from)).await?;
    let added = DeckLedger::new(uow).add_to_zone(deck_id, card_id, quantity, to).await?;

    Ok(ZoneMove { from: removed, to: added })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{LedgerStore, MemoryStore};
    use crate::test_utils::{MemoryFixture, memory_deck, memory_fixture};
    use crate::types::UserId;

    async fn credit(store: &MemoryStore, user: UserId, card: CardId, quantity: i32) {
        let mut uow = store.begin().await.unwrap();
        BinderLedger::new(uow.as_mut()).credit(user, card, quantity).await.unwrap();
        uow.commit().await.unwrap();
    }

    async fn held(store: &MemoryStore, user: UserId, card: CardId) -> i64 {
        let mut uow = store.begin().await.unwrap();
        BinderLedger::new(uow.as_mut()).quantity_of(user, card).await.unwrap()
    }

    async fn allocated(store: &MemoryStore, deck: DeckId) -> i64 {
        let mut uow = store.begin().await.unwrap();
        uow.total_allocated(deck).await.unwrap()
    }

    #[tokio::test]
    async fn test_allocate_insufficient_leaves_both_sides() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let deck = memory_deck(&store, user, Some(60)).await;
        credit(&store, user, bolt, 2).await;

        let mut uow = store.begin().await.unwrap();
        let err = allocate(uow.as_mut(), deck.id, bolt, 3, Zone::Main).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientQuantity { have: 2, want: 3 }));
        drop(uow);

        assert_eq!(held(&store, user, bolt).await, 2);
        assert_eq!(allocated(&store, deck.id).await, 0);
    }

    #[tokio::test]
    async fn test_allocate_without_binder_entry() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let deck = memory_deck(&store, user, None).await;

        let mut uow = store.begin().await.unwrap();
        let err = allocate(uow.as_mut(), deck.id, bolt, 1, Zone::Main).await.unwrap_err();
        assert!(matches!(err, LedgerError::InsufficientQuantity { have: 0, want: 1 }));
    }

    #[tokio::test]
    async fn test_allocate_capacity_boundary() {
        let MemoryFixture {
            store, user, bolt, island, ..
        } = memory_fixture().await;
        let deck = memory_deck(&store, user, Some(60)).await;
        credit(&store, user, island, 59).await;
        credit(&store, user, bolt, 2).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), deck.id, island, 59, Zone::Main).await.unwrap();
        let err = allocate(uow.as_mut(), deck.id, bolt, 2, Zone::Sideboard).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CapacityExceeded {
                current: 59,
                limit: 60,
                attempted: 2
            }
        ));

        // Exactly reaching the limit is fine
        let entry = allocate(uow.as_mut(), deck.id, bolt, 1, Zone::Sideboard).await.unwrap();
        assert_eq!(entry.quantity, 1);
        uow.commit().await.unwrap();

        assert_eq!(allocated(&store, deck.id).await, 60);
        assert_eq!(held(&store, user, bolt).await, 1);
    }

    #[tokio::test]
    async fn test_deallocate_returns_to_binder() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let deck = memory_deck(&store, user, None).await;
        credit(&store, user, bolt, 4).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), deck.id, bolt, 4, Zone::Main).await.unwrap();
        let removal = deallocate(uow.as_mut(), deck.id, bolt, 1, None).await.unwrap();
        assert!(matches!(removal, Removal::Remaining(ref e) if e.quantity == 3));
        let removal = deallocate(uow.as_mut(), deck.id, bolt, 3, Some(Zone::Main)).await.unwrap();
        assert_eq!(removal, Removal::Removed { zone: Zone::Main });
        uow.commit().await.unwrap();

        assert_eq!(held(&store, user, bolt).await, 4);
        assert_eq!(allocated(&store, deck.id).await, 0);
    }

    #[tokio::test]
    async fn test_transfer_full_entry() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let source = memory_deck(&store, user, None).await;
        let destination = memory_deck(&store, user, Some(60)).await;
        credit(&store, user, bolt, 4).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), source.id, bolt, 4, Zone::Main).await.unwrap();
        let outcome = transfer(uow.as_mut(), source.id, destination.id, bolt, 4, None).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(outcome.source, Removal::Removed { zone: Zone::Main });
        assert_eq!((outcome.destination.zone, outcome.destination.quantity), (Zone::Main, 4));
        assert_eq!(allocated(&store, source.id).await, 0);
        assert_eq!(allocated(&store, destination.id).await, 4);
        assert_eq!(held(&store, user, bolt).await, 0);
    }

    #[tokio::test]
    async fn test_transfer_rejects_same_deck_and_other_owner() {
        let MemoryFixture {
            store,
            user,
            other_user,
            bolt,
            ..
        } = memory_fixture().await;
        let mine = memory_deck(&store, user, None).await;
        let theirs = memory_deck(&store, other_user, None).await;
        credit(&store, user, bolt, 4).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), mine.id, bolt, 4, Zone::Main).await.unwrap();

        let err = transfer(uow.as_mut(), mine.id, mine.id, bolt, 1, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));

        let err = transfer(uow.as_mut(), mine.id, theirs.id, bolt, 1, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
        assert_eq!(uow.total_allocated(mine.id).await.unwrap(), 4);
        assert_eq!(uow.total_allocated(theirs.id).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_transfer_checks_destination_before_moving() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let source = memory_deck(&store, user, None).await;
        let destination = memory_deck(&store, user, Some(2)).await;
        credit(&store, user, bolt, 4).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), source.id, bolt, 4, Zone::Main).await.unwrap();

        let err = transfer(uow.as_mut(), source.id, destination.id, bolt, 3, None).await.unwrap_err();
        assert!(matches!(
            err,
            LedgerError::CapacityExceeded {
                current: 0,
                limit: 2,
                attempted: 3
            }
        ));
        assert_eq!(uow.total_allocated(source.id).await.unwrap(), 4);
    }

    #[tokio::test]
    async fn test_transfer_missing_deck() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let source = memory_deck(&store, user, None).await;
        let missing = uuid::Uuid::new_v4();

        let mut uow = store.begin().await.unwrap();
        let err = transfer(uow.as_mut(), source.id, missing, bolt, 1, None).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: Entity::Deck, ref id } if *id == missing.to_string()));
    }

    #[tokio::test]
    async fn test_dropped_unit_discards_partial_moves() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let deck = memory_deck(&store, user, None).await;
        credit(&store, user, bolt, 4).await;
        {
            let mut uow = store.begin().await.unwrap();
            allocate(uow.as_mut(), deck.id, bolt, 4, Zone::Main).await.unwrap();
            uow.commit().await.unwrap();
        }

        // First half succeeds, second half fails; the caller drops the unit
        let mut uow = store.begin().await.unwrap();
        deallocate(uow.as_mut(), deck.id, bolt, 2, None).await.unwrap();
        let err = allocate(uow.as_mut(), uuid::Uuid::new_v4(), bolt, 2, Zone::Main).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: Entity::Deck, .. }));
        drop(uow);

        assert_eq!(allocated(&store, deck.id).await, 4);
        assert_eq!(held(&store, user, bolt).await, 0);
    }

    #[tokio::test]
    async fn test_release_deck_returns_every_zone() {
        let MemoryFixture {
            store, user, bolt, island, ..
        } = memory_fixture().await;
        let deck = memory_deck(&store, user, None).await;
        credit(&store, user, bolt, 4).await;
        credit(&store, user, island, 10).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), deck.id, bolt, 3, Zone::Main).await.unwrap();
        allocate(uow.as_mut(), deck.id, bolt, 1, Zone::Sideboard).await.unwrap();
        allocate(uow.as_mut(), deck.id, island, 10, Zone::Main).await.unwrap();

        let released = release_deck(uow.as_mut(), deck.id).await.unwrap();
        uow.commit().await.unwrap();

        assert_eq!(released.total_returned(), 14);
        let bolt_returned = released.returned.iter().find(|(card, _)| *card == bolt).map(|(_, q)| *q);
        assert_eq!(bolt_returned, Some(4));
        assert_eq!(held(&store, user, bolt).await, 4);
        assert_eq!(held(&store, user, island).await, 10);

        let mut uow = store.begin().await.unwrap();
        assert!(uow.get_deck(deck.id).await.unwrap().is_none());
        assert!(uow.deck_entries(deck.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_move_zone() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let deck = memory_deck(&store, user, Some(4)).await;
        credit(&store, user, bolt, 4).await;

        let mut uow = store.begin().await.unwrap();
        allocate(uow.as_mut(), deck.id, bolt, 4, Zone::Main).await.unwrap();

        // A full deck can still rearrange its zones
        let moved = move_zone(uow.as_mut(), deck.id, bolt, 4, Zone::Main, Zone::Sideboard).await.unwrap();
        assert_eq!(moved.from, Removal::Removed { zone: Zone::Main });
        assert_eq!((moved.to.zone, moved.to.quantity), (Zone::Sideboard, 4));
        assert_eq!(uow.total_allocated(deck.id).await.unwrap(), 4);

        let err = move_zone(uow.as_mut(), deck.id, bolt, 1, Zone::Main, Zone::Sideboard).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { entity: Entity::DeckEntry, .. }));

        let err = move_zone(uow.as_mut(), deck.id, bolt, 1, Zone::Sideboard, Zone::Sideboard).await.unwrap_err();
        assert!(matches!(err, LedgerError::InvalidArgument { .. }));
    }

    #[tokio::test]
    async fn test_non_positive_quantities_rejected_everywhere() {
        let MemoryFixture { store, user, bolt, .. } = memory_fixture().await;
        let a = memory_deck(&store, user, None).await;
        let b = memory_deck(&store, user, None).await;

        let mut uow = store.begin().await.unwrap();
        for quantity in [0, -1] {
            assert!(matches!(
                allocate(uow.as_mut(), a.id, bolt, quantity, Zone::Main).await,
                Err(LedgerError::InvalidArgument { .. })
            ));
            assert!(matches!(
                deallocate(uow.as_mut(), a.id, bolt, quantity, None).await,
                Err(LedgerError::InvalidArgument { .. })
            ));
            assert!(matches!(
                transfer(uow.as_mut(), a.id, b.id, bolt, quantity, None).await,
                Err(LedgerError::InvalidArgument { .. })
            ));
            assert!(matches!(
                move_zone(uow.as_mut(), a.id, bolt, quantity, Zone::Main, Zone::Sideboard).await,
                Err(LedgerError::InvalidArgument { .. })
            ));
        }
    }
}
