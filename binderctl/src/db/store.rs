//! PostgreSQL-backed [`LedgerStore`].
//!
//! Each unit of work is one read-committed transaction. Locking reads use `SELECT ... FOR
//! UPDATE`, quantity increments use `INSERT ... ON CONFLICT DO UPDATE`, so disjoint keys proceed in
//! parallel while operations on the same rows serialize. Dropping a [`PgUnitOfWork`] without
//! committing rolls the transaction back.

use crate::db::{
    errors::Result,
    handlers::{Binders, Cards, DeckEntries, Decks, Repository, Users},
    models::{
        binder::{BinderEntry, BinderListing},
        cards::{CardCreateDBRequest, CardPrinting, CardSearch},
        decks::{Deck, DeckCreateDBRequest, DeckEntry, DeckSummary, DeckUpdateDBRequest},
        users::{UserCreateDBRequest, UserDBResponse},
    },
};
use crate::ledger::{CardCatalog, LedgerStore, UnitOfWork, UserDirectory};
use crate::types::{CardId, DeckId, UserId, Zone};
use sqlx::{PgPool, Postgres, Transaction};
use std::collections::HashMap;

#[derive(Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl LedgerStore for PgLedgerStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl CardCatalog for PgUnitOfWork {
    async fn card_exists(&mut self, id: CardId) -> Result<bool> {
        Cards::new(&mut self.tx).exists(id).await
    }

    async fn get_card(&mut self, id: CardId) -> Result<Option<CardPrinting>> {
        Cards::new(&mut self.tx).get_by_id(id).await
    }

    async fn get_cards(&mut self, ids: Vec<CardId>) -> Result<HashMap<CardId, CardPrinting>> {
        Cards::new(&mut self.tx).get_bulk(ids).await
    }

    async fn search_cards(&mut self, search: &CardSearch) -> Result<(Vec<CardPrinting>, i64)> {
        Cards::new(&mut self.tx).search(search).await
    }

    async fn create_card(&mut self, request: &CardCreateDBRequest) -> Result<CardPrinting> {
        Cards::new(&mut self.tx).create(request).await
    }
}

#[async_trait::async_trait]
impl UserDirectory for PgUnitOfWork {
    async fn user_exists(&mut self, id: UserId) -> Result<bool> {
        Users::new(&mut self.tx).exists(id).await
    }

    async fn get_user(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        Users::new(&mut self.tx).get_by_id(id).await
    }

    async fn create_user(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        Users::new(&mut self.tx).create(request).await
    }
}

#[async_trait::async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn lock_binder_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<Option<BinderEntry>> {
        Binders::new(&mut self.tx).lock_entry(user_id, card_id).await
    }

    async fn add_binder_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        Binders::new(&mut self.tx).add_quantity(user_id, card_id, quantity).await
    }

    async fn set_binder_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        Binders::new(&mut self.tx).set_quantity(user_id, card_id, quantity).await
    }

    async fn delete_binder_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<bool> {
        Binders::new(&mut self.tx).delete_entry(user_id, card_id).await
    }

    async fn list_binder(&mut self, user_id: UserId, search: &CardSearch) -> Result<(Vec<BinderListing>, i64)> {
        Binders::new(&mut self.tx).list_for_user(user_id, search).await
    }

    async fn create_deck(&mut self, request: &DeckCreateDBRequest) -> Result<Deck> {
        Decks::new(&mut self.tx).create(request).await
    }

    async fn get_deck(&mut self, id: DeckId) -> Result<Option<Deck>> {
        Decks::new(&mut self.tx).get_by_id(id).await
    }

    async fn lock_decks(&mut self, ids: &[DeckId]) -> Result<HashMap<DeckId, Deck>> {
        Decks::new(&mut self.tx).lock_for_update(ids).await
    }

    async fn update_deck(&mut self, id: DeckId, request: &DeckUpdateDBRequest) -> Result<Deck> {
        Decks::new(&mut self.tx).update(id, request).await
    }

    async fn delete_deck(&mut self, id: DeckId) -> Result<bool> {
        Decks::new(&mut self.tx).delete(id).await
    }

    async fn list_user_decks(&mut self, owner_id: UserId) -> Result<Vec<DeckSummary>> {
        Decks::new(&mut self.tx).list_by_owner(owner_id).await
    }

    async fn deck_entries(&mut self, deck_id: DeckId) -> Result<Vec<DeckEntry>> {
        DeckEntries::new(&mut self.tx).list(deck_id).await
    }

    async fn lock_deck_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<Option<DeckEntry>> {
        DeckEntries::new(&mut self.tx).lock(deck_id, card_id, zone).await
    }

    async fn add_deck_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry> {
        DeckEntries::new(&mut self.tx).add_quantity(deck_id, card_id, zone, quantity).await
    }

    async fn set_deck_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry> {
        DeckEntries::new(&mut self.tx).set_quantity(deck_id, card_id, zone, quantity).await
    }

    async fn delete_deck_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<bool> {
        DeckEntries::new(&mut self.tx).delete(deck_id, card_id, zone).await
    }

    async fn delete_deck_entries(&mut self, deck_id: DeckId) -> Result<u64> {
        DeckEntries::new(&mut self.tx).delete_for_deck(deck_id).await
    }

    async fn total_allocated(&mut self, deck_id: DeckId) -> Result<i64> {
        DeckEntries::new(&mut self.tx).total(deck_id).await
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
