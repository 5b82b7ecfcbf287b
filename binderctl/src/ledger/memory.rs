//! In-memory [`LedgerStore`] for development and for tests that run without PostgreSQL.
//!
//! A unit of work takes the store-wide lock for its whole lifetime and works on a staged copy of
//! the state. `commit` writes the copy back; dropping the unit discards it. Units therefore run
//! one at a time, which is stricter than the per-row locking of the PostgreSQL store.

use crate::db::errors::{DbError, Result};
use crate::db::models::{
    binder::{BinderEntry, BinderListing},
    cards::{CardCreateDBRequest, CardPrinting, CardSearch},
    decks::{Deck, DeckCreateDBRequest, DeckEntry, DeckSummary, DeckUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::ledger::{CardCatalog, LedgerStore, UnitOfWork, UserDirectory};
use crate::types::{CardId, DeckId, UserId, Zone};
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: HashMap<UserId, UserDBResponse>,
    cards: HashMap<CardId, CardPrinting>,
    binder: BTreeMap<(UserId, CardId), BinderEntry>,
    decks: HashMap<DeckId, Deck>,
    deck_entries: BTreeMap<(DeckId, CardId, Zone), DeckEntry>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl LedgerStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let staged = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, staged }))
    }
}

pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    staged: MemoryState,
}

fn check_violation(table: &str, constraint: &str) -> DbError {
    DbError::CheckViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("new row for relation \"{table}\" violates check constraint \"{constraint}\""),
    }
}

fn foreign_key_violation(table: &str, constraint: &str) -> DbError {
    DbError::ForeignKeyViolation {
        constraint: Some(constraint.to_string()),
        table: Some(table.to_string()),
        message: format!("insert or update on table \"{table}\" violates foreign key constraint \"{constraint}\""),
    }
}

/// Apply `skip` and `limit` to an already ordered result
fn page<T>(items: Vec<T>, search: &CardSearch) -> Vec<T> {
    items
        .into_iter()
        .skip(search.skip.max(0) as usize)
        .take(search.limit.max(0) as usize)
        .collect()
}

impl MemoryState {
    fn ensure_binder_refs(&self, user_id: UserId, card_id: CardId) -> Result<()> {
        if !self.users.contains_key(&user_id) {
            return Err(foreign_key_violation("binder_entries", "binder_entries_user_id_fkey"));
        }
        if !self.cards.contains_key(&card_id) {
            return Err(foreign_key_violation("binder_entries", "binder_entries_card_id_fkey"));
        }
        Ok(())
    }

    fn ensure_entry_refs(&self, deck_id: DeckId, card_id: CardId) -> Result<()> {
        if !self.decks.contains_key(&deck_id) {
            return Err(foreign_key_violation("deck_entries", "deck_entries_deck_id_fkey"));
        }
        if !self.cards.contains_key(&card_id) {
            return Err(foreign_key_violation("deck_entries", "deck_entries_card_id_fkey"));
        }
        Ok(())
    }

    fn validate_deck(name: &str, format: &str, capacity: Option<i32>) -> Result<()> {
        if name.trim().is_empty() {
            return Err(check_violation("decks", "decks_name_not_blank"));
        }
        if format.trim().is_empty() {
            return Err(check_violation("decks", "decks_format_not_blank"));
        }
        if capacity.is_some_and(|c| c <= 0) {
            return Err(check_violation("decks", "decks_capacity_positive"));
        }
        Ok(())
    }

    fn deck_total(&self, deck_id: DeckId) -> i64 {
        self.deck_entries
            .range((deck_id, Uuid::nil(), Zone::Main)..)
            .take_while(|((d, _, _), _)| *d == deck_id)
            .map(|(_, e)| i64::from(e.quantity))
            .sum()
    }
}

#[async_trait::async_trait]
impl CardCatalog for MemoryUnitOfWork {
    async fn card_exists(&mut self, id: CardId) -> Result<bool> {
        Ok(self.staged.cards.contains_key(&id))
    }

    async fn get_card(&mut self, id: CardId) -> Result<Option<CardPrinting>> {
        Ok(self.staged.cards.get(&id).cloned())
    }

    async fn get_cards(&mut self, ids: Vec<CardId>) -> Result<HashMap<CardId, CardPrinting>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.staged.cards.get(&id).map(|c| (id, c.clone())))
            .collect())
    }

    async fn search_cards(&mut self, search: &CardSearch) -> Result<(Vec<CardPrinting>, i64)> {
        let mut matching: Vec<&CardPrinting> = self.staged.cards.values().filter(|c| search.filter.matches(c)).collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));

        let total = matching.len() as i64;
        Ok((page(matching, search).into_iter().cloned().collect(), total))
    }

    async fn create_card(&mut self, request: &CardCreateDBRequest) -> Result<CardPrinting> {
        if self.staged.cards.contains_key(&request.id) {
            return Err(DbError::UniqueViolation {
                constraint: Some("cards_pkey".to_string()),
                table: Some("cards".to_string()),
                message: "duplicate key value violates unique constraint \"cards_pkey\"".to_string(),
                conflicting_value: Some(request.id.to_string()),
            });
        }

        let mut faces = request.faces.clone();
        faces.sort_by_key(|f| f.face_index);
        let card = CardPrinting {
            id: request.id,
            name: request.name.clone(),
            set_code: request.set_code.clone(),
            collector_number: request.collector_number.clone(),
            rarity: request.rarity.clone(),
            layout: request.layout.clone(),
            faces,
            created_at: Utc::now(),
        };
        self.staged.cards.insert(card.id, card.clone());
        Ok(card)
    }
}

#[async_trait::async_trait]
impl UserDirectory for MemoryUnitOfWork {
    async fn user_exists(&mut self, id: UserId) -> Result<bool> {
        Ok(self.staged.users.contains_key(&id))
    }

    async fn get_user(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        Ok(self.staged.users.get(&id).cloned())
    }

    async fn create_user(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        if request.username.trim().is_empty() {
            return Err(check_violation("users", "users_username_not_blank"));
        }
        if self.staged.users.values().any(|u| u.username == request.username) {
            return Err(DbError::UniqueViolation {
                constraint: Some("users_username_key".to_string()),
                table: Some("users".to_string()),
                message: "duplicate key value violates unique constraint \"users_username_key\"".to_string(),
                conflicting_value: Some(request.username.clone()),
            });
        }

        let user = UserDBResponse {
            id: Uuid::new_v4(),
            username: request.username.clone(),
            email: request.email.clone(),
            created_at: Utc::now(),
        };
        self.staged.users.insert(user.id, user.clone());
        Ok(user)
    }
}

#[async_trait::async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn lock_binder_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<Option<BinderEntry>> {
        Ok(self.staged.binder.get(&(user_id, card_id)).cloned())
    }

    async fn add_binder_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        self.staged.ensure_binder_refs(user_id, card_id)?;
        let current = self.staged.binder.get(&(user_id, card_id)).map_or(0, |e| e.quantity);
        let quantity = current
            .checked_add(quantity)
            .ok_or_else(|| DbError::Other(anyhow::anyhow!("integer out of range")))?;
        if quantity <= 0 {
            return Err(check_violation("binder_entries", "binder_entries_quantity_positive"));
        }

        let entry = BinderEntry {
            user_id,
            card_id,
            quantity,
            updated_at: Utc::now(),
        };
        self.staged.binder.insert((user_id, card_id), entry.clone());
        Ok(entry)
    }

    async fn set_binder_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        let entry = self.staged.binder.get_mut(&(user_id, card_id)).ok_or(DbError::NotFound)?;
        if quantity <= 0 {
            return Err(check_violation("binder_entries", "binder_entries_quantity_positive"));
        }
        entry.quantity = quantity;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn delete_binder_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<bool> {
        Ok(self.staged.binder.remove(&(user_id, card_id)).is_some())
    }

    async fn list_binder(&mut self, user_id: UserId, search: &CardSearch) -> Result<(Vec<BinderListing>, i64)> {
        let mut matching: Vec<BinderListing> = self
            .staged
            .binder
            .values()
            .filter(|e| e.user_id == user_id)
            .filter_map(|e| {
                let card = self.staged.cards.get(&e.card_id).filter(|c| search.filter.matches(c))?;
                Some(BinderListing {
                    card_id: e.card_id,
                    quantity: e.quantity,
                    name: card.name.clone(),
                    set_code: card.set_code.clone(),
                    rarity: card.rarity.clone(),
                })
            })
            .collect();
        matching.sort_by(|a, b| a.name.cmp(&b.name).then(a.card_id.cmp(&b.card_id)));

        let total = matching.len() as i64;
        Ok((page(matching, search), total))
    }

    async fn create_deck(&mut self, request: &DeckCreateDBRequest) -> Result<Deck> {
        if !self.staged.users.contains_key(&request.owner_id) {
            return Err(foreign_key_violation("decks", "decks_owner_id_fkey"));
        }
        MemoryState::validate_deck(&request.name, &request.format, request.capacity)?;

        let now = Utc::now();
        let deck = Deck {
            id: Uuid::new_v4(),
            owner_id: request.owner_id,
            name: request.name.clone(),
            format: request.format.clone(),
            capacity: request.capacity,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.staged.decks.insert(deck.id, deck.clone());
        Ok(deck)
    }

    async fn get_deck(&mut self, id: DeckId) -> Result<Option<Deck>> {
        Ok(self.staged.decks.get(&id).cloned())
    }

    async fn lock_decks(&mut self, ids: &[DeckId]) -> Result<HashMap<DeckId, Deck>> {
        Ok(ids
            .iter()
            .filter_map(|id| self.staged.decks.get(id).map(|d| (*id, d.clone())))
            .collect())
    }

    async fn update_deck(&mut self, id: DeckId, request: &DeckUpdateDBRequest) -> Result<Deck> {
        let current = self.staged.decks.get(&id).ok_or(DbError::NotFound)?;

        let mut updated = current.clone();
        if let Some(name) = &request.name {
            updated.name = name.clone();
        }
        if let Some(format) = &request.format {
            updated.format = format.clone();
        }
        if let Some(notes) = &request.notes {
            updated.notes = notes.clone();
        }
        if let Some(capacity) = request.capacity {
            updated.capacity = capacity;
        }
        MemoryState::validate_deck(&updated.name, &updated.format, updated.capacity)?;
        updated.updated_at = Utc::now();

        self.staged.decks.insert(id, updated.clone());
        Ok(updated)
    }

    async fn delete_deck(&mut self, id: DeckId) -> Result<bool> {
        let existed = self.staged.decks.remove(&id).is_some();
        self.staged.deck_entries.retain(|(deck_id, _, _), _| *deck_id != id);
        Ok(existed)
    }

    async fn list_user_decks(&mut self, owner_id: UserId) -> Result<Vec<DeckSummary>> {
        let mut summaries: Vec<DeckSummary> = self
            .staged
            .decks
            .values()
            .filter(|d| d.owner_id == owner_id)
            .map(|d| DeckSummary {
                deck: d.clone(),
                card_count: self.staged.deck_total(d.id),
            })
            .collect();
        summaries.sort_by(|a, b| b.deck.created_at.cmp(&a.deck.created_at).then(a.deck.id.cmp(&b.deck.id)));
        Ok(summaries)
    }

    async fn deck_entries(&mut self, deck_id: DeckId) -> Result<Vec<DeckEntry>> {
        let mut entries: Vec<DeckEntry> = self
            .staged
            .deck_entries
            .values()
            .filter(|e| e.deck_id == deck_id)
            .cloned()
            .collect();
        entries.sort_by_key(|e| (e.zone, e.card_id));
        Ok(entries)
    }

    async fn lock_deck_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<Option<DeckEntry>> {
        Ok(self.staged.deck_entries.get(&(deck_id, card_id, zone)).cloned())
    }

    async fn add_deck_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry> {
        self.staged.ensure_entry_refs(deck_id, card_id)?;
        let current = self
            .staged
            .deck_entries
            .get(&(deck_id, card_id, zone))
            .map_or(0, |e| e.quantity);
        let quantity = current
            .checked_add(quantity)
            .ok_or_else(|| DbError::Other(anyhow::anyhow!("integer out of range")))?;
        if quantity <= 0 {
            return Err(check_violation("deck_entries", "deck_entries_quantity_positive"));
        }

        let entry = DeckEntry {
            deck_id,
            card_id,
            zone,
            quantity,
            updated_at: Utc::now(),
        };
        self.staged.deck_entries.insert((deck_id, card_id, zone), entry.clone());
        Ok(entry)
    }

    async fn set_deck_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry> {
        let entry = self
            .staged
            .deck_entries
            .get_mut(&(deck_id, card_id, zone))
            .ok_or(DbError::NotFound)?;
        if quantity <= 0 {
            return Err(check_violation("deck_entries", "deck_entries_quantity_positive"));
        }
        entry.quantity = quantity;
        entry.updated_at = Utc::now();
        Ok(entry.clone())
    }

    async fn delete_deck_entry(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<bool> {
        Ok(self.staged.deck_entries.remove(&(deck_id, card_id, zone)).is_some())
    }

    async fn delete_deck_entries(&mut self, deck_id: DeckId) -> Result<u64> {
        let before = self.staged.deck_entries.len();
        self.staged.deck_entries.retain(|(d, _, _), _| *d != deck_id);
        Ok((before - self.staged.deck_entries.len()) as u64)
    }

    async fn total_allocated(&mut self, deck_id: DeckId) -> Result<i64> {
        Ok(self.staged.deck_total(deck_id))
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let MemoryUnitOfWork { mut guard, staged } = *self;
        *guard = staged;
        Ok(())
    }
}
