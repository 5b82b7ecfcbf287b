//! Database repositories for decks and their zone entries.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::decks::{Deck, DeckCreateDBRequest, DeckEntry, DeckSummary, DeckUpdateDBRequest},
};
use crate::types::{CardId, DeckId, UserId, Zone, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

// Database entity models
#[derive(Debug, Clone, FromRow)]
struct DeckRow {
    pub id: DeckId,
    pub owner_id: UserId,
    pub name: String,
    pub format: String,
    pub capacity: Option<i32>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DeckRow> for Deck {
    fn from(d: DeckRow) -> Self {
        Self {
            id: d.id,
            owner_id: d.owner_id,
            name: d.name,
            format: d.format,
            capacity: d.capacity,
            notes: d.notes,
            created_at: d.created_at,
            updated_at: d.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct SummaryRow {
    #[sqlx(flatten)]
    pub deck: DeckRow,
    pub card_count: i64,
}

#[derive(Debug, Clone, FromRow)]
struct EntryRow {
    pub deck_id: DeckId,
    pub card_id: CardId,
    pub zone: Zone,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<EntryRow> for DeckEntry {
    fn from(e: EntryRow) -> Self {
        Self {
            deck_id: e.deck_id,
            card_id: e.card_id,
            zone: e.zone,
            quantity: e.quantity,
            updated_at: e.updated_at,
        }
    }
}

const DECK_COLUMNS: &str = "id, owner_id, name, format, capacity, notes, created_at, updated_at";
const ENTRY_COLUMNS: &str = "deck_id, card_id, zone, quantity, updated_at";

pub struct Decks<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Decks<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Lock the given decks in ascending id order and return the ones that exist.
    ///
    /// Every operation that touches more than one deck goes through here so that concurrent
    /// transfers acquire row locks in the same order.
    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    pub async fn lock_for_update(&mut self, ids: &[DeckId]) -> Result<HashMap<DeckId, Deck>> {
        let mut sorted = ids.to_vec();
        sorted.sort();
        sorted.dedup();

        let rows = sqlx::query_as::<_, DeckRow>(&format!(
            "SELECT {DECK_COLUMNS} FROM decks WHERE id = ANY($1) ORDER BY id FOR UPDATE"
        ))
        .bind(&sorted)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(|d| (d.id, Deck::from(d))).collect())
    }

    /// Apply a partial metadata update. Returns `DbError::NotFound` if the deck does not exist.
    #[instrument(skip(self, request), fields(deck_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: DeckId, request: &DeckUpdateDBRequest) -> Result<Deck> {
        let (set_notes, notes) = match &request.notes {
            Some(notes) => (true, notes.as_deref()),
            None => (false, None),
        };
        let (set_capacity, capacity) = match request.capacity {
            Some(capacity) => (true, capacity),
            None => (false, None),
        };

        let deck = sqlx::query_as::<_, DeckRow>(&format!(
            r#"
            UPDATE decks SET
                name = COALESCE($2, name),
                format = COALESCE($3, format),
                notes = CASE WHEN $4 THEN $5 ELSE notes END,
                capacity = CASE WHEN $6 THEN $7 ELSE capacity END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {DECK_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.format)
        .bind(set_notes)
        .bind(notes)
        .bind(set_capacity)
        .bind(capacity)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(deck.into())
    }

    /// Delete a deck; its entries go with it through the cascade
    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&id)), err)]
    pub async fn delete(&mut self, id: DeckId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM decks WHERE id = $1")
            .bind(id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// All of a user's decks with their allocated totals, newest first
    #[instrument(skip(self), fields(owner_id = %abbrev_uuid(&owner_id)), err)]
    pub async fn list_by_owner(&mut self, owner_id: UserId) -> Result<Vec<DeckSummary>> {
        let rows = sqlx::query_as::<_, SummaryRow>(
            r#"
            SELECT d.id, d.owner_id, d.name, d.format, d.capacity, d.notes, d.created_at, d.updated_at,
                   COALESCE(SUM(e.quantity), 0)::BIGINT AS card_count
            FROM decks d
            LEFT JOIN deck_entries e ON e.deck_id = d.id
            WHERE d.owner_id = $1
            GROUP BY d.id
            ORDER BY d.created_at DESC, d.id
            "#,
        )
        .bind(owner_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| DeckSummary {
                deck: r.deck.into(),
                card_count: r.card_count,
            })
            .collect())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Decks<'c> {
    type CreateRequest = DeckCreateDBRequest;
    type Response = Deck;
    type Id = DeckId;

    #[instrument(skip(self, request), fields(owner_id = %abbrev_uuid(&request.owner_id), name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let deck = sqlx::query_as::<_, DeckRow>(&format!(
            r#"
            INSERT INTO decks (id, owner_id, name, format, capacity, notes)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {DECK_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.owner_id)
        .bind(&request.name)
        .bind(&request.format)
        .bind(request.capacity)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(deck.into())
    }

    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let deck = sqlx::query_as::<_, DeckRow>(&format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;
        Ok(deck.map(Deck::from))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<DeckId>) -> Result<HashMap<Self::Id, Deck>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let decks = sqlx::query_as::<_, DeckRow>(&format!("SELECT {DECK_COLUMNS} FROM decks WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        Ok(decks.into_iter().map(|d| (d.id, Deck::from(d))).collect())
    }
}

pub struct DeckEntries<'c> {
    db: &'c mut PgConnection,
}

impl<'c> DeckEntries<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Every entry of a deck, ordered by zone then card
    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id)), err)]
    pub async fn list(&mut self, deck_id: DeckId) -> Result<Vec<DeckEntry>> {
        let rows = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM deck_entries WHERE deck_id = $1 ORDER BY zone, card_id"
        ))
        .bind(deck_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(rows.into_iter().map(DeckEntry::from).collect())
    }

    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = %zone), err)]
    pub async fn lock(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<Option<DeckEntry>> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            "SELECT {ENTRY_COLUMNS} FROM deck_entries WHERE deck_id = $1 AND card_id = $2 AND zone = $3 FOR UPDATE"
        ))
        .bind(deck_id)
        .bind(card_id)
        .bind(zone)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(row.map(DeckEntry::from))
    }

    /// Add to a zone entry, creating it if absent
    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = %zone), err)]
    pub async fn add_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            INSERT INTO deck_entries (deck_id, card_id, zone, quantity)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (deck_id, card_id, zone)
            DO UPDATE SET quantity = deck_entries.quantity + EXCLUDED.quantity, updated_at = NOW()
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(deck_id)
        .bind(card_id)
        .bind(zone)
        .bind(quantity)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = %zone), err)]
    pub async fn set_quantity(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone, quantity: i32) -> Result<DeckEntry> {
        let row = sqlx::query_as::<_, EntryRow>(&format!(
            r#"
            UPDATE deck_entries
            SET quantity = $4, updated_at = NOW()
            WHERE deck_id = $1 AND card_id = $2 AND zone = $3
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(deck_id)
        .bind(card_id)
        .bind(zone)
        .bind(quantity)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(row.into())
    }

    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id), card_id = %abbrev_uuid(&card_id), zone = %zone), err)]
    pub async fn delete(&mut self, deck_id: DeckId, card_id: CardId, zone: Zone) -> Result<bool> {
        let result = sqlx::query("DELETE FROM deck_entries WHERE deck_id = $1 AND card_id = $2 AND zone = $3")
            .bind(deck_id)
            .bind(card_id)
            .bind(zone)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id)), err)]
    pub async fn delete_for_deck(&mut self, deck_id: DeckId) -> Result<u64> {
        let result = sqlx::query("DELETE FROM deck_entries WHERE deck_id = $1")
            .bind(deck_id)
            .execute(&mut *self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Sum of quantities across both zones
    #[instrument(skip(self), fields(deck_id = %abbrev_uuid(&deck_id)), err)]
    pub async fn total(&mut self, deck_id: DeckId) -> Result<i64> {
        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM deck_entries WHERE deck_id = $1",
        )
        .bind(deck_id)
        .fetch_one(&mut *self.db)
        .await?;
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::test_utils::{create_test_card, create_test_user};
    use sqlx::PgPool;

    fn deck_request(owner_id: UserId, name: &str) -> DeckCreateDBRequest {
        DeckCreateDBRequest {
            owner_id,
            name: name.to_string(),
            format: "modern".to_string(),
            capacity: Some(60),
            notes: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_update_delete_deck(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Decks::new(&mut conn);

        let deck = repo.create(&deck_request(user.id, "Burn")).await.unwrap();
        assert_eq!(deck.capacity, Some(60));

        let updated = repo
            .update(
                deck.id,
                &DeckUpdateDBRequest {
                    name: Some("Boros Burn".to_string()),
                    capacity: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Boros Burn");
        assert_eq!(updated.format, "modern");
        assert_eq!(updated.capacity, None);

        // Leaving capacity untouched keeps it unlimited
        let renamed = repo
            .update(
                deck.id,
                &DeckUpdateDBRequest {
                    notes: Some(Some("sideboard needs work".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.capacity, None);
        assert_eq!(renamed.notes.as_deref(), Some("sideboard needs work"));

        // Renaming keeps the notes, an explicit clear removes them
        let kept = repo
            .update(
                deck.id,
                &DeckUpdateDBRequest {
                    name: Some("Burn".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(kept.notes.as_deref(), Some("sideboard needs work"));
        let cleared = repo
            .update(
                deck.id,
                &DeckUpdateDBRequest {
                    notes: Some(None),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(cleared.notes, None);

        assert!(repo.delete(deck.id).await.unwrap());
        assert!(repo.get_by_id(deck.id).await.unwrap().is_none());
        assert!(matches!(
            repo.update(deck.id, &DeckUpdateDBRequest::default()).await,
            Err(DbError::NotFound)
        ));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_lock_for_update_skips_missing(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let mut tx = pool.begin().await.unwrap();
        let mut repo = Decks::new(&mut tx);

        let a = repo.create(&deck_request(user.id, "A")).await.unwrap();
        let b = repo.create(&deck_request(user.id, "B")).await.unwrap();

        let locked = repo.lock_for_update(&[b.id, a.id, Uuid::new_v4(), a.id]).await.unwrap();
        assert_eq!(locked.len(), 2);
        assert_eq!(locked[&a.id].name, "A");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_entries_and_totals(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let bolt = create_test_card(&pool, "Lightning Bolt").await;
        let pyro = create_test_card(&pool, "Pyroblast").await;
        let mut conn = pool.acquire().await.unwrap();

        let deck = Decks::new(&mut conn).create(&deck_request(user.id, "Burn")).await.unwrap();
        let mut entries = DeckEntries::new(&mut conn);

        entries.add_quantity(deck.id, bolt.id, Zone::Main, 3).await.unwrap();
        let merged = entries.add_quantity(deck.id, bolt.id, Zone::Main, 1).await.unwrap();
        assert_eq!(merged.quantity, 4);
        entries.add_quantity(deck.id, bolt.id, Zone::Sideboard, 1).await.unwrap();
        entries.add_quantity(deck.id, pyro.id, Zone::Sideboard, 2).await.unwrap();

        assert_eq!(entries.total(deck.id).await.unwrap(), 7);
        assert_eq!(entries.list(deck.id).await.unwrap().len(), 3);

        entries.set_quantity(deck.id, bolt.id, Zone::Main, 2).await.unwrap();
        assert!(entries.delete(deck.id, pyro.id, Zone::Sideboard).await.unwrap());
        assert_eq!(entries.total(deck.id).await.unwrap(), 3);

        let summaries = Decks::new(&mut conn).list_by_owner(user.id).await.unwrap();
        assert_eq!(summaries.len(), 1);
        assert_eq!(summaries[0].card_count, 3);

        let mut entries = DeckEntries::new(&mut conn);
        assert_eq!(entries.delete_for_deck(deck.id).await.unwrap(), 2);
        assert_eq!(entries.total(deck.id).await.unwrap(), 0);
    }
}
