//! Database repository for binder entries.
//!
//! The binder holds a user's unallocated copies. Every method here operates on the caller's
//! connection, which is expected to be inside a transaction for the locking reads to mean anything.

use crate::db::{
    errors::Result,
    handlers::cards::push_card_filter,
    models::{
        binder::{BinderEntry, BinderListing},
        cards::{CardFilter, CardSearch},
    },
};
use crate::types::{CardId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection, Postgres, QueryBuilder};
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Entry {
    pub user_id: UserId,
    pub card_id: CardId,
    pub quantity: i32,
    pub updated_at: DateTime<Utc>,
}

impl From<Entry> for BinderEntry {
    fn from(e: Entry) -> Self {
        Self {
            user_id: e.user_id,
            card_id: e.card_id,
            quantity: e.quantity,
            updated_at: e.updated_at,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct Listing {
    pub card_id: CardId,
    pub quantity: i32,
    pub name: String,
    pub set_code: Option<String>,
    pub rarity: Option<String>,
}

impl From<Listing> for BinderListing {
    fn from(l: Listing) -> Self {
        Self {
            card_id: l.card_id,
            quantity: l.quantity,
            name: l.name,
            set_code: l.set_code,
            rarity: l.rarity,
        }
    }
}

/// `FROM` and `WHERE` of a binder listing; the caller prepends the select list
fn binder_query<'a>(select: &str, user_id: UserId, filter: &CardFilter) -> QueryBuilder<'a, Postgres> {
    let mut query = QueryBuilder::new(format!(
        "{select} FROM binder_entries b JOIN cards c ON c.id = b.card_id WHERE b.user_id = "
    ));
    query.push_bind(user_id);
    push_card_filter(&mut query, filter);
    query
}

pub struct Binders<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Binders<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Read a binder entry and hold its row lock until the surrounding transaction ends
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), card_id = %abbrev_uuid(&card_id)), err)]
    pub async fn lock_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<Option<BinderEntry>> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            SELECT user_id, card_id, quantity, updated_at
            FROM binder_entries
            WHERE user_id = $1 AND card_id = $2
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(entry.map(BinderEntry::from))
    }

    /// Add to a holding, creating the row on first credit
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), card_id = %abbrev_uuid(&card_id)), err)]
    pub async fn add_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            INSERT INTO binder_entries (user_id, card_id, quantity)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, card_id)
            DO UPDATE SET quantity = binder_entries.quantity + EXCLUDED.quantity, updated_at = NOW()
            RETURNING user_id, card_id, quantity, updated_at
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .bind(quantity)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry.into())
    }

    /// Overwrite the quantity of an existing row. Returns `DbError::NotFound` if there is no row.
    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), card_id = %abbrev_uuid(&card_id)), err)]
    pub async fn set_quantity(&mut self, user_id: UserId, card_id: CardId, quantity: i32) -> Result<BinderEntry> {
        let entry = sqlx::query_as::<_, Entry>(
            r#"
            UPDATE binder_entries
            SET quantity = $3, updated_at = NOW()
            WHERE user_id = $1 AND card_id = $2
            RETURNING user_id, card_id, quantity, updated_at
            "#,
        )
        .bind(user_id)
        .bind(card_id)
        .bind(quantity)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(entry.into())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), card_id = %abbrev_uuid(&card_id)), err)]
    pub async fn delete_entry(&mut self, user_id: UserId, card_id: CardId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM binder_entries WHERE user_id = $1 AND card_id = $2")
            .bind(user_id)
            .bind(card_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// List a user's binder joined with the catalog, ordered by card name. Returns the page and
    /// the total number of matching entries.
    #[instrument(skip(self, search), fields(user_id = %abbrev_uuid(&user_id), skip = search.skip, limit = search.limit), err)]
    pub async fn list_for_user(&mut self, user_id: UserId, search: &CardSearch) -> Result<(Vec<BinderListing>, i64)> {
        let mut query = binder_query("SELECT b.card_id, b.quantity, c.name, c.set_code, c.rarity", user_id, &search.filter);
        query.push(" ORDER BY c.name, b.card_id OFFSET ");
        query.push_bind(search.skip);
        query.push(" LIMIT ");
        query.push_bind(search.limit);
        let rows = query.build_query_as::<Listing>().fetch_all(&mut *self.db).await?;

        let mut count = binder_query("SELECT COUNT(*)", user_id, &search.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *self.db).await?;

        Ok((rows.into_iter().map(BinderListing::from).collect(), total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::errors::DbError;
    use crate::db::handlers::{Cards, Repository};
    use crate::test_utils::{card_request, create_test_card, create_test_user};
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_quantity_upserts(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let card = create_test_card(&pool, "Lightning Bolt").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Binders::new(&mut conn);

        let first = repo.add_quantity(user.id, card.id, 3).await.unwrap();
        assert_eq!(first.quantity, 3);
        let second = repo.add_quantity(user.id, card.id, 2).await.unwrap();
        assert_eq!(second.quantity, 5);

        let locked = repo.lock_entry(user.id, card.id).await.unwrap().unwrap();
        assert_eq!(locked.quantity, 5);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_zero_quantity_rejected_by_check(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let card = create_test_card(&pool, "Lightning Bolt").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Binders::new(&mut conn);

        repo.add_quantity(user.id, card.id, 1).await.unwrap();
        let err = repo.set_quantity(user.id, card.id, 0).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_set_and_delete(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let card = create_test_card(&pool, "Counterspell").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Binders::new(&mut conn);

        assert!(matches!(repo.set_quantity(user.id, card.id, 4).await, Err(DbError::NotFound)));

        repo.add_quantity(user.id, card.id, 4).await.unwrap();
        assert_eq!(repo.set_quantity(user.id, card.id, 1).await.unwrap().quantity, 1);
        assert!(repo.delete_entry(user.id, card.id).await.unwrap());
        assert!(!repo.delete_entry(user.id, card.id).await.unwrap());
        assert!(repo.lock_entry(user.id, card.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_filters_by_name_substring(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let bolt = create_test_card(&pool, "Lightning Bolt").await;
        let helix = create_test_card(&pool, "Lightning Helix").await;
        let island = create_test_card(&pool, "Island").await;
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Binders::new(&mut conn);

        for (card, qty) in [(&bolt, 4), (&helix, 2), (&island, 20)] {
            repo.add_quantity(user.id, card.id, qty).await.unwrap();
        }

        let (all, total) = repo.list_for_user(user.id, &CardSearch::new(CardFilter::default(), 0, 10)).await.unwrap();
        assert_eq!(total, 3);
        assert_eq!(all[0].name, "Island");

        let (lightning, total) = repo
            .list_for_user(
                user.id,
                &CardSearch::new(
                    CardFilter {
                        name: Some("LIGHTNING".to_string()),
                        ..Default::default()
                    },
                    0,
                    1,
                ),
            )
            .await
            .unwrap();
        assert_eq!(total, 2);
        assert_eq!(lightning.len(), 1);
        assert_eq!(lightning[0].name, "Lightning Bolt");
        assert_eq!(lightning[0].quantity, 4);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_combines_card_and_face_filters(pool: PgPool) {
        let user = create_test_user(&pool, "alice").await;
        let other = create_test_user(&pool, "bob").await;
        let mut conn = pool.acquire().await.unwrap();

        let mut bolt = card_request("Lightning Bolt");
        bolt.faces[0].oracle_text = Some("Lightning Bolt deals 3 damage to any target.".to_string());
        let mut bears = card_request("Grizzly Bears");
        bears.rarity = Some("uncommon".to_string());
        bears.faces[0].type_line = Some("Creature - Bear".to_string());
        bears.faces[0].cmc = Some(2.0);
        for request in [&bolt, &bears] {
            Cards::new(&mut conn).create(request).await.unwrap();
        }

        let mut repo = Binders::new(&mut conn);
        repo.add_quantity(user.id, bolt.id, 4).await.unwrap();
        repo.add_quantity(user.id, bears.id, 2).await.unwrap();
        repo.add_quantity(other.id, bolt.id, 1).await.unwrap();

        let list = |filter: CardFilter| CardSearch::new(filter, 0, 10);

        let (found, total) = repo
            .list_for_user(
                user.id,
                &list(CardFilter {
                    type_line: Some("creature".to_string()),
                    cmc: Some(2.0),
                    rarity: Some("Uncommon".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(found[0].card_id, bears.id);
        assert_eq!(found[0].quantity, 2);

        let (found, _) = repo
            .list_for_user(
                user.id,
                &list(CardFilter {
                    oracle_text: Some("damage".to_string()),
                    set_code: Some("TST".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].quantity, 4);

        let (_, total) = repo
            .list_for_user(
                user.id,
                &list(CardFilter {
                    oracle_text: Some("damage".to_string()),
                    rarity: Some("uncommon".to_string()),
                    ..Default::default()
                }),
            )
            .await
            .unwrap();
        assert_eq!(total, 0);
    }
}
