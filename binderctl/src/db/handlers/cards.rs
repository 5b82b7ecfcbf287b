//! Database repository for the card catalog.

use crate::db::{
    errors::Result,
    handlers::repository::Repository,
    models::cards::{CardCreateDBRequest, CardFace, CardFilter, CardPrinting, CardSearch},
};
use crate::types::{CardId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{Connection, FromRow, PgConnection, Postgres, QueryBuilder};
use std::collections::HashMap;
use tracing::instrument;

// Database entity model
#[derive(Debug, Clone, FromRow)]
struct Card {
    pub id: CardId,
    pub name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub layout: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct Face {
    pub card_id: CardId,
    #[sqlx(flatten)]
    pub face: CardFace,
}

impl From<(Card, Vec<CardFace>)> for CardPrinting {
    fn from((card, faces): (Card, Vec<CardFace>)) -> Self {
        Self {
            id: card.id,
            name: card.name,
            set_code: card.set_code,
            collector_number: card.collector_number,
            rarity: card.rarity,
            layout: card.layout,
            faces,
            created_at: card.created_at,
        }
    }
}

const CARD_COLUMNS: &str = "id, name, set_code, collector_number, rarity, layout, created_at";
const FACE_COLUMNS: &str = "card_id, face_index, name, mana_cost, cmc, type_line, oracle_text, colors, power, toughness, image_url";

/// Append the filter as `AND` predicates to a query that selects from `cards c`
pub(crate) fn push_card_filter(query: &mut QueryBuilder<'_, Postgres>, filter: &CardFilter) {
    if let Some(name) = &filter.name {
        query.push(" AND strpos(lower(c.name), lower(").push_bind(name.clone()).push(")) > 0");
    }
    if let Some(rarity) = &filter.rarity {
        query.push(" AND lower(c.rarity) = lower(").push_bind(rarity.clone()).push(")");
    }
    if let Some(set_code) = &filter.set_code {
        query.push(" AND lower(c.set_code) = lower(").push_bind(set_code.clone()).push(")");
    }

    if filter.has_face_criteria() {
        query.push(" AND EXISTS (SELECT 1 FROM card_faces f WHERE f.card_id = c.id");
        if let Some(oracle_text) = &filter.oracle_text {
            query
                .push(" AND strpos(lower(f.oracle_text), lower(")
                .push_bind(oracle_text.clone())
                .push(")) > 0");
        }
        if let Some(cmc) = filter.cmc {
            query.push(" AND f.cmc = ").push_bind(cmc);
        }
        if let Some(type_line) = &filter.type_line {
            query
                .push(" AND strpos(lower(f.type_line), lower(")
                .push_bind(type_line.clone())
                .push(")) > 0");
        }
        query.push(")");
    }
}

pub struct Cards<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Cards<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Check whether a printing exists in the catalog
    #[instrument(skip(self), fields(card_id = %abbrev_uuid(&id)), err)]
    pub async fn exists(&mut self, id: CardId) -> Result<bool> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM cards WHERE id = $1)")
            .bind(id)
            .fetch_one(&mut *self.db)
            .await?;
        Ok(exists)
    }

    /// Filtered catalog page ordered by name, with the total number of matching printings
    #[instrument(skip(self, search), fields(skip = search.skip, limit = search.limit), err)]
    pub async fn search(&mut self, search: &CardSearch) -> Result<(Vec<CardPrinting>, i64)> {
        let mut query = QueryBuilder::new(format!("SELECT {CARD_COLUMNS} FROM cards c WHERE 1=1"));
        push_card_filter(&mut query, &search.filter);
        query.push(" ORDER BY c.name, c.id OFFSET ");
        query.push_bind(search.skip);
        query.push(" LIMIT ");
        query.push_bind(search.limit);

        let cards = query.build_query_as::<Card>().fetch_all(&mut *self.db).await?;

        let mut count = QueryBuilder::new("SELECT COUNT(*) FROM cards c WHERE 1=1");
        push_card_filter(&mut count, &search.filter);
        let total: i64 = count.build_query_scalar().fetch_one(&mut *self.db).await?;

        let ids: Vec<CardId> = cards.iter().map(|c| c.id).collect();
        let mut faces = self.faces_for(&ids).await?;

        let page = cards
            .into_iter()
            .map(|card| {
                let card_faces = faces.remove(&card.id).unwrap_or_default();
                CardPrinting::from((card, card_faces))
            })
            .collect();
        Ok((page, total))
    }

    async fn faces_for(&mut self, ids: &[CardId]) -> Result<HashMap<CardId, Vec<CardFace>>> {
        let faces = sqlx::query_as::<_, Face>(&format!(
            "SELECT {FACE_COLUMNS} FROM card_faces WHERE card_id = ANY($1) ORDER BY card_id, face_index"
        ))
        .bind(ids)
        .fetch_all(&mut *self.db)
        .await?;

        let mut grouped: HashMap<CardId, Vec<CardFace>> = HashMap::new();
        for f in faces {
            grouped.entry(f.card_id).or_default().push(f.face);
        }
        Ok(grouped)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Cards<'c> {
    type CreateRequest = CardCreateDBRequest;
    type Response = CardPrinting;
    type Id = CardId;

    #[instrument(skip(self, request), fields(card_id = %abbrev_uuid(&request.id), name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let mut tx = self.db.begin().await?;

        let card = sqlx::query_as::<_, Card>(&format!(
            r#"
            INSERT INTO cards (id, name, set_code, collector_number, rarity, layout)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {CARD_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(&request.name)
        .bind(&request.set_code)
        .bind(&request.collector_number)
        .bind(&request.rarity)
        .bind(&request.layout)
        .fetch_one(&mut *tx)
        .await?;

        for face in &request.faces {
            sqlx::query(
                r#"
                INSERT INTO card_faces
                    (card_id, face_index, name, mana_cost, cmc, type_line, oracle_text, colors, power, toughness, image_url)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                "#,
            )
            .bind(card.id)
            .bind(face.face_index)
            .bind(&face.name)
            .bind(&face.mana_cost)
            .bind(face.cmc)
            .bind(&face.type_line)
            .bind(&face.oracle_text)
            .bind(&face.colors)
            .bind(&face.power)
            .bind(&face.toughness)
            .bind(&face.image_url)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        let mut faces = request.faces.clone();
        faces.sort_by_key(|f| f.face_index);
        Ok(CardPrinting::from((card, faces)))
    }

    #[instrument(skip(self), fields(card_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let card = sqlx::query_as::<_, Card>(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        let Some(card) = card else {
            return Ok(None);
        };

        let faces = self.faces_for(&[id]).await?.remove(&id).unwrap_or_default();
        Ok(Some(CardPrinting::from((card, faces))))
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<CardId>) -> Result<HashMap<Self::Id, CardPrinting>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let cards = sqlx::query_as::<_, Card>(&format!("SELECT {CARD_COLUMNS} FROM cards WHERE id = ANY($1)"))
            .bind(&ids)
            .fetch_all(&mut *self.db)
            .await?;

        let mut faces = self.faces_for(&ids).await?;

        Ok(cards
            .into_iter()
            .map(|card| {
                let card_faces = faces.remove(&card.id).unwrap_or_default();
                (card.id, CardPrinting::from((card, card_faces)))
            })
            .collect())
    }
}
