//! API request/response models for the card catalog.

use super::pagination::Pagination;
use crate::db::models::cards::{CardCreateDBRequest, CardFace, CardFilter, CardPrinting};
use crate::types::CardId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, serde_as};
use utoipa::{IntoParams, ToSchema};

/// Card criteria shared by the catalog and binder listings. Set criteria combine with AND.
#[serde_as]
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct CardFilterQuery {
    /// Case-insensitive substring of the card name
    pub name: Option<String>,
    /// Case-insensitive substring of the rules text of any face
    pub oracle_text: Option<String>,
    /// Exact rarity, case-insensitive
    pub rarity: Option<String>,
    /// Exact set code, case-insensitive
    pub set_code: Option<String>,
    /// Exact converted mana cost of any face
    #[serde_as(as = "Option<DisplayFromStr>")]
    pub cmc: Option<f64>,
    /// Case-insensitive substring of the type line of any face
    pub type_line: Option<String>,
}

impl From<CardFilterQuery> for CardFilter {
    fn from(query: CardFilterQuery) -> Self {
        Self {
            name: query.name,
            oracle_text: query.oracle_text,
            rarity: query.rarity,
            set_code: query.set_code,
            cmc: query.cmc,
            type_line: query.type_line,
        }
    }
}

/// Query parameters for listing the catalog
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListCardsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub filter: CardFilterQuery,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// One face of a printing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CardFaceBody {
    pub name: String,
    pub mana_cost: Option<String>,
    /// Converted mana cost
    pub cmc: Option<f64>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub colors: Vec<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub image_url: Option<String>,
}

/// Register a printing in the catalog
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardCreate {
    /// Stable catalog id of the printing
    #[schema(value_type = String, format = "uuid")]
    pub id: CardId,
    pub name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub layout: Option<String>,
    /// Faces in printed order; two-sided cards have two
    pub faces: Vec<CardFaceBody>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CardResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: CardId,
    pub name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub layout: Option<String>,
    pub faces: Vec<CardFaceBody>,
    pub created_at: DateTime<Utc>,
}

impl From<CardCreate> for CardCreateDBRequest {
    fn from(api: CardCreate) -> Self {
        Self {
            id: api.id,
            name: api.name.trim().to_string(),
            set_code: api.set_code,
            collector_number: api.collector_number,
            rarity: api.rarity,
            layout: api.layout,
            faces: api
                .faces
                .into_iter()
                .enumerate()
                .map(|(i, f)| CardFace {
                    face_index: i as i32,
                    name: f.name,
                    mana_cost: f.mana_cost,
                    cmc: f.cmc,
                    type_line: f.type_line,
                    oracle_text: f.oracle_text,
                    colors: f.colors,
                    power: f.power,
                    toughness: f.toughness,
                    image_url: f.image_url,
                })
                .collect(),
        }
    }
}

impl From<CardPrinting> for CardResponse {
    fn from(db: CardPrinting) -> Self {
        Self {
            id: db.id,
            name: db.name,
            set_code: db.set_code,
            collector_number: db.collector_number,
            rarity: db.rarity,
            layout: db.layout,
            faces: db
                .faces
                .into_iter()
                .map(|f| CardFaceBody {
                    name: f.name,
                    mana_cost: f.mana_cost,
                    cmc: f.cmc,
                    type_line: f.type_line,
                    oracle_text: f.oracle_text,
                    colors: f.colors,
                    power: f.power,
                    toughness: f.toughness,
                    image_url: f.image_url,
                })
                .collect(),
            created_at: db.created_at,
        }
    }
}
