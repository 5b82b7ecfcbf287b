//! Database models for the card catalog.
//!
//! A printing is immutable once registered. The core ledger only reads it; the write path exists
//! for importers and tests.

use crate::types::CardId;
use chrono::{DateTime, Utc};

/// One face of a printing. Single-faced cards have exactly one, two-sided cards have two.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CardFace {
    pub face_index: i32,
    pub name: String,
    pub mana_cost: Option<String>,
    pub cmc: Option<f64>,
    pub type_line: Option<String>,
    pub oracle_text: Option<String>,
    pub colors: Vec<String>,
    pub power: Option<String>,
    pub toughness: Option<String>,
    pub image_url: Option<String>,
}

/// Database request for registering a card printing
#[derive(Debug, Clone)]
pub struct CardCreateDBRequest {
    /// Stable catalog id (e.g. the upstream printing UUID)
    pub id: CardId,
    pub name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub layout: Option<String>,
    pub faces: Vec<CardFace>,
}

/// Database response for a card printing, faces ordered by `face_index`
#[derive(Debug, Clone, PartialEq)]
pub struct CardPrinting {
    pub id: CardId,
    pub name: String,
    pub set_code: Option<String>,
    pub collector_number: Option<String>,
    pub rarity: Option<String>,
    pub layout: Option<String>,
    pub faces: Vec<CardFace>,
    pub created_at: DateTime<Utc>,
}

/// Catalog search criteria. Every criterion that is set must hold (AND).
///
/// Text criteria compare case-insensitively: `name`, `oracle_text` and `type_line` match a
/// substring, `rarity` and `set_code` match exactly. Face criteria (`oracle_text`, `cmc`,
/// `type_line`) must all hold on the same face.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CardFilter {
    pub name: Option<String>,
    pub oracle_text: Option<String>,
    pub rarity: Option<String>,
    pub set_code: Option<String>,
    pub cmc: Option<f64>,
    pub type_line: Option<String>,
}

fn criterion(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn contains_ci(haystack: Option<&str>, needle: &str) -> bool {
    haystack.is_some_and(|h| h.to_lowercase().contains(&needle.to_lowercase()))
}

fn equals_ci(value: Option<&str>, expected: &str) -> bool {
    value.is_some_and(|v| v.to_lowercase() == expected.to_lowercase())
}

impl CardFilter {
    /// Trim text criteria and drop blank ones
    pub fn normalized(self) -> Self {
        Self {
            name: criterion(self.name),
            oracle_text: criterion(self.oracle_text),
            rarity: criterion(self.rarity),
            set_code: criterion(self.set_code),
            cmc: self.cmc,
            type_line: criterion(self.type_line),
        }
    }

    pub fn has_face_criteria(&self) -> bool {
        self.oracle_text.is_some() || self.cmc.is_some() || self.type_line.is_some()
    }

    fn face_matches(&self, face: &CardFace) -> bool {
        self.oracle_text
            .as_deref()
            .is_none_or(|text| contains_ci(face.oracle_text.as_deref(), text))
            && self.cmc.is_none_or(|cmc| face.cmc == Some(cmc))
            && self
                .type_line
                .as_deref()
                .is_none_or(|type_line| contains_ci(face.type_line.as_deref(), type_line))
    }

    pub fn matches(&self, card: &CardPrinting) -> bool {
        self.name.as_deref().is_none_or(|name| contains_ci(Some(&card.name), name))
            && self.rarity.as_deref().is_none_or(|rarity| equals_ci(card.rarity.as_deref(), rarity))
            && self
                .set_code
                .as_deref()
                .is_none_or(|set_code| equals_ci(card.set_code.as_deref(), set_code))
            && (!self.has_face_criteria() || card.faces.iter().any(|face| self.face_matches(face)))
    }
}

/// One page of a filtered card search
#[derive(Debug, Clone, Default)]
pub struct CardSearch {
    pub filter: CardFilter,
    pub skip: i64,
    pub limit: i64,
}

impl CardSearch {
    pub fn new(filter: CardFilter, skip: i64, limit: i64) -> Self {
        Self {
            filter: filter.normalized(),
            skip,
            limit,
        }
    }
}
