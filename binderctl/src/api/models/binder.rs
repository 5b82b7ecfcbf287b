//! API request/response models for binders.

use super::cards::CardFilterQuery;
use super::pagination::Pagination;
use crate::db::models::binder::{BinderEntry, BinderListing};
use crate::types::{CardId, UserId};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query parameters for listing a binder
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListBinderQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub filter: CardFilterQuery,

    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

/// Quantity to credit or debit
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct QuantityChange {
    /// Must be positive
    pub quantity: i32,
}

/// A (user, card) holding; `quantity` is 0 when the user holds none
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BinderQuantityResponse {
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i64,
}

impl BinderQuantityResponse {
    pub fn new(user_id: UserId, card_id: CardId, quantity: i64) -> Self {
        Self {
            user_id,
            card_id,
            quantity,
        }
    }
}

impl From<BinderEntry> for BinderQuantityResponse {
    fn from(entry: BinderEntry) -> Self {
        Self::new(entry.user_id, entry.card_id, i64::from(entry.quantity))
    }
}

/// A binder entry with the card fields needed for display
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BinderEntryResponse {
    #[schema(value_type = String, format = "uuid")]
    pub card_id: CardId,
    pub quantity: i32,
    pub name: String,
    pub set_code: Option<String>,
    pub rarity: Option<String>,
}

impl From<BinderListing> for BinderEntryResponse {
    fn from(listing: BinderListing) -> Self {
        Self {
            card_id: listing.card_id,
            quantity: listing.quantity,
            name: listing.name,
            set_code: listing.set_code,
            rarity: listing.rarity,
        }
    }
}
