use crate::db::errors::DbError;
use std::fmt;
use thiserror::Error;

/// Kind of entity a [`LedgerError::NotFound`] refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    User,
    Card,
    Deck,
    BinderEntry,
    DeckEntry,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::User => "User",
            Entity::Card => "Card",
            Entity::Deck => "Deck",
            Entity::BinderEntry => "Binder entry",
            Entity::DeckEntry => "Deck entry",
        };
        f.write_str(name)
    }
}

/// Errors raised by the inventory ledger.
///
/// Business rule failures fail fast and are returned unchanged through every layer that composes
/// them. `Storage` is only ever produced by the backing store.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{entity} {id} not found")]
    NotFound { entity: Entity, id: String },

    #[error("{reason}")]
    InvalidArgument { reason: String },

    #[error("Insufficient quantity: have {have}, want {want}")]
    InsufficientQuantity { have: i64, want: i64 },

    #[error("Deck capacity exceeded: current {current}, limit {limit}, attempted add {attempted}")]
    CapacityExceeded { current: i64, limit: i64, attempted: i64 },

    #[error(transparent)]
    Storage(#[from] DbError),
}

impl LedgerError {
    pub fn not_found(entity: Entity, id: impl fmt::Display) -> Self {
        LedgerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        LedgerError::InvalidArgument { reason: reason.into() }
    }
}

pub type Result<T> = std::result::Result<T, LedgerError>;
