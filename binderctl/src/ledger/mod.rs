//! Inventory conservation engine.
//!
//! Every copy a user owns is either resting in their binder or allocated to exactly one zone of
//! one of their decks. Quantities only enter or leave through binder credits and debits; every
//! other operation moves copies between the two.
//!
//! - [`BinderLedger`] and [`DeckLedger`] are the only code that changes a quantity.
//! - [`check_capacity`] guards every deck-growing move before anything is written.
//! - [`transfer`] composes ledger steps into multi-step moves.
//! - [`Inventory`] runs each public operation in its own [`UnitOfWork`] and commits it.
//!
//! Storage is behind [`LedgerStore`]: PostgreSQL in [`crate::db::store`], or [`MemoryStore`].

mod binder;
mod capacity;
mod deck;
pub mod errors;
pub mod export;
pub mod memory;
mod service;
mod store;
pub mod transfer;

pub use binder::BinderLedger;
pub use capacity::check_capacity;
pub use deck::{DeckLedger, Removal};
pub use errors::{Entity, LedgerError};
pub use memory::MemoryStore;
pub use service::{DeckDetail, DeckDraft, DeckTotals, Inventory};
pub use store::{CardCatalog, LedgerStore, UnitOfWork, UserDirectory};
pub use transfer::{ReleasedDeck, TransferOutcome, ZoneMove};
