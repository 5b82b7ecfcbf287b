//! Database record models matching table schemas.
//!
//! These structs are the plain data records passed between the repositories, the ledger and the
//! API layer. They carry no behaviour: every mutation of a quantity goes through
//! [`crate::ledger`].
//!
//! - [`users`]: User accounts
//! - [`cards`]: Card printings and their faces (catalog, read-only to the ledger)
//! - [`binder`]: Unallocated inventory per (user, card)
//! - [`decks`]: Decks and their per-zone entries

pub mod binder;
pub mod cards;
pub mod decks;
pub mod users;
