//! API request and response data models.
//!
//! API models are distinct from the database records in [`crate::db::models`] so the wire format
//! can evolve independently of storage. Every model is annotated with `utoipa` for the generated
//! OpenAPI document.
//!
//! - [`users`]: user creation and profiles
//! - [`cards`]: card printings and faces
//! - [`binder`]: binder quantities, credits and debits
//! - [`decks`]: decks, entries, totals and metadata updates
//! - [`transfers`]: allocations, deallocations, zone moves and deck-to-deck transfers
//! - [`pagination`]: shared `skip`/`limit` query parameters

pub mod binder;
pub mod cards;
pub mod decks;
pub mod pagination;
pub mod transfers;
pub mod users;
