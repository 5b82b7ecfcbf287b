//! Repository implementations for database access.
//!
//! Each repository wraps a borrowed `PgConnection` (usually the connection of an open
//! transaction) and maps rows to the records in [`crate::db::models`].
//!
//! # Available Repositories
//!
//! - [`Users`]: user directory
//! - [`Cards`]: card catalog (printings and faces)
//! - [`Binders`]: unallocated per-(user, card) quantities
//! - [`Decks`]: deck aggregates and ordered row locking
//! - [`DeckEntries`]: per-(deck, card, zone) quantities
//!
//! # Common Pattern
//!
//! ```ignore
//! use binderctl::db::handlers::{Binders, Repository, Users};
//!
//! async fn example(pool: &sqlx::PgPool, user_id: uuid::Uuid, card_id: uuid::Uuid) -> anyhow::Result<()> {
//!     let mut tx = pool.begin().await?;
//!
//!     if Users::new(&mut tx).exists(user_id).await? {
//!         Binders::new(&mut tx).add_quantity(user_id, card_id, 4).await?;
//!     }
//!
//!     tx.commit().await?;
//!     Ok(())
//! }
//! ```
//!
//! Ledger code never uses these directly: it goes through [`crate::db::store::PgLedgerStore`],
//! which hands out one transaction per unit of work.

pub mod binder;
pub mod cards;
pub mod decks;
pub mod repository;
pub mod users;

pub use binder::Binders;
pub use cards::Cards;
pub use decks::{DeckEntries, Decks};
pub use repository::Repository;
pub use users::Users;
