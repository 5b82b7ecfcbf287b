//! Database layer for data persistence and access.
//!
//! ```text
//! ┌──────────────┐
//! │    Ledger    │  (crate::ledger - conservation rules)
//! └──────┬───────┘
//!        │  UnitOfWork
//!        ↓
//! ┌──────────────┐
//! │    Store     │  (db::store - one transaction per unit of work)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │ Repositories │  (db::handlers - queries)
//! └──────┬───────┘
//!        ↓
//! ┌──────────────┐
//! │  PostgreSQL  │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`handlers`]: Repository implementations
//! - [`models`]: Database record structures
//! - [`errors`]: Database-specific error types
//! - [`store`]: PostgreSQL implementation of [`crate::ledger::LedgerStore`]
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are embedded with [`crate::migrator`]:
//!
//! ```ignore
//! binderctl::migrator().run(&pool).await?;
//! ```

pub mod errors;
pub mod handlers;
pub mod models;
pub mod store;
