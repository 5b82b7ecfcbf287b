//! OpenAPI documentation configuration.
//!
//! [`InventoryApiDoc`] documents the inventory API at `/api/v1/*` and is served with Scalar at
//! `/docs`.

mod extra_types;
pub mod inventory;

pub use inventory::InventoryApiDoc;
