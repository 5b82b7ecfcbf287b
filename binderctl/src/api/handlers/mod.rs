//! HTTP request handlers for all API endpoints.
//!
//! This module contains Axum route handlers organized by resource type.
//! Each handler is responsible for:
//! - Request deserialization
//! - Calling the matching [`crate::ledger::Inventory`] operation
//! - Response serialization
//!
//! # Handler Modules
//!
//! - [`users`]: User creation, lookup and deck listing
//! - [`cards`]: Card catalog registration and lookup
//! - [`binder`]: Binder listing, quantities, credits and debits
//! - [`decks`]: Deck CRUD, totals and plain-text export
//! - [`transfers`]: Allocations, deallocations, zone moves and deck-to-deck transfers
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which automatically converts to
//! appropriate HTTP status codes and JSON error responses.

pub mod binder;
pub mod cards;
pub mod decks;
pub mod transfers;
pub mod users;
