//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! All resource routes live under `/api/v1`:
//!
//! - **Users** (`/users/*`): user creation, lookup and deck listings
//! - **Cards** (`/cards/*`): card catalog registration and lookup
//! - **Binder** (`/users/{user_id}/binder/*`): binder quantities, credits and debits
//! - **Decks** (`/decks/*`): deck metadata, totals and export
//! - **Transfers** (`/decks/{id}/allocations`, `/decks/{id}/deallocations`, `/decks/{id}/zone-moves`,
//!   `/transfers`): moving copies between the binder and decks
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`.
//! API documentation is available at `/docs` when the server is running.

pub mod handlers;
pub mod models;
