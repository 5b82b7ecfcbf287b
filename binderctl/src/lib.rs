//! # binderctl: Card Binder and Deck Inventory
//!
//! `binderctl` tracks the physical cards a collector owns and where each copy currently lives:
//! either loose in the collector's binder or allocated to one of their decks. It exposes a
//! RESTful API for registering cards, crediting binders, building decks and moving copies
//! between them.
//!
//! ## Overview
//!
//! Every copy a user owns sits in exactly one place. Moving cards never creates or destroys
//! copies: an allocation takes copies out of the binder and puts them into a deck, a transfer
//! takes them out of one deck and puts them into another. Each of these moves runs as a single
//! unit of work, so a failure part-way through leaves every quantity as it was.
//!
//! Decks split their cards into a main deck and a sideboard and may carry a capacity limit on
//! the total copies across both zones.
//!
//! ## Architecture
//!
//! The application is built on [Axum](https://github.com/tokio-rs/axum) for the HTTP layer and
//! uses PostgreSQL for persistence. An in-memory backend implementing the same storage traits is
//! available for development and for tests that run without a database.
//!
//! ### Core Components
//!
//! The **API layer** ([`api`]) exposes the inventory under `/api/v1/*`. Handlers deserialize the
//! request, call a single [`ledger::Inventory`] operation and serialize the result.
//!
//! The **ledger** ([`ledger`]) owns every business rule: binder and deck quantities, capacity
//! limits and the transfer coordinator that composes them inside one unit of work.
//!
//! The **database layer** ([`db`]) uses the repository pattern to abstract data access. Each
//! aggregate has a repository over a borrowed connection, and [`db::store::PgLedgerStore`] binds
//! them to a PostgreSQL transaction per unit of work.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use binderctl::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Parse CLI arguments and load configuration
//!     let args = binderctl::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     // Initialize telemetry (structured logging and optional OpenTelemetry)
//!     binderctl::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     // Create and start the application
//!     let app = Application::new(config).await?;
//!
//!     // Run with graceful shutdown on Ctrl+C
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     }).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Database Setup
//!
//! With `database.type: postgres` the application connects to the configured URL and runs the
//! embedded migrations on startup:
//!
//! ```no_run
//! # use binderctl::migrator;
//! # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::migrate::MigrateError> {
//! migrator().run(&pool).await?;
//! # Ok(())
//! # }
//! ```
//!
//! See the [`config`] module for configuration options.
pub mod api;
pub mod config;
pub mod db;
pub mod errors;
pub mod ledger;
mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_utils;

use crate::api::handlers::{binder, cards, decks, transfers, users};
use crate::config::{CorsOrigin, DatabaseConfig};
use crate::db::store::PgLedgerStore;
use crate::ledger::{Inventory, LedgerStore, MemoryStore};
use crate::openapi::InventoryApiDoc;
use axum::http::HeaderValue;
use axum::{
    Router,
    routing::{get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::PgPool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .inventory(inventory)
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub inventory: Inventory,
    pub config: Config,
}

/// Get the binderctl database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Connect to PostgreSQL and bring the schema up to date
#[instrument(skip_all)]
async fn setup_database(url: &str, pool_settings: &config::PoolSettings) -> anyhow::Result<PgPool> {
    let pool = pool_settings.pool_options().connect(url).await?;
    info!("Running database migrations...");
    migrator().run(&pool).await?;
    Ok(pool)
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let allow_origin = if config.cors.allowed_origins.iter().any(|o| matches!(o, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut origins = Vec::new();
        for origin in &config.cors.allowed_origins {
            if let CorsOrigin::Url(url) = origin {
                origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(origins)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router with all endpoints and middleware.
///
/// This function constructs the complete Axum router with:
/// - Inventory API routes under `/api/v1`
/// - Liveness at `/healthz`
/// - API documentation at `/docs`
/// - CORS configuration, when any origin is allowed
/// - Tracing middleware
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    let api_routes = Router::new()
        // Users
        .route("/users", post(users::create_user))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{user_id}/decks", get(users::list_user_decks))
        // Card catalog
        .route("/cards", get(cards::list_cards).post(cards::register_card))
        .route("/cards/{id}", get(cards::get_card))
        // Binder
        .route("/users/{user_id}/binder", get(binder::list_binder))
        .route("/users/{user_id}/binder/{card_id}", get(binder::binder_quantity))
        .route("/users/{user_id}/binder/{card_id}/credit", post(binder::credit_binder))
        .route("/users/{user_id}/binder/{card_id}/debit", post(binder::debit_binder))
        // Decks
        .route("/decks", post(decks::create_deck))
        .route(
            "/decks/{id}",
            get(decks::get_deck).patch(decks::update_deck).delete(decks::delete_deck),
        )
        .route("/decks/{id}/totals", get(decks::deck_totals))
        .route("/decks/{id}/export", get(decks::export_deck))
        // Transfers
        .route("/decks/{id}/allocations", post(transfers::allocate))
        .route("/decks/{id}/deallocations", post(transfers::deallocate))
        .route("/decks/{id}/zone-moves", post(transfers::move_zone))
        .route("/transfers", post(transfers::transfer));

    let cors_enabled = !state.config.cors.allowed_origins.is_empty();
    let cors_layer = create_cors_layer(&state.config)?;

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .with_state(state)
        .merge(Scalar::with_url("/docs", InventoryApiDoc::openapi()));

    if cors_enabled {
        router = router.layer(cors_layer);
    }

    // Add tracing layer
    let router = router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    );

    Ok(router)
}

/// Main application struct that owns all resources and the router.
///
/// # Lifecycle
///
/// 1. **Create**: [`Application::new`] connects the configured storage backend and runs migrations
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and starts handling requests
/// 3. **Shutdown**: When the shutdown signal is received, closes the pool and flushes telemetry
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Create a new application instance with the configured storage backend
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting binderctl with configuration: {:#?}", config);

        match &config.database {
            DatabaseConfig::Postgres { url, pool } => {
                let pool = setup_database(url, pool).await?;
                Self::new_with_pool(config, pool)
            }
            DatabaseConfig::Memory => {
                info!("Using in-memory storage; state is lost on shutdown");
                Self::new_with_store(config, Arc::new(MemoryStore::new()))
            }
        }
    }

    /// Create an application over an already migrated PostgreSQL pool
    pub fn new_with_pool(config: Config, pool: PgPool) -> anyhow::Result<Self> {
        let store = Arc::new(PgLedgerStore::new(pool.clone()));
        let mut app = Self::new_with_store(config, store)?;
        app.pool = Some(pool);
        Ok(app)
    }

    /// Create an application over any storage backend
    pub fn new_with_store(config: Config, store: Arc<dyn LedgerStore>) -> anyhow::Result<Self> {
        let inventory = Inventory::new(store, config.decks.default_capacity);
        let app_state = AppState::builder().inventory(inventory).config(config.clone()).build();
        let router = build_router(app_state)?;

        Ok(Self { router, config, pool: None })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router.into_make_service()).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "binderctl listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        // Run the server with graceful shutdown
        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        // Close database connections
        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        // Shutdown telemetry
        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
