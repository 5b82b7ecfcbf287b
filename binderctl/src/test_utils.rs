//! Test utilities shared by unit and integration tests.

use crate::api::models::{cards::CardResponse, decks::DeckResponse, users::UserResponse};
use crate::config::{Config, DatabaseConfig, PoolSettings};
use crate::db::handlers::{Cards, Repository, Users};
use crate::db::models::{
    cards::{CardCreateDBRequest, CardFace, CardPrinting},
    decks::{Deck, DeckCreateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse},
};
use crate::ledger::{LedgerStore, MemoryStore};
use crate::types::{CardId, DeckId, UserId};
use axum_test::TestServer;
use serde_json::json;
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

pub fn create_test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig::Memory,
        ..Default::default()
    }
}

/// Application over a fresh in-memory store
pub async fn create_memory_app() -> TestServer {
    crate::Application::new_with_store(create_test_config(), Arc::new(MemoryStore::new()))
        .expect("Failed to create application")
        .into_test_server()
}

/// Application over a migrated test database
pub async fn create_test_app(pool: PgPool) -> TestServer {
    let mut config = create_test_config();
    config.database = DatabaseConfig::Postgres {
        url: "postgres://test".to_string(),
        pool: PoolSettings {
            max_connections: 1,
            ..Default::default()
        },
    };

    crate::Application::new_with_pool(config, pool)
        .expect("Failed to create application")
        .into_test_server()
}

/// Single-faced printing with a fresh catalog id
pub fn card_request(name: &str) -> CardCreateDBRequest {
    CardCreateDBRequest {
        id: Uuid::new_v4(),
        name: name.to_string(),
        set_code: Some("tst".to_string()),
        collector_number: Some("1".to_string()),
        rarity: Some("common".to_string()),
        layout: Some("normal".to_string()),
        faces: vec![CardFace {
            face_index: 0,
            name: name.to_string(),
            mana_cost: Some("{R}".to_string()),
            cmc: Some(1.0),
            type_line: Some("Instant".to_string()),
            oracle_text: None,
            colors: vec!["R".to_string()],
            power: None,
            toughness: None,
            image_url: None,
        }],
    }
}

pub async fn create_test_user(pool: &PgPool, username: &str) -> UserDBResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            username: username.to_string(),
            email: Some(format!("{username}@example.com")),
        })
        .await
        .expect("Failed to create test user")
}

pub async fn create_test_card(pool: &PgPool, name: &str) -> CardPrinting {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    Cards::new(&mut conn)
        .create(&card_request(name))
        .await
        .expect("Failed to create test card")
}

/// A memory store seeded with two users and two cards, nothing owned yet
pub struct MemoryFixture {
    pub store: MemoryStore,
    pub user: UserId,
    pub other_user: UserId,
    pub bolt: CardId,
    pub island: CardId,
}

pub async fn memory_fixture() -> MemoryFixture {
    let store = MemoryStore::new();
    let mut uow = store.begin().await.unwrap();

    let user = |username: &str| UserCreateDBRequest {
        username: username.to_string(),
        email: None,
    };
    let alice = uow.create_user(&user("alice")).await.unwrap();
    let bob = uow.create_user(&user("bob")).await.unwrap();
    let bolt = uow.create_card(&card_request("Lightning Bolt")).await.unwrap();
    let island = uow.create_card(&card_request("Island")).await.unwrap();
    uow.commit().await.unwrap();

    MemoryFixture {
        store,
        user: alice.id,
        other_user: bob.id,
        bolt: bolt.id,
        island: island.id,
    }
}

pub async fn memory_deck(store: &MemoryStore, owner_id: UserId, capacity: Option<i32>) -> Deck {
    let mut uow = store.begin().await.unwrap();
    let deck = uow
        .create_deck(&DeckCreateDBRequest {
            owner_id,
            name: "Test Deck".to_string(),
            format: "modern".to_string(),
            capacity,
            notes: None,
        })
        .await
        .unwrap();
    uow.commit().await.unwrap();
    deck
}

pub async fn seed_user(server: &TestServer, username: &str) -> UserResponse {
    let response = server.post("/api/v1/users").json(&json!({ "username": username })).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

pub async fn seed_card(server: &TestServer, name: &str) -> CardResponse {
    let response = server
        .post("/api/v1/cards")
        .json(&json!({
            "id": Uuid::new_v4(),
            "name": name,
            "set_code": "tst",
            "faces": [{ "name": name }]
        }))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

pub async fn seed_deck(server: &TestServer, owner_id: UserId, name: &str, capacity: Option<i32>) -> DeckResponse {
    let mut body = json!({ "owner_id": owner_id, "name": name, "format": "modern" });
    if let Some(capacity) = capacity {
        body["capacity"] = json!(capacity);
    }
    let response = server.post("/api/v1/decks").json(&body).await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}

pub async fn seed_credit(server: &TestServer, user_id: UserId, card_id: CardId, quantity: i32) {
    server
        .post(&format!("/api/v1/users/{user_id}/binder/{card_id}/credit"))
        .json(&json!({ "quantity": quantity }))
        .await
        .assert_status_ok();
}

/// Allocate into the main zone and assert success
pub async fn allocate(server: &TestServer, deck_id: DeckId, card_id: CardId, quantity: i32) {
    server
        .post(&format!("/api/v1/decks/{deck_id}/allocations"))
        .json(&json!({ "card_id": card_id, "quantity": quantity }))
        .await
        .assert_status_ok();
}
