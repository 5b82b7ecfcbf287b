use crate::api::models::decks::{DeckCreate, DeckDeletedResponse, DeckDetailResponse, DeckResponse, DeckTotalsResponse, DeckUpdate};
use crate::errors::Result;
use crate::ledger::DeckDraft;
use crate::{AppState, types::DeckId};
use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
};

#[utoipa::path(
    post,
    path = "/decks",
    tag = "decks",
    summary = "Create deck",
    description = "Creates an empty deck. Without `capacity` the configured default limit applies; `unlimited: true` stores no limit.",
    request_body = DeckCreate,
    responses(
        (status = 201, description = "Deck created", body = DeckResponse),
        (status = 400, description = "Blank name or format, or capacity below 1"),
        (status = 404, description = "Owner not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_deck(State(state): State<AppState>, Json(request): Json<DeckCreate>) -> Result<(StatusCode, Json<DeckResponse>)> {
    let deck = state.inventory.create_deck(DeckDraft::from(request)).await?;
    Ok((StatusCode::CREATED, Json(deck.into())))
}

#[utoipa::path(
    get,
    path = "/decks/{id}",
    tag = "decks",
    summary = "Get deck",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    responses(
        (status = 200, description = "Deck with its entries", body = DeckDetailResponse),
        (status = 404, description = "Deck not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_deck(State(state): State<AppState>, Path(id): Path<DeckId>) -> Result<Json<DeckDetailResponse>> {
    let detail = state.inventory.get_deck(id).await?;
    Ok(Json(detail.into()))
}

#[utoipa::path(
    patch,
    path = "/decks/{id}",
    tag = "decks",
    summary = "Update deck metadata",
    description = "Absent fields are unchanged. `capacity: null` removes the limit. A limit below the cards already in the deck is rejected.",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    request_body = DeckUpdate,
    responses(
        (status = 200, description = "Updated deck", body = DeckResponse),
        (status = 400, description = "Blank name or format, or capacity below 1"),
        (status = 404, description = "Deck not found"),
        (status = 409, description = "New limit below the current total"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn update_deck(State(state): State<AppState>, Path(id): Path<DeckId>, Json(update): Json<DeckUpdate>) -> Result<Json<DeckResponse>> {
    let deck = state.inventory.update_deck_metadata(id, update.into()).await?;
    Ok(Json(deck.into()))
}

#[utoipa::path(
    delete,
    path = "/decks/{id}",
    tag = "decks",
    summary = "Delete deck",
    description = "Returns every copy in the deck to the owner's binder, then deletes it.",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    responses(
        (status = 200, description = "Deck deleted", body = DeckDeletedResponse),
        (status = 404, description = "Deck not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn delete_deck(State(state): State<AppState>, Path(id): Path<DeckId>) -> Result<Json<DeckDeletedResponse>> {
    let released = state.inventory.delete_deck(id).await?;
    Ok(Json(released.into()))
}

#[utoipa::path(
    get,
    path = "/decks/{id}/totals",
    tag = "decks",
    summary = "Deck totals",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    responses(
        (status = 200, description = "Copies per zone and overall", body = DeckTotalsResponse),
        (status = 404, description = "Deck not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn deck_totals(State(state): State<AppState>, Path(id): Path<DeckId>) -> Result<Json<DeckTotalsResponse>> {
    let totals = state.inventory.deck_totals(id).await?;
    Ok(Json(totals.into()))
}

#[utoipa::path(
    get,
    path = "/decks/{id}/export",
    tag = "decks",
    summary = "Export deck list",
    description = "Plain-text list of `{qty} {name}` lines. Sideboard cards follow a `Sideboard` header, omitted when the sideboard is empty.",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    responses(
        (status = 200, description = "Deck list", body = String, content_type = "text/plain"),
        (status = 404, description = "Deck not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn export_deck(State(state): State<AppState>, Path(id): Path<DeckId>) -> Result<impl IntoResponse> {
    let list = state.inventory.export_deck_list(id).await?;
    Ok(([(header::CONTENT_TYPE, "text/plain; charset=utf-8")], list))
}

#[cfg(test)]
mod tests {
    use crate::api::models::binder::BinderQuantityResponse;
    use crate::api::models::decks::{DeckDeletedResponse, DeckDetailResponse, DeckResponse, DeckTotalsResponse};
    use crate::test_utils::*;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    #[tokio::test]
    async fn test_create_deck_defaults_capacity() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;

        let response = app
            .post("/api/v1/decks")
            .json(&json!({ "owner_id": alice.id, "name": "Burn", "format": "modern" }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let deck: DeckResponse = response.json();
        assert_eq!(deck.capacity, Some(60));

        let unlimited: DeckResponse = app
            .post("/api/v1/decks")
            .json(&json!({ "owner_id": alice.id, "name": "Cube", "format": "cube", "unlimited": true }))
            .await
            .json();
        assert_eq!(unlimited.capacity, None);
    }

    #[tokio::test]
    async fn test_create_deck_rejects_blank_name_and_bad_capacity() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;

        app.post("/api/v1/decks")
            .json(&json!({ "owner_id": alice.id, "name": "  ", "format": "modern" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        app.post("/api/v1/decks")
            .json(&json!({ "owner_id": alice.id, "name": "Burn", "format": "modern", "capacity": 0 }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
        app.post("/api/v1/decks")
            .json(&json!({ "owner_id": uuid::Uuid::new_v4(), "name": "Burn", "format": "modern" }))
            .await
            .assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_update_capacity_below_total_conflicts() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, deck.id, bolt.id, 4).await;

        let response = app
            .patch(&format!("/api/v1/decks/{}", deck.id))
            .json(&json!({ "capacity": 3 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["kind"], "capacity_exceeded");
        assert_eq!(body["current"], 4);
        assert_eq!(body["limit"], 3);
        assert_eq!(body["attempted"], 0);

        let updated: DeckResponse = app
            .patch(&format!("/api/v1/decks/{}", deck.id))
            .json(&json!({ "name": "Mono Red", "capacity": null }))
            .await
            .json();
        assert_eq!(updated.name, "Mono Red");
        assert_eq!(updated.capacity, None);
        assert_eq!(updated.format, "modern");
    }

    #[tokio::test]
    async fn test_update_notes_set_and_clear() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;

        let noted: DeckResponse = app
            .patch(&format!("/api/v1/decks/{}", deck.id))
            .json(&json!({ "notes": "Needs more burn" }))
            .await
            .json();
        assert_eq!(noted.notes.as_deref(), Some("Needs more burn"));

        let renamed: DeckResponse = app
            .patch(&format!("/api/v1/decks/{}", deck.id))
            .json(&json!({ "name": "Mono Red" }))
            .await
            .json();
        assert_eq!(renamed.notes.as_deref(), Some("Needs more burn"));

        let cleared: DeckResponse = app
            .patch(&format!("/api/v1/decks/{}", deck.id))
            .json(&json!({ "notes": null }))
            .await
            .json();
        assert_eq!(cleared.notes, None);
        assert_eq!(cleared.name, "Mono Red");
    }

    #[tokio::test]
    async fn test_delete_deck_returns_cards() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, deck.id, bolt.id, 4).await;

        let response = app.delete(&format!("/api/v1/decks/{}", deck.id)).await;
        response.assert_status_ok();
        let deleted: DeckDeletedResponse = response.json();
        assert_eq!(deleted.returned.len(), 1);
        assert_eq!(deleted.returned[0].quantity, 4);

        let held: BinderQuantityResponse = app
            .get(&format!("/api/v1/users/{}/binder/{}", alice.id, bolt.id))
            .await
            .json();
        assert_eq!(held.quantity, 4);

        app.get(&format!("/api/v1/decks/{}", deck.id)).await.assert_status(StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_totals_and_detail() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, deck.id, bolt.id, 3).await;
        app.post(&format!("/api/v1/decks/{}/allocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 1, "zone": "sideboard" }))
            .await
            .assert_status_ok();

        let totals: DeckTotalsResponse = app.get(&format!("/api/v1/decks/{}/totals", deck.id)).await.json();
        assert_eq!((totals.main, totals.sideboard, totals.total), (3, 1, 4));
        assert_eq!(totals.capacity, Some(60));

        let detail: DeckDetailResponse = app.get(&format!("/api/v1/decks/{}", deck.id)).await.json();
        assert_eq!(detail.entries.len(), 2);
    }

    #[tokio::test]
    async fn test_export_is_plain_text() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let island = seed_card(&app, "Island").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        seed_credit(&app, alice.id, island.id, 2).await;
        allocate(&app, deck.id, bolt.id, 4).await;
        allocate(&app, deck.id, island.id, 2).await;

        let response = app.get(&format!("/api/v1/decks/{}/export", deck.id)).await;
        response.assert_status_ok();
        assert_eq!(response.header("content-type"), "text/plain; charset=utf-8");
        assert_eq!(response.text(), "2 Island\n4 Lightning Bolt");
    }
}
