use crate::api::models::decks::DeckEntryResponse;
use crate::api::models::transfers::{
    AllocateRequest, DeallocateRequest, RemovalResponse, TransferRequest, TransferResponse, ZoneMoveRequest, ZoneMoveResponse,
};
use crate::errors::Result;
use crate::{AppState, types::DeckId};
use axum::{
    Json,
    extract::{Path, State},
};

#[utoipa::path(
    post,
    path = "/decks/{id}/allocations",
    tag = "transfers",
    summary = "Allocate cards to a deck",
    description = "Moves copies from the owner's binder into a zone of the deck.",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    request_body = AllocateRequest,
    responses(
        (status = 200, description = "Deck entry after the allocation", body = DeckEntryResponse),
        (status = 400, description = "Quantity not positive"),
        (status = 404, description = "Deck or card not found"),
        (status = 409, description = "Binder holds too few copies, or the deck is full"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn allocate(
    State(state): State<AppState>,
    Path(deck_id): Path<DeckId>,
    Json(request): Json<AllocateRequest>,
) -> Result<Json<DeckEntryResponse>> {
    let entry = state
        .inventory
        .allocate(deck_id, request.card_id, request.quantity, request.zone)
        .await?;
    Ok(Json(entry.into()))
}

#[utoipa::path(
    post,
    path = "/decks/{id}/deallocations",
    tag = "transfers",
    summary = "Return cards to the binder",
    description = "Moves copies from the deck back to the owner's binder. Without a zone the main entry is used if present, otherwise the sideboard.",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    request_body = DeallocateRequest,
    responses(
        (status = 200, description = "Zone entry after the removal", body = RemovalResponse),
        (status = 400, description = "Quantity not positive"),
        (status = 404, description = "Deck or deck entry not found"),
        (status = 409, description = "Entry holds too few copies"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn deallocate(
    State(state): State<AppState>,
    Path(deck_id): Path<DeckId>,
    Json(request): Json<DeallocateRequest>,
) -> Result<Json<RemovalResponse>> {
    let removal = state
        .inventory
        .deallocate(deck_id, request.card_id, request.quantity, request.zone)
        .await?;
    Ok(Json(removal.into()))
}

#[utoipa::path(
    post,
    path = "/decks/{id}/zone-moves",
    tag = "transfers",
    summary = "Move cards between zones",
    description = "Moves copies between the main deck and the sideboard. The deck total is unchanged.",
    params(("id" = uuid::Uuid, Path, description = "Deck ID")),
    request_body = ZoneMoveRequest,
    responses(
        (status = 200, description = "Both zone entries after the move", body = ZoneMoveResponse),
        (status = 400, description = "Quantity not positive, or source and target zone are the same"),
        (status = 404, description = "Deck or deck entry not found"),
        (status = 409, description = "Entry holds too few copies"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn move_zone(
    State(state): State<AppState>,
    Path(deck_id): Path<DeckId>,
    Json(request): Json<ZoneMoveRequest>,
) -> Result<Json<ZoneMoveResponse>> {
    let moved = state
        .inventory
        .move_zone(deck_id, request.card_id, request.quantity, request.from, request.to)
        .await?;
    Ok(Json(moved.into()))
}

#[utoipa::path(
    post,
    path = "/transfers",
    tag = "transfers",
    summary = "Transfer cards between decks",
    description = "Moves copies from one deck into the main zone of another deck with the same owner, as a single unit.",
    request_body = TransferRequest,
    responses(
        (status = 200, description = "Source and destination entries after the transfer", body = TransferResponse),
        (status = 400, description = "Quantity not positive, same deck, or decks with different owners"),
        (status = 404, description = "Deck or deck entry not found"),
        (status = 409, description = "Source holds too few copies, or the destination is full"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn transfer(State(state): State<AppState>, Json(request): Json<TransferRequest>) -> Result<Json<TransferResponse>> {
    let outcome = state
        .inventory
        .transfer(
            request.source_deck_id,
            request.destination_deck_id,
            request.card_id,
            request.quantity,
            request.source_zone,
        )
        .await?;
    Ok(Json(outcome.into()))
}

#[cfg(test)]
mod tests {
    use crate::api::models::binder::BinderQuantityResponse;
    use crate::api::models::decks::{DeckEntryResponse, DeckTotalsResponse};
    use crate::api::models::transfers::{RemovalResponse, TransferResponse, ZoneMoveResponse};
    use crate::test_utils::*;
    use crate::types::Zone;
    use axum::http::StatusCode;
    use serde_json::{Value, json};

    async fn binder_quantity(app: &axum_test::TestServer, user: uuid::Uuid, card: uuid::Uuid) -> i64 {
        let held: BinderQuantityResponse = app.get(&format!("/api/v1/users/{user}/binder/{card}")).await.json();
        held.quantity
    }

    async fn deck_total(app: &axum_test::TestServer, deck: uuid::Uuid) -> i64 {
        let totals: DeckTotalsResponse = app.get(&format!("/api/v1/decks/{deck}/totals")).await.json();
        totals.total
    }

    #[tokio::test]
    async fn test_allocate_more_than_held_is_rejected() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 2).await;

        let response = app
            .post(&format!("/api/v1/decks/{}/allocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 3 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["kind"], "insufficient_quantity");
        assert_eq!(body["have"], 2);
        assert_eq!(body["want"], 3);

        assert_eq!(binder_quantity(&app, alice.id, bolt.id).await, 2);
        assert_eq!(deck_total(&app, deck.id).await, 0);
    }

    #[tokio::test]
    async fn test_allocate_moves_copies_out_of_binder() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;

        let entry: DeckEntryResponse = app
            .post(&format!("/api/v1/decks/{}/allocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 3 }))
            .await
            .json();
        assert_eq!((entry.zone, entry.quantity), (Zone::Main, 3));
        assert_eq!(binder_quantity(&app, alice.id, bolt.id).await, 1);
    }

    #[tokio::test]
    async fn test_allocate_past_capacity_is_rejected() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let island = seed_card(&app, "Island").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", Some(60)).await;
        seed_credit(&app, alice.id, island.id, 59).await;
        seed_credit(&app, alice.id, bolt.id, 2).await;
        allocate(&app, deck.id, island.id, 59).await;

        let response = app
            .post(&format!("/api/v1/decks/{}/allocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 2 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["kind"], "capacity_exceeded");
        assert_eq!(body["current"], 59);
        assert_eq!(body["limit"], 60);
        assert_eq!(body["attempted"], 2);

        assert_eq!(binder_quantity(&app, alice.id, bolt.id).await, 2);
        allocate(&app, deck.id, bolt.id, 1).await;
        assert_eq!(deck_total(&app, deck.id).await, 60);
    }

    #[tokio::test]
    async fn test_deallocate_without_zone_prefers_main() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, deck.id, bolt.id, 2).await;
        app.post(&format!("/api/v1/decks/{}/allocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 2, "zone": "sideboard" }))
            .await
            .assert_status_ok();

        let removal: RemovalResponse = app
            .post(&format!("/api/v1/decks/{}/deallocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 2 }))
            .await
            .json();
        assert_eq!((removal.zone, removal.remaining), (Zone::Main, 0));

        let response = app
            .post(&format!("/api/v1/decks/{}/deallocations", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 3 }))
            .await;
        response.assert_status(StatusCode::CONFLICT);

        assert_eq!(binder_quantity(&app, alice.id, bolt.id).await, 2);
    }

    #[tokio::test]
    async fn test_transfer_full_entry_between_decks() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let burn = seed_deck(&app, alice.id, "Burn", None).await;
        let prowess = seed_deck(&app, alice.id, "Prowess", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, burn.id, bolt.id, 4).await;

        let response = app
            .post("/api/v1/transfers")
            .json(&json!({
                "source_deck_id": burn.id,
                "destination_deck_id": prowess.id,
                "card_id": bolt.id,
                "quantity": 4
            }))
            .await;
        response.assert_status_ok();
        let outcome: TransferResponse = response.json();
        assert_eq!(outcome.source.remaining, 0);
        assert_eq!(outcome.destination.quantity, 4);

        assert_eq!(deck_total(&app, burn.id).await, 0);
        assert_eq!(deck_total(&app, prowess.id).await, 4);
        assert_eq!(binder_quantity(&app, alice.id, bolt.id).await, 0);
    }

    #[tokio::test]
    async fn test_transfer_to_same_deck_rejected() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, deck.id, bolt.id, 4).await;

        let response = app
            .post("/api/v1/transfers")
            .json(&json!({
                "source_deck_id": deck.id,
                "destination_deck_id": deck.id,
                "card_id": bolt.id,
                "quantity": 1
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        assert_eq!(deck_total(&app, deck.id).await, 4);
    }

    #[tokio::test]
    async fn test_move_zone_keeps_total() {
        let app = create_memory_app().await;
        let alice = seed_user(&app, "alice").await;
        let bolt = seed_card(&app, "Lightning Bolt").await;
        let deck = seed_deck(&app, alice.id, "Burn", None).await;
        seed_credit(&app, alice.id, bolt.id, 4).await;
        allocate(&app, deck.id, bolt.id, 4).await;

        let moved: ZoneMoveResponse = app
            .post(&format!("/api/v1/decks/{}/zone-moves", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 1, "from": "main", "to": "sideboard" }))
            .await
            .json();
        assert_eq!((moved.from.zone, moved.from.remaining), (Zone::Main, 3));
        assert_eq!((moved.to.zone, moved.to.quantity), (Zone::Sideboard, 1));
        assert_eq!(deck_total(&app, deck.id).await, 4);

        app.post(&format!("/api/v1/decks/{}/zone-moves", deck.id))
            .json(&json!({ "card_id": bolt.id, "quantity": 1, "from": "main", "to": "main" }))
            .await
            .assert_status(StatusCode::BAD_REQUEST);
    }
}
