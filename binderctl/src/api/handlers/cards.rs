use crate::api::models::cards::{CardCreate, CardResponse, ListCardsQuery};
use crate::api::models::pagination::PaginatedResponse;
use crate::db::models::cards::{CardCreateDBRequest, CardSearch};
use crate::errors::Result;
use crate::{AppState, types::CardId};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/cards",
    tag = "cards",
    summary = "Search catalog",
    description = "Printings ordered by name. Card and face criteria narrow the list together.",
    params(ListCardsQuery),
    responses(
        (status = 200, description = "Page of card printings", body = PaginatedResponse<CardResponse>),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_cards(State(state): State<AppState>, Query(query): Query<ListCardsQuery>) -> Result<Json<PaginatedResponse<CardResponse>>> {
    let skip = query.pagination.skip();
    let limit = query.pagination.limit();
    let search = CardSearch::new(query.filter.into(), skip, limit);

    let (cards, total_count) = state.inventory.search_cards(&search).await?;
    let data = cards.into_iter().map(Into::into).collect();

    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    post,
    path = "/cards",
    tag = "cards",
    summary = "Register card printing",
    description = "Adds a printing and its faces to the catalog. Used by importers; the id is the stable catalog id.",
    request_body = CardCreate,
    responses(
        (status = 201, description = "Card registered", body = CardResponse),
        (status = 400, description = "Blank name or no faces"),
        (status = 409, description = "Card id already registered"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register_card(State(state): State<AppState>, Json(request): Json<CardCreate>) -> Result<(StatusCode, Json<CardResponse>)> {
    let card = state.inventory.register_card(&CardCreateDBRequest::from(request)).await?;
    Ok((StatusCode::CREATED, Json(card.into())))
}

#[utoipa::path(
    get,
    path = "/cards/{id}",
    tag = "cards",
    summary = "Get card printing",
    params(("id" = uuid::Uuid, Path, description = "Card ID")),
    responses(
        (status = 200, description = "Card with faces in printed order", body = CardResponse),
        (status = 404, description = "Card not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_card(State(state): State<AppState>, Path(id): Path<CardId>) -> Result<Json<CardResponse>> {
    let card = state.inventory.get_card(id).await?;
    Ok(Json(card.into()))
}
