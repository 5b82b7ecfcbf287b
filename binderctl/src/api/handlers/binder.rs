use crate::api::models::binder::{BinderEntryResponse, BinderQuantityResponse, ListBinderQuery, QuantityChange};
use crate::api::models::pagination::PaginatedResponse;
use crate::db::models::cards::CardSearch;
use crate::errors::Result;
use crate::{
    AppState,
    types::{CardId, UserId},
};
use axum::{
    Json,
    extract::{Path, Query, State},
};

#[utoipa::path(
    get,
    path = "/users/{user_id}/binder",
    tag = "binder",
    summary = "List binder",
    description = "Cards the user holds outside any deck, ordered by card name. Card and face criteria narrow the list together.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Owner ID"),
        ListBinderQuery,
    ),
    responses(
        (status = 200, description = "Page of binder entries", body = PaginatedResponse<BinderEntryResponse>),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_binder(
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<ListBinderQuery>,
) -> Result<Json<PaginatedResponse<BinderEntryResponse>>> {
    let skip = query.pagination.skip();
    let limit = query.pagination.limit();
    let search = CardSearch::new(query.filter.into(), skip, limit);

    let (entries, total_count) = state.inventory.list_binder(user_id, &search).await?;
    let data = entries.into_iter().map(Into::into).collect();

    Ok(Json(PaginatedResponse::new(data, total_count, skip, limit)))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/binder/{card_id}",
    tag = "binder",
    summary = "Binder quantity",
    description = "Copies of a card held in the binder. Unknown pairs report 0.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Owner ID"),
        ("card_id" = uuid::Uuid, Path, description = "Card ID"),
    ),
    responses(
        (status = 200, description = "Quantity held", body = BinderQuantityResponse),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn binder_quantity(
    State(state): State<AppState>,
    Path((user_id, card_id)): Path<(UserId, CardId)>,
) -> Result<Json<BinderQuantityResponse>> {
    let quantity = state.inventory.binder_quantity(user_id, card_id).await?;
    Ok(Json(BinderQuantityResponse::new(user_id, card_id, quantity)))
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/binder/{card_id}/credit",
    tag = "binder",
    summary = "Credit binder",
    description = "Add copies of a card to the user's binder.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Owner ID"),
        ("card_id" = uuid::Uuid, Path, description = "Card ID"),
    ),
    request_body = QuantityChange,
    responses(
        (status = 200, description = "Quantity after the credit", body = BinderQuantityResponse),
        (status = 400, description = "Quantity not positive"),
        (status = 404, description = "User or card not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn credit_binder(
    State(state): State<AppState>,
    Path((user_id, card_id)): Path<(UserId, CardId)>,
    Json(change): Json<QuantityChange>,
) -> Result<Json<BinderQuantityResponse>> {
    let entry = state.inventory.credit_binder(user_id, card_id, change.quantity).await?;
    Ok(Json(entry.into()))
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/binder/{card_id}/debit",
    tag = "binder",
    summary = "Debit binder",
    description = "Remove copies of a card from the user's binder. Removing every copy deletes the entry.",
    params(
        ("user_id" = uuid::Uuid, Path, description = "Owner ID"),
        ("card_id" = uuid::Uuid, Path, description = "Card ID"),
    ),
    request_body = QuantityChange,
    responses(
        (status = 200, description = "Quantity after the debit", body = BinderQuantityResponse),
        (status = 400, description = "Quantity not positive"),
        (status = 404, description = "No binder entry for this card"),
        (status = 409, description = "Fewer copies held than requested"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn debit_binder(
    State(state): State<AppState>,
    Path((user_id, card_id)): Path<(UserId, CardId)>,
    Json(change): Json<QuantityChange>,
) -> Result<Json<BinderQuantityResponse>> {
    let remaining = state.inventory.debit_binder(user_id, card_id, change.quantity).await?;
    let response = match remaining {
        Some(entry) => entry.into(),
        None => BinderQuantityResponse::new(user_id, card_id, 0),
    };
    Ok(Json(response))
}
