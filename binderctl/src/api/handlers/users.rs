use crate::api::models::decks::DeckSummaryResponse;
use crate::api::models::users::{UserCreate, UserResponse};
use crate::db::models::users::UserCreateDBRequest;
use crate::errors::Result;
use crate::{AppState, types::UserId};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Blank username"),
        (status = 409, description = "Username already taken"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_user(State(state): State<AppState>, Json(request): Json<UserCreate>) -> Result<(StatusCode, Json<UserResponse>)> {
    let user = state.inventory.create_user(&UserCreateDBRequest::from(request)).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, Path(id): Path<UserId>) -> Result<Json<UserResponse>> {
    let user = state.inventory.get_user(id).await?;
    Ok(Json(user.into()))
}

#[utoipa::path(
    get,
    path = "/users/{user_id}/decks",
    tag = "decks",
    summary = "List a user's decks",
    description = "Every deck owned by the user with the total number of copies allocated to it.",
    params(("user_id" = uuid::Uuid, Path, description = "Owner ID")),
    responses(
        (status = 200, description = "Decks, newest first", body = Vec<DeckSummaryResponse>),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_user_decks(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Result<Json<Vec<DeckSummaryResponse>>> {
    let decks = state.inventory.list_user_decks(user_id).await?;
    Ok(Json(decks.into_iter().map(Into::into).collect()))
}
