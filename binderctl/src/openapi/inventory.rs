//! OpenAPI documentation for the inventory API.

use utoipa::OpenApi;

use super::extra_types;
use crate::api;

#[derive(OpenApi)]
#[openapi(
    servers((url = "/api/v1")),
    paths(
        api::handlers::users::create_user,
        api::handlers::users::get_user,
        api::handlers::users::list_user_decks,
        api::handlers::cards::list_cards,
        api::handlers::cards::register_card,
        api::handlers::cards::get_card,
        api::handlers::binder::list_binder,
        api::handlers::binder::binder_quantity,
        api::handlers::binder::credit_binder,
        api::handlers::binder::debit_binder,
        api::handlers::decks::create_deck,
        api::handlers::decks::get_deck,
        api::handlers::decks::update_deck,
        api::handlers::decks::delete_deck,
        api::handlers::decks::deck_totals,
        api::handlers::decks::export_deck,
        api::handlers::transfers::allocate,
        api::handlers::transfers::deallocate,
        api::handlers::transfers::move_zone,
        api::handlers::transfers::transfer,
    ),
    components(
        schemas(
            extra_types::ErrorResponse,
            crate::types::Zone,
            api::models::users::UserCreate,
            api::models::users::UserResponse,
            api::models::cards::CardCreate,
            api::models::cards::CardFaceBody,
            api::models::cards::CardResponse,
            api::models::binder::QuantityChange,
            api::models::binder::BinderQuantityResponse,
            api::models::binder::BinderEntryResponse,
            api::models::decks::DeckCreate,
            api::models::decks::DeckUpdate,
            api::models::decks::DeckResponse,
            api::models::decks::DeckSummaryResponse,
            api::models::decks::DeckEntryResponse,
            api::models::decks::DeckDetailResponse,
            api::models::decks::DeckTotalsResponse,
            api::models::decks::ReturnedCards,
            api::models::decks::DeckDeletedResponse,
            api::models::transfers::AllocateRequest,
            api::models::transfers::DeallocateRequest,
            api::models::transfers::ZoneMoveRequest,
            api::models::transfers::TransferRequest,
            api::models::transfers::RemovalResponse,
            api::models::transfers::TransferResponse,
            api::models::transfers::ZoneMoveResponse,
        )
    ),
    tags(
        (name = "users", description = "Collectors who own binders and decks."),
        (name = "cards", description = "The card catalog. Printings are registered once and referenced by id everywhere else."),
        (name = "binder", description = "Cards a user owns that are not in any deck.

A binder holds at most one entry per card. Entries are removed when their quantity reaches zero."),
        (name = "decks", description = "Named card lists with a main deck and a sideboard.

Each deck may carry a capacity limit on the total number of copies across both zones."),
        (name = "transfers", description = "Moving copies between the binder and decks.

Every transfer runs as one unit: a copy leaves one place only if it arrives in another. Errors leave all quantities unchanged."),
    ),
    info(
        title = "binderctl",
        version = "1.0.0",
        description = "Card binder and deck inventory API.

## Errors

Errors carry a machine-readable `kind`, a `message`, and kind-specific details:

```json
{
  \"kind\": \"insufficient_quantity\",
  \"message\": \"Insufficient quantity: have 2, want 3\",
  \"have\": 2,
  \"want\": 3
}
```",
    ),
)]
pub struct InventoryApiDoc;
