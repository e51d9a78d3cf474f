use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::round::{ClickResponse, CreateRoundRequest, RoundSnapshot},
    error::AppError,
    services::round_service,
    state::SharedState,
};

/// Routes driving a round from the start screen to its result.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/rounds", post(create_round))
        .route("/rounds/{id}", get(get_round))
        .route("/rounds/{id}/start", post(start_round))
        .route("/rounds/{id}/cards/{slot}", post(click_card))
}

/// Deal a shuffled deck and open the start screen.
#[utoipa::path(
    post,
    path = "/rounds",
    tag = "rounds",
    request_body = CreateRoundRequest,
    responses(
        (status = 200, description = "Round dealt", body = RoundSnapshot),
        (status = 400, description = "Pair count out of range"),
        (status = 422, description = "Invalid pseudonym"),
        (status = 500, description = "Not enough distinct Pokémon for the deck"),
        (status = 503, description = "No Pokémon available or storage down")
    )
)]
pub async fn create_round(
    State(state): State<SharedState>,
    Json(payload): Json<CreateRoundRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::create_round(&state, payload).await?;
    Ok(Json(snapshot))
}

/// Current board, countdown and result of a round.
#[utoipa::path(
    get,
    path = "/rounds/{id}",
    tag = "rounds",
    params(("id" = String, Path, description = "Identifier of the round")),
    responses(
        (status = 200, description = "Round state", body = RoundSnapshot),
        (status = 404, description = "Unknown or expired round")
    )
)]
pub async fn get_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::get_round(&state, id).await?;
    Ok(Json(snapshot))
}

/// Leave the start screen and launch the countdown.
#[utoipa::path(
    post,
    path = "/rounds/{id}/start",
    tag = "rounds",
    params(("id" = String, Path, description = "Identifier of the round")),
    responses(
        (status = 200, description = "Round running", body = RoundSnapshot),
        (status = 404, description = "Unknown or expired round")
    )
)]
pub async fn start_round(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RoundSnapshot>, AppError> {
    let snapshot = round_service::start_round(&state, id).await?;
    Ok(Json(snapshot))
}

/// Click a card. Clicks the board does not accept are reported as ignored.
#[utoipa::path(
    post,
    path = "/rounds/{id}/cards/{slot}",
    tag = "rounds",
    params(
        ("id" = String, Path, description = "Identifier of the round"),
        ("slot" = usize, Path, description = "Position of the card in the deck")
    ),
    responses(
        (status = 200, description = "Click processed", body = ClickResponse),
        (status = 400, description = "Slot outside the deck"),
        (status = 404, description = "Unknown or expired round")
    )
)]
pub async fn click_card(
    State(state): State<SharedState>,
    Path((id, slot)): Path<(Uuid, usize)>,
) -> Result<Json<ClickResponse>, AppError> {
    let response = round_service::click_card(&state, id, slot).await?;
    Ok(Json(response))
}
