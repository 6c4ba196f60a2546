use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};

use crate::{
    dto::{
        play::{
            HopeStarRequest, KeywordGuessRequest, PressBuzzerRequest, SelectTileRequest,
            SubmitAnswerRequest,
        },
        rounds::RoundSnapshot,
        ws::BuzzFeedback,
    },
    error::AppError,
    services::play_service,
    state::{SharedState, game::RoundKind},
};

/// Team-facing endpoints, the HTTP fallback for consoles without a socket.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/play/rounds/{round}/buzz", post(press_buzzer))
        .route("/play/rounds/{round}/answer", post(submit_answer))
        .route("/play/tile/select", post(select_tile))
        .route("/play/tile/keyword", post(guess_keyword))
        .route("/play/steal/hope-star", post(flag_hope_star))
}

/// Press the buzzer in a race-bearing round.
#[utoipa::path(
    post,
    path = "/play/rounds/{round}/buzz",
    tag = "play",
    params(("round" = String, Path, description = "Round format: buzz or steal")),
    request_body = PressBuzzerRequest,
    responses((status = 200, description = "Press accepted with its race position", body = BuzzFeedback))
)]
pub async fn press_buzzer(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
    Json(request): Json<PressBuzzerRequest>,
) -> Result<Json<BuzzFeedback>, AppError> {
    let team_id = request.team_id;
    let (_press, position) = play_service::press_buzzer(&state, round, request).await?;
    Ok(Json(BuzzFeedback {
        team_id,
        accepted: true,
        position: Some(position),
    }))
}

/// Submit a written answer in the round's current answer slot.
#[utoipa::path(
    post,
    path = "/play/rounds/{round}/answer",
    tag = "play",
    params(("round" = String, Path, description = "Round format: tile, speed or steal")),
    request_body = SubmitAnswerRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn submit_answer(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
    Json(request): Json<SubmitAnswerRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(play_service::submit_answer(&state, round, request).await?))
}

/// Pick a tile on the board.
#[utoipa::path(
    post,
    path = "/play/tile/select",
    tag = "play",
    request_body = SelectTileRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn select_tile(
    State(state): State<SharedState>,
    Json(request): Json<SelectTileRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(play_service::select_tile(&state, request).await?))
}

/// Guess the hidden keyword, one attempt per team for the whole round.
#[utoipa::path(
    post,
    path = "/play/tile/keyword",
    tag = "play",
    request_body = KeywordGuessRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn guess_keyword(
    State(state): State<SharedState>,
    Json(request): Json<KeywordGuessRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(play_service::guess_keyword(&state, request).await?))
}

/// Flag the hope star for the upcoming steal-round question.
#[utoipa::path(
    post,
    path = "/play/steal/hope-star",
    tag = "play",
    request_body = HopeStarRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn flag_hope_star(
    State(state): State<SharedState>,
    Json(request): Json<HopeStarRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(play_service::flag_hope_star(&state, request).await?))
}
