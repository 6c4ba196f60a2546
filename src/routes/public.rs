use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::{public::ScoreboardResponse, rounds::RoundSnapshot},
    error::AppError,
    services::public_service,
    state::{SharedState, game::RoundKind},
};

/// Read-only endpoints for spectator displays.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/rounds/{round}", get(round_snapshot))
        .route("/scoreboard", get(scoreboard))
}

/// Snapshot one round as observed at request time.
#[utoipa::path(
    get,
    path = "/rounds/{round}",
    tag = "public",
    params(("round" = String, Path, description = "Round format: buzz, tile, speed or steal")),
    responses((status = 200, description = "Round snapshot", body = RoundSnapshot))
)]
pub async fn round_snapshot(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(public_service::round_snapshot(&state, round).await?))
}

/// Current scoreboard in registration order.
#[utoipa::path(
    get,
    path = "/scoreboard",
    tag = "public",
    responses((status = 200, description = "Scoreboard", body = ScoreboardResponse))
)]
pub async fn scoreboard(
    State(state): State<SharedState>,
) -> Result<Json<ScoreboardResponse>, AppError> {
    Ok(Json(public_service::scoreboard(&state).await?))
}
