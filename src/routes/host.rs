use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};

use crate::{
    dto::{
        host::{
            AssignTeamRequest, CompetitionSummary, CreateCompetitionRequest, JudgeAnswerRequest,
            SelectPackageRequest,
        },
        rounds::RoundSnapshot,
    },
    error::AppError,
    services::{game_service, host_service},
    state::{SharedState, game::RoundKind},
};

const HOST_TOKEN_HEADER: &str = "x-host-token";

/// Host-only endpoints for configuring and driving competitions.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route(
            "/host/competition",
            get(get_competition)
                .post(create_competition)
                .delete(clear_competition),
        )
        .route("/host/rounds/{round}/advance", post(advance_round))
        .route("/host/rounds/{round}/open", post(open_question))
        .route("/host/rounds/{round}/close", post(force_close))
        .route("/host/rounds/{round}/judge", post(judge_answer))
        .route("/host/rounds/{round}/reset", post(reset_round))
        .route("/host/steal/team", post(assign_main_team))
        .route("/host/steal/package", post(select_package))
        .route_layer(middleware::from_fn_with_state(state, require_host_token))
}

/// Create a competition from its full programme, replacing any loaded one.
#[utoipa::path(
    post,
    path = "/host/competition",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = CreateCompetitionRequest,
    responses((status = 201, description = "Competition created", body = CompetitionSummary))
)]
pub async fn create_competition(
    State(state): State<SharedState>,
    Json(request): Json<CreateCompetitionRequest>,
) -> Result<(StatusCode, Json<CompetitionSummary>), AppError> {
    let summary = game_service::create_competition(&state, request).await?;
    Ok((StatusCode::CREATED, Json(summary)))
}

/// Summary of the loaded competition.
#[utoipa::path(
    get,
    path = "/host/competition",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 200, description = "Competition summary", body = CompetitionSummary))
)]
pub async fn get_competition(
    State(state): State<SharedState>,
) -> Result<Json<CompetitionSummary>, AppError> {
    Ok(Json(game_service::current_summary(&state).await?))
}

/// Drop the loaded competition.
#[utoipa::path(
    delete,
    path = "/host/competition",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    responses((status = 204, description = "Competition cleared"))
)]
pub async fn clear_competition(
    State(state): State<SharedState>,
) -> Result<StatusCode, AppError> {
    game_service::clear_competition(&state).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Sequence the round forward.
#[utoipa::path(
    post,
    path = "/host/rounds/{round}/advance",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("round" = String, Path, description = "Round format: buzz, tile, speed or steal")),
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn advance_round(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(host_service::advance_round(&state, round).await?))
}

/// Open the prepared question and start its clock.
#[utoipa::path(
    post,
    path = "/host/rounds/{round}/open",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("round" = String, Path, description = "Round format: buzz, tile, speed or steal")),
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn open_question(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(host_service::open_question(&state, round).await?))
}

/// Close the active window ahead of, or after, its expiry.
#[utoipa::path(
    post,
    path = "/host/rounds/{round}/close",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("round" = String, Path, description = "Round format: buzz, tile, speed or steal")),
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn force_close(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(host_service::force_close(&state, round).await?))
}

/// Rule on the pending answer.
#[utoipa::path(
    post,
    path = "/host/rounds/{round}/judge",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("round" = String, Path, description = "Round format: buzz, tile, speed or steal")),
    request_body = JudgeAnswerRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn judge_answer(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
    Json(request): Json<JudgeAnswerRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(host_service::judge_answer(&state, round, request).await?))
}

/// Reset one round to its initial phase, keeping scores as they stand.
#[utoipa::path(
    post,
    path = "/host/rounds/{round}/reset",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream"),
    ("round" = String, Path, description = "Round format: buzz, tile, speed or steal")),
    responses((status = 204, description = "Round reset"))
)]
pub async fn reset_round(
    State(state): State<SharedState>,
    Path(round): Path<RoundKind>,
) -> Result<StatusCode, AppError> {
    game_service::reset_round(&state, round).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Pick the acting team for the next steal-round package turn.
#[utoipa::path(
    post,
    path = "/host/steal/team",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = AssignTeamRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn assign_main_team(
    State(state): State<SharedState>,
    Json(request): Json<AssignTeamRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(host_service::assign_main_team(&state, request).await?))
}

/// Confirm the acting team's package choice.
#[utoipa::path(
    post,
    path = "/host/steal/package",
    tag = "host",
    params(("X-Host-Token" = String, Header, description = "Host token issued by the /sse/host stream")),
    request_body = SelectPackageRequest,
    responses((status = 200, description = "Post-command snapshot", body = RoundSnapshot))
)]
pub async fn select_package(
    State(state): State<SharedState>,
    Json(request): Json<SelectPackageRequest>,
) -> Result<Json<RoundSnapshot>, AppError> {
    Ok(Json(host_service::select_package(&state, request).await?))
}

async fn require_host_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(HOST_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| AppError::Unauthorized("missing host token header `X-Host-Token`".into()))?;

    state.events().authorize_host(&provided).await?;
    Ok(next.run(req).await)
}
