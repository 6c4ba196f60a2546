use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Quiz Arena Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::sse::host_stream,
        crate::routes::ws::ws_handler,
        crate::routes::public::round_snapshot,
        crate::routes::public::scoreboard,
        crate::routes::play::press_buzzer,
        crate::routes::play::submit_answer,
        crate::routes::play::select_tile,
        crate::routes::play::guess_keyword,
        crate::routes::play::flag_hope_star,
        crate::routes::host::create_competition,
        crate::routes::host::get_competition,
        crate::routes::host::clear_competition,
        crate::routes::host::advance_round,
        crate::routes::host::open_question,
        crate::routes::host::force_close,
        crate::routes::host::judge_answer,
        crate::routes::host::reset_round,
        crate::routes::host::assign_main_team,
        crate::routes::host::select_package,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::common::TeamSummary,
            crate::dto::common::QuestionView,
            crate::dto::public::ScoreboardResponse,
            crate::dto::rounds::RoundSnapshot,
            crate::dto::host::CreateCompetitionRequest,
            crate::dto::host::CompetitionSummary,
            crate::dto::host::JudgeAnswerRequest,
            crate::dto::host::AssignTeamRequest,
            crate::dto::host::SelectPackageRequest,
            crate::dto::play::PressBuzzerRequest,
            crate::dto::play::SubmitAnswerRequest,
            crate::dto::play::SelectTileRequest,
            crate::dto::play::KeywordGuessRequest,
            crate::dto::play::HopeStarRequest,
            crate::dto::ws::ConsoleInboundMessage,
            crate::dto::ws::ConsoleAck,
            crate::dto::ws::BuzzFeedback,
            crate::dto::sse::HostHandshake,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "public", description = "Read-only spectator endpoints"),
        (name = "play", description = "Team-facing commands"),
        (name = "host", description = "Host-only competition controls"),
    )
)]
pub struct ApiDoc;
