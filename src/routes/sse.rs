use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{error::AppError, services::sse_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/sse/public",
    responses((status = 200, description = "Public SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream realtime public events to spectator displays.
pub async fn public_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    info!("New public SSE connection");
    sse_service::spectator_stream(&state)
}

#[utoipa::path(
    get,
    path = "/sse/host",
    responses((status = 200, description = "Host SSE stream", content_type = "text/event-stream", body = String))
)]
/// Stream host-only events, establishing the host token.
pub async fn host_stream(
    State(state): State<SharedState>,
) -> Result<Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>>, AppError> {
    info!("New host SSE connection");
    Ok(sse_service::host_stream(&state).await?)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/sse/public", get(public_stream))
        .route("/sse/host", get(host_stream))
}
