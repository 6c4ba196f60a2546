use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse {
        status: "ok",
        competition_loaded: state.has_competition().await,
    }
}
