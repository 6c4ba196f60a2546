//! Read-only projections for spectator displays.

use crate::{
    dto::{common::TeamSummary, public::ScoreboardResponse, rounds::RoundSnapshot},
    error::ServiceError,
    state::{SharedState, game::RoundKind},
};

/// Snapshot one round as observed at request time.
pub async fn round_snapshot(
    state: &SharedState,
    kind: RoundKind,
) -> Result<RoundSnapshot, ServiceError> {
    state.read_round_snapshot(kind).await
}

/// Current scoreboard in registration order.
pub async fn scoreboard(state: &SharedState) -> Result<ScoreboardResponse, ServiceError> {
    state
        .read_competition(|competition| {
            Ok(ScoreboardResponse {
                competition_id: competition.id.to_string(),
                teams: competition.teams.values().map(TeamSummary::from).collect(),
            })
        })
        .await
}
