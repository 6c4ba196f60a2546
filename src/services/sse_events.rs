use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        common::TeamSummary,
        host::CompetitionSummary,
        rounds::RoundSnapshot,
        sse::ServerEvent,
    },
    engine::buzzer::{BuzzerPress, TeamId},
    state::{SharedState, game::RoundKind},
};

const EVENT_ROUND_SNAPSHOT: &str = "round.snapshot";
const EVENT_BUZZ_ACCEPTED: &str = "buzz.accepted";
const EVENT_SCOREBOARD: &str = "scoreboard";
const EVENT_COMPETITION_CREATED: &str = "competition.created";
const EVENT_COMPETITION_CLEARED: &str = "competition.cleared";

/// Full per-client buzz notification, broadcast before the snapshot so
/// displays can animate the race as it happens.
#[derive(Debug, Serialize)]
struct BuzzAcceptedEvent {
    round: RoundKind,
    press: BuzzerPress,
    position: usize,
}

/// Broadcast the authoritative post-command snapshot of a round to both
/// streams. Every mutation ends with one of these, so clients reconcile on
/// full state rather than on deltas.
pub fn broadcast_round_snapshot(state: &SharedState, snapshot: &RoundSnapshot) {
    send_public_event(state, EVENT_ROUND_SNAPSHOT, snapshot);
    send_host_event(state, EVENT_ROUND_SNAPSHOT, snapshot);
}

/// Broadcast an accepted buzzer press with its race position.
pub fn broadcast_buzz_accepted(
    state: &SharedState,
    round: RoundKind,
    press: &BuzzerPress,
    position: usize,
) {
    let payload = BuzzAcceptedEvent {
        round,
        press: press.clone(),
        position,
    };
    send_public_event(state, EVENT_BUZZ_ACCEPTED, &payload);
    send_host_event(state, EVENT_BUZZ_ACCEPTED, &payload);
}

/// Broadcast the current scoreboard to public subscribers.
pub fn broadcast_scoreboard(state: &SharedState, teams: &[TeamSummary]) {
    send_public_event(state, EVENT_SCOREBOARD, &teams);
}

/// Broadcast that a competition has been created.
pub fn broadcast_competition_created(state: &SharedState, summary: &CompetitionSummary) {
    send_public_event(state, EVENT_COMPETITION_CREATED, summary);
    send_host_event(state, EVENT_COMPETITION_CREATED, summary);
}

/// Broadcast that the loaded competition has been dropped.
pub fn broadcast_competition_cleared(state: &SharedState) {
    let payload = serde_json::json!({});
    send_public_event(state, EVENT_COMPETITION_CLEARED, &payload);
    send_host_event(state, EVENT_COMPETITION_CLEARED, &payload);
}

/// Send a buzz rejection hint to one team via the host stream only; other
/// teams never learn about rejected presses.
pub fn broadcast_press_rejected(state: &SharedState, round: RoundKind, team_id: TeamId, kind: &str) {
    let payload = serde_json::json!({
        "round": round,
        "team_id": team_id,
        "kind": kind,
    });
    send_host_event(state, "buzz.rejected", &payload);
}

fn send_public_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.events().spectators().publish(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}

fn send_host_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.events().host().publish(event),
        Err(err) => warn!(event, error = %err, "failed to serialize host SSE payload"),
    }
}
