//! Host-side round commands. Every command funnels through
//! [`crate::state::AppState::mutate_round`], so validation, mutation and the
//! post-command snapshot all happen under one write-lock acquisition.

use crate::{
    dto::{
        host::{AssignTeamRequest, JudgeAnswerRequest, SelectPackageRequest},
        rounds::RoundSnapshot,
    },
    engine::{EngineError, scoring::Judgment},
    error::ServiceError,
    rounds::steal::StealPhase,
    services::sse_events,
    state::{
        SharedState,
        game::{RoundEngine, RoundKind},
    },
};

/// Sequence the round forward: open the next question, the next turn, or
/// finish the round.
pub async fn advance_round(
    state: &SharedState,
    kind: RoundKind,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(kind, |competition, now| {
            match competition.round_mut(kind)? {
                RoundEngine::Buzz(round) => round.advance(now).map(drop)?,
                RoundEngine::Tile(round) => round.advance().map(drop)?,
                RoundEngine::Speed(round) => round.advance(now).map(drop)?,
                RoundEngine::Steal(round) => match round.phase() {
                    StealPhase::Idle => round.start().map(drop)?,
                    _ => round.advance().map(drop)?,
                },
            }
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Open the prepared question and start its clock.
pub async fn open_question(
    state: &SharedState,
    kind: RoundKind,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(kind, |competition, now| {
            match competition.round_mut(kind)? {
                // Buzz and speed questions open as part of sequencing.
                RoundEngine::Buzz(round) => round.advance(now).map(drop)?,
                RoundEngine::Speed(round) => round.advance(now).map(drop)?,
                RoundEngine::Tile(round) => round.open_question(now).map(drop)?,
                RoundEngine::Steal(round) => round.open_question(now).map(drop)?,
            }
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Close the active window ahead of, or after, its expiry. In the steal
/// round this also resolves the buzzer race once the steal window is up.
pub async fn force_close(
    state: &SharedState,
    kind: RoundKind,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(kind, |competition, now| {
            match competition.round_mut(kind)? {
                RoundEngine::Buzz(round) => round.force_close().map(drop)?,
                RoundEngine::Tile(round) => round.force_close().map(drop)?,
                RoundEngine::Speed(round) => round.close_question().map(drop)?,
                RoundEngine::Steal(round) => match round.phase() {
                    StealPhase::BuzzerWindow => round.close_buzzer_window().map(drop)?,
                    _ => round.close_question(now).map(drop)?,
                },
            }
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Rule on the pending answer. Score deltas settle inside the same critical
/// section, so judging the same answer twice is rejected by the machine.
pub async fn judge_answer(
    state: &SharedState,
    kind: RoundKind,
    request: JudgeAnswerRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let judgment = if request.correct {
        Judgment::Correct
    } else {
        Judgment::Incorrect
    };
    let ((), snapshot) = state
        .mutate_round(kind, |competition, now| {
            let events = match competition.round_mut(kind)? {
                RoundEngine::Buzz(round) => round.judge(judgment, now)?.1,
                RoundEngine::Tile(round) => round.judge(judgment)?.1,
                RoundEngine::Speed(round) => {
                    let team_id = request.team_id.ok_or_else(|| {
                        EngineError::ValidationFailed(
                            "team_id is required to judge a written answer".into(),
                        )
                    })?;
                    round.judge(team_id, judgment)?.1
                }
                RoundEngine::Steal(round) => round.judge(judgment, now)?.1,
            };
            Ok(((), events))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    broadcast_scores(state, &snapshot);
    Ok(snapshot)
}

fn broadcast_scores(state: &SharedState, snapshot: &RoundSnapshot) {
    let scoreboard = match snapshot {
        RoundSnapshot::Buzz(s) => &s.scoreboard,
        RoundSnapshot::Tile(s) => &s.scoreboard,
        RoundSnapshot::Speed(s) => &s.scoreboard,
        RoundSnapshot::Steal(s) => &s.scoreboard,
    };
    sse_events::broadcast_scoreboard(state, scoreboard);
}

/// Pick the acting team for the next steal-round package turn.
pub async fn assign_main_team(
    state: &SharedState,
    request: AssignTeamRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(RoundKind::Steal, |competition, _now| {
            competition.team(request.team_id)?;
            let order = match competition.round_mut(RoundKind::Steal)? {
                RoundEngine::Steal(round) => {
                    round.assign_main_team(request.team_id)?;
                    round.served_teams().len() + 1
                }
                _ => return Err(EngineError::NotFound("steal round not loaded".into()).into()),
            };
            competition.team_mut(request.team_id)?.package_order = Some(order);
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Confirm the acting team's package choice.
pub async fn select_package(
    state: &SharedState,
    request: SelectPackageRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(RoundKind::Steal, |competition, _now| {
            match competition.round_mut(RoundKind::Steal)? {
                RoundEngine::Steal(round) => round.select_package(request.package).map(drop)?,
                _ => return Err(EngineError::NotFound("steal round not loaded".into()).into()),
            }
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}
