//! Team-side commands, issued from the consoles over WebSocket or from the
//! HTTP fallback. Rejections never mutate state; the issuer gets the error
//! while everyone else keeps their last snapshot.

use crate::{
    dto::{
        play::{
            HopeStarRequest, KeywordGuessRequest, PressBuzzerRequest, SelectTileRequest,
            SubmitAnswerRequest,
        },
        rounds::RoundSnapshot,
    },
    engine::{EngineError, buzzer::BuzzerPress},
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        game::{RoundEngine, RoundKind},
    },
};

/// Press the buzzer in a race-bearing round.
///
/// Returns the accepted press and its race position, first is 1.
pub async fn press_buzzer(
    state: &SharedState,
    kind: RoundKind,
    request: PressBuzzerRequest,
) -> Result<(BuzzerPress, usize), ServiceError> {
    let result = state
        .mutate_round(kind, |competition, now| {
            let team_name = competition.team(request.team_id)?.name.clone();
            let (press, position) = match competition.round_mut(kind)? {
                RoundEngine::Buzz(round) => {
                    round.press(request.team_id, &team_name, now)?;
                    (round.presses().last().cloned(), round.presses().len())
                }
                RoundEngine::Steal(round) => {
                    round.press(request.team_id, &team_name, now)?;
                    (round.presses().last().cloned(), round.presses().len())
                }
                _ => {
                    return Err(EngineError::ValidationFailed(format!(
                        "round {kind} has no buzzer race"
                    ))
                    .into());
                }
            };
            let press = press
                .ok_or_else(|| EngineError::NotFound("accepted press not recorded".into()))?;
            Ok(((press, position), Vec::new()))
        })
        .await;

    match result {
        Ok(((press, position), snapshot)) => {
            sse_events::broadcast_buzz_accepted(state, kind, &press, position);
            sse_events::broadcast_round_snapshot(state, &snapshot);
            Ok((press, position))
        }
        Err(err) => {
            sse_events::broadcast_press_rejected(state, kind, request.team_id, err.kind());
            Err(err)
        }
    }
}

/// Submit a written answer in the round's current answer slot.
pub async fn submit_answer(
    state: &SharedState,
    kind: RoundKind,
    request: SubmitAnswerRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(kind, |competition, now| {
            let team_name = competition.team(request.team_id)?.name.clone();
            match competition.round_mut(kind)? {
                RoundEngine::Tile(round) => round
                    .submit_answer(request.team_id, &team_name, request.text, now)
                    .map(drop)?,
                RoundEngine::Speed(round) => round
                    .submit_answer(request.team_id, &team_name, request.text, now)
                    .map(drop)?,
                RoundEngine::Steal(round) => round
                    .submit_answer(request.team_id, &team_name, request.text, now)
                    .map(drop)?,
                RoundEngine::Buzz(_) => {
                    return Err(EngineError::ValidationFailed(
                        "buzz-round answers are spoken, not written".into(),
                    )
                    .into());
                }
            }
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Pick a tile on the board.
pub async fn select_tile(
    state: &SharedState,
    request: SelectTileRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(RoundKind::Tile, |competition, _now| {
            competition.team(request.team_id)?;
            match competition.round_mut(RoundKind::Tile)? {
                RoundEngine::Tile(round) => {
                    round.select_tile(request.team_id, request.tile).map(drop)?;
                }
                _ => return Err(EngineError::NotFound("tile round not loaded".into()).into()),
            }
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}

/// Guess the hidden keyword. One attempt per team for the whole round; a
/// correct guess ends the round and awards the bonus.
pub async fn guess_keyword(
    state: &SharedState,
    request: KeywordGuessRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(RoundKind::Tile, |competition, _now| {
            let team_name = competition.team(request.team_id)?.name.clone();
            let events = match competition.round_mut(RoundKind::Tile)? {
                RoundEngine::Tile(round) => {
                    round.guess_keyword(request.team_id, &team_name, request.text)?.1
                }
                _ => return Err(EngineError::NotFound("tile round not loaded".into()).into()),
            };
            Ok(((), events))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    if let RoundSnapshot::Tile(tile) = &snapshot {
        sse_events::broadcast_scoreboard(state, &tile.scoreboard);
    }
    Ok(snapshot)
}

/// Flag the hope star for the upcoming steal-round question. The star is
/// consumed at flag time and never returned, even on a wrong answer.
pub async fn flag_hope_star(
    state: &SharedState,
    request: HopeStarRequest,
) -> Result<RoundSnapshot, ServiceError> {
    let ((), snapshot) = state
        .mutate_round(RoundKind::Steal, |competition, _now| {
            if competition.team(request.team_id)?.hope_star_used {
                return Err(EngineError::ValidationFailed(format!(
                    "team {} has already spent its hope star",
                    request.team_id
                ))
                .into());
            }
            match competition.round_mut(RoundKind::Steal)? {
                RoundEngine::Steal(round) => round.flag_hope_star(request.team_id).map(drop)?,
                _ => return Err(EngineError::NotFound("steal round not loaded".into()).into()),
            }
            competition.team_mut(request.team_id)?.hope_star_used = true;
            Ok(((), Vec::new()))
        })
        .await?;
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(snapshot)
}
