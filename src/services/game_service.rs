//! Competition lifecycle: building a competition from its programme,
//! summarising it, and tearing it down.

use indexmap::IndexMap;
use rand::{rng, seq::SliceRandom};
use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        common::TeamSummary,
        format_system_time,
        host::{CompetitionSummary, CreateCompetitionRequest, QuestionInput},
    },
    engine::buzzer::TeamId,
    error::ServiceError,
    rounds::{
        Question, buzz::BuzzRound, speed::SpeedRound, steal::StealRound, tile::TileRound,
    },
    services::sse_events,
    state::{
        SharedState,
        game::{Competition, RoundEngine, RoundKind, Team},
    },
};

/// Validate the programme, build every round engine, and install the
/// competition, replacing any previous one.
pub async fn create_competition(
    state: &SharedState,
    request: CreateCompetitionRequest,
) -> Result<CompetitionSummary, ServiceError> {
    request
        .validate()
        .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    // Replacing a competition mid-question would orphan live play; the host
    // must reset or finish the open round first.
    let mid_play = state
        .read_competition(|competition| {
            Ok(competition
                .rounds
                .values()
                .any(|round| !round.is_quiescent()))
        })
        .await
        .unwrap_or(false);
    if mid_play {
        return Err(ServiceError::InvalidState(
            "a round is mid-play; reset or finish it before replacing the competition".into(),
        ));
    }

    let teams = build_roster(&request)?;
    if request.steal.packages.len() != teams.len() {
        return Err(ServiceError::InvalidInput(format!(
            "expected one package per team ({} teams, {} packages)",
            teams.len(),
            request.steal.packages.len()
        )));
    }

    // The board layout is drawn fresh for every competition so the written
    // programme does not give away which tile hides which question.
    let mut tile_questions = questions_from(request.tile.questions);
    tile_questions.shuffle(&mut rng());

    let engines = [
        RoundEngine::Buzz(BuzzRound::new(questions_from(request.buzz.questions))?),
        RoundEngine::Tile(TileRound::new(
            request.tile.keyword,
            request
                .tile
                .keyword_bonus
                .unwrap_or_else(|| state.config().keyword_bonus()),
            tile_questions,
        )?),
        RoundEngine::Speed(SpeedRound::new(
            questions_from(request.speed.questions),
            request
                .speed
                .schedule
                .unwrap_or_else(|| state.config().speed_awards().to_vec()),
        )?),
        RoundEngine::Steal(StealRound::new(
            request
                .steal
                .packages
                .into_iter()
                .map(|package| (package.label, questions_from(package.questions)))
                .collect(),
            state.config().steal_window(),
        )?),
    ];
    let mut rounds = IndexMap::new();
    for engine in engines {
        rounds.insert(engine.kind(), engine);
    }

    let competition = Competition::new(request.name, teams, rounds);
    let summary = summarize(&competition);

    info!(
        id = %competition.id,
        name = %competition.name,
        teams = competition.teams.len(),
        "competition created"
    );
    state.install_competition(competition).await;
    sse_events::broadcast_competition_created(state, &summary);
    Ok(summary)
}

/// Summary of the currently loaded competition.
pub async fn current_summary(state: &SharedState) -> Result<CompetitionSummary, ServiceError> {
    state.read_competition(|competition| Ok(summarize(competition))).await
}

/// Drop the loaded competition.
pub async fn clear_competition(state: &SharedState) -> Result<(), ServiceError> {
    if !state.clear_competition().await {
        return Err(ServiceError::NoCompetition);
    }
    info!("competition cleared");
    sse_events::broadcast_competition_cleared(state);
    Ok(())
}

/// Reset one round to its initial phase, keeping scores as they stand.
pub async fn reset_round(state: &SharedState, kind: RoundKind) -> Result<(), ServiceError> {
    let ((), snapshot) = state
        .mutate_round(kind, |competition, _now| {
            competition.round_mut(kind)?.reset();
            Ok(((), Vec::new()))
        })
        .await?;
    info!(round = %kind, "round reset");
    sse_events::broadcast_round_snapshot(state, &snapshot);
    Ok(())
}

fn build_roster(
    request: &CreateCompetitionRequest,
) -> Result<IndexMap<TeamId, Team>, ServiceError> {
    let mut teams = IndexMap::new();
    for (offset, input) in request.teams.iter().enumerate() {
        let name = input.name.trim();
        if teams.values().any(|team: &Team| team.name == name) {
            return Err(ServiceError::InvalidInput(format!(
                "duplicate team name `{name}`"
            )));
        }
        let id = offset as TeamId + 1;
        teams.insert(id, Team::new(id, name.to_string()));
    }
    Ok(teams)
}

fn questions_from(inputs: Vec<QuestionInput>) -> Vec<Question> {
    inputs
        .into_iter()
        .map(|input| Question {
            text: input.text,
            options: input.options,
            answer: input.answer,
            correct_index: input.correct_index,
            points: input.points,
            time_limit_secs: input.time_limit_secs,
        })
        .collect()
}

fn summarize(competition: &Competition) -> CompetitionSummary {
    CompetitionSummary {
        id: competition.id.to_string(),
        name: competition.name.clone(),
        teams: competition.teams.values().map(TeamSummary::from).collect(),
        rounds: competition.rounds.keys().copied().collect(),
        created_at: format_system_time(competition.created_at),
        updated_at: format_system_time(competition.updated_at),
    }
}
