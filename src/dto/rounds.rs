//! Full per-round snapshots. A snapshot is self-sufficient: it carries the
//! phase, the visible question, the remaining time (computed at read time
//! from the stored window, never pre-baked), the collected presses/answers,
//! and the scoreboard, so a client can render from any single message.

use std::time::Instant;

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    engine::{
        EngineError,
        buzzer::{BuzzerPress, TeamId},
        clock::TimerWindow,
        scoring::Judgment,
    },
    rounds::{
        TeamAnswer,
        buzz::{BuzzPhase, BuzzRound},
        speed::{SpeedPhase, SpeedRound},
        steal::{StealPhase, StealRound},
        tile::{TilePhase, TileRound},
    },
    state::game::{Competition, RoundEngine, RoundKind},
    dto::common::{QuestionView, TeamSummary},
};

/// Snapshot of one round, tagged by its format.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "round", rename_all = "snake_case")]
pub enum RoundSnapshot {
    /// Open-ended buzz round snapshot.
    Buzz(BuzzSnapshot),
    /// Tile/keyword round snapshot.
    Tile(TileSnapshot),
    /// Speed-ranked round snapshot.
    Speed(SpeedSnapshot),
    /// Steal/package round snapshot.
    Steal(StealSnapshot),
}

impl RoundSnapshot {
    /// Build the snapshot for `kind` as observed at `now`.
    pub fn build(
        competition: &Competition,
        kind: RoundKind,
        now: Instant,
    ) -> Result<Self, EngineError> {
        let scoreboard = scoreboard(competition);
        Ok(match competition.round(kind)? {
            RoundEngine::Buzz(round) => RoundSnapshot::Buzz(BuzzSnapshot::build(round, scoreboard, now)),
            RoundEngine::Tile(round) => RoundSnapshot::Tile(TileSnapshot::build(round, scoreboard, now)),
            RoundEngine::Speed(round) => {
                RoundSnapshot::Speed(SpeedSnapshot::build(round, scoreboard, now))
            }
            RoundEngine::Steal(round) => {
                RoundSnapshot::Steal(StealSnapshot::build(round, scoreboard, now))
            }
        })
    }
}

/// Scoreboard in registration order.
pub fn scoreboard(competition: &Competition) -> Vec<TeamSummary> {
    competition.teams.values().map(TeamSummary::from).collect()
}

fn remaining_secs(window: &TimerWindow, now: Instant) -> Option<u64> {
    window.started_at().map(|_| window.remaining(now).as_secs())
}

/// One recorded attempt as seen by clients.
///
/// Submission text is withheld while other teams can still submit, so a
/// spectator stream never hands a competing team a ready-made answer.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct AnswerView {
    /// Answering team.
    pub team_id: TeamId,
    /// Display name captured at submission time.
    pub team_name: String,
    /// Submitted text, present once the window no longer accepts entries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Judgment state of the attempt.
    pub judgment: Judgment,
    /// Milliseconds since the window opened.
    pub submitted_at_ms: u64,
    /// Settled score delta, absent until the attempt is settled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<i32>,
    /// Whether this was the acting team's own attempt.
    pub is_main_team: bool,
    /// Whether a hope star doubled this attempt.
    pub used_hope_star: bool,
}

impl AnswerView {
    fn project(answer: &TeamAnswer, disclosed: bool) -> Self {
        Self {
            team_id: answer.team_id,
            team_name: answer.team_name.clone(),
            text: disclosed.then(|| answer.text.clone()),
            judgment: answer.judgment,
            submitted_at_ms: answer.submitted_at_ms,
            points_awarded: answer.points_awarded,
            is_main_team: answer.is_main_team,
            used_hope_star: answer.used_hope_star,
        }
    }

    fn project_all(answers: &[TeamAnswer], disclosed: bool) -> Vec<Self> {
        answers
            .iter()
            .map(|answer| Self::project(answer, disclosed))
            .collect()
    }
}

/// Snapshot of the open-ended buzz round.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct BuzzSnapshot {
    /// Current phase.
    #[serde(flatten)]
    pub phase: BuzzPhase,
    /// Question in play, solution included once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Index of the question in play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    /// Total question count.
    pub question_count: usize,
    /// Seconds left in the active window, recomputed at read time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    /// Accepted presses for the current question, receipt order.
    pub presses: Vec<BuzzerPress>,
    /// Judged attempts for the current question.
    pub answers: Vec<AnswerView>,
    /// Current scores.
    pub scoreboard: Vec<TeamSummary>,
}

impl BuzzSnapshot {
    fn build(round: &BuzzRound, scoreboard: Vec<TeamSummary>, now: Instant) -> Self {
        let revealed = matches!(round.phase(), BuzzPhase::Revealed | BuzzPhase::Finished);
        Self {
            phase: round.phase(),
            question: round
                .current_question()
                .map(|q| QuestionView::project(q, revealed)),
            question_index: round.current_index(),
            question_count: round.question_count(),
            remaining_secs: remaining_secs(round.window(), now),
            presses: round.presses().to_vec(),
            answers: AnswerView::project_all(round.answers(), revealed),
            scoreboard,
        }
    }
}

/// State of one tile on the board.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TileView {
    /// Board position.
    pub index: usize,
    /// Whether the tile can still be selected.
    pub open: bool,
    /// Whether the tile's image part is uncovered.
    pub revealed: bool,
    /// Point value of the tile's question.
    pub points: i32,
}

/// Snapshot of the tile/keyword round.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct TileSnapshot {
    /// Current phase.
    #[serde(flatten)]
    pub phase: TilePhase,
    /// All tiles in board order.
    pub tiles: Vec<TileView>,
    /// Question behind the tile in play, solution included once settled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Seconds left in the active window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    /// Tile answers recorded so far. Only the selecting team may answer a
    /// tile, so its text is disclosed as soon as it is recorded.
    pub answers: Vec<AnswerView>,
    /// Keyword guesses recorded so far; wrong guesses stay hidden until the
    /// round is over so they do not narrow the search for everyone else.
    pub keyword_guesses: Vec<AnswerView>,
    /// The keyword itself, exposed only once the round is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword: Option<String>,
    /// Team that found the keyword, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub keyword_found_by: Option<TeamId>,
    /// Current scores.
    pub scoreboard: Vec<TeamSummary>,
}

impl TileSnapshot {
    fn build(round: &TileRound, scoreboard: Vec<TeamSummary>, now: Instant) -> Self {
        let settled = matches!(round.phase(), TilePhase::Answered { .. } | TilePhase::Finished);
        Self {
            phase: round.phase(),
            tiles: round
                .tiles()
                .iter()
                .enumerate()
                .map(|(index, tile)| TileView {
                    index,
                    open: tile.is_open(),
                    revealed: tile.is_revealed(),
                    points: tile.question().points,
                })
                .collect(),
            question: round
                .current_question()
                .map(|q| QuestionView::project(q, settled)),
            remaining_secs: remaining_secs(round.window(), now),
            answers: AnswerView::project_all(round.answers(), true),
            keyword_guesses: AnswerView::project_all(
                round.keyword_guesses(),
                matches!(round.phase(), TilePhase::Finished),
            ),
            keyword: matches!(round.phase(), TilePhase::Finished)
                .then(|| round.keyword().to_string()),
            keyword_found_by: round.keyword_found_by(),
            scoreboard,
        }
    }
}

/// Snapshot of the speed-ranked round.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct SpeedSnapshot {
    /// Current phase.
    #[serde(flatten)]
    pub phase: SpeedPhase,
    /// Question in play, solution included once the window closes.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Index of the question in play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_index: Option<usize>,
    /// Total question count.
    pub question_count: usize,
    /// Seconds left in the active window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    /// Submissions for the current question, text withheld until the window
    /// closes so no team can crib from an earlier submission.
    pub answers: Vec<AnswerView>,
    /// Descending award schedule.
    pub schedule: Vec<i32>,
    /// Current scores.
    pub scoreboard: Vec<TeamSummary>,
}

impl SpeedSnapshot {
    fn build(round: &SpeedRound, scoreboard: Vec<TeamSummary>, now: Instant) -> Self {
        let revealed = matches!(
            round.phase(),
            SpeedPhase::QuestionClosed | SpeedPhase::Finished
        );
        Self {
            phase: round.phase(),
            question: round
                .current_question()
                .map(|q| QuestionView::project(q, revealed)),
            question_index: round.current_index(),
            question_count: round.question_count(),
            remaining_secs: remaining_secs(round.window(), now),
            answers: AnswerView::project_all(round.answers(), revealed),
            schedule: round.schedule().to_vec(),
            scoreboard,
        }
    }
}

/// One package as seen by clients.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct PackageView {
    /// Display position.
    pub index: usize,
    /// Display label, e.g. `"40-40-40"`.
    pub label: String,
    /// Team that locked this package, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub taken_by: Option<TeamId>,
    /// Number of questions inside.
    pub question_count: usize,
}

/// Snapshot of the steal/package round.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct StealSnapshot {
    /// Current phase.
    #[serde(flatten)]
    pub phase: StealPhase,
    /// Acting team for this turn.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub main_team: Option<TeamId>,
    /// All packages in display order.
    pub packages: Vec<PackageView>,
    /// Question in play, solution included once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionView>,
    /// Package/question indices in play.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<(usize, usize)>,
    /// Seconds left in the active window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remaining_secs: Option<u64>,
    /// Accepted steal presses, receipt order.
    pub presses: Vec<BuzzerPress>,
    /// Attempts recorded for the current question. Attempts here are strictly
    /// sequential and each one is announced before the next team may act, so
    /// text is disclosed as recorded.
    pub answers: Vec<AnswerView>,
    /// Teams that flagged their hope star for the current question.
    pub hope_star_flags: Vec<TeamId>,
    /// Teams whose package turn is over.
    pub served_teams: Vec<TeamId>,
    /// Current scores.
    pub scoreboard: Vec<TeamSummary>,
}

impl StealSnapshot {
    fn build(round: &StealRound, scoreboard: Vec<TeamSummary>, now: Instant) -> Self {
        let revealed = matches!(
            round.phase(),
            StealPhase::AnswerRevealed | StealPhase::Finished
        );
        Self {
            phase: round.phase(),
            main_team: round.main_team(),
            packages: round
                .packages()
                .iter()
                .enumerate()
                .map(|(index, package)| PackageView {
                    index,
                    label: package.label.clone(),
                    taken_by: package.taken_by(),
                    question_count: package.questions().len(),
                })
                .collect(),
            question: round
                .current_question()
                .map(|q| QuestionView::project(q, revealed)),
            position: round.current_position(),
            remaining_secs: remaining_secs(round.window(), now),
            presses: round.presses().to_vec(),
            answers: AnswerView::project_all(round.answers(), true),
            hope_star_flags: round.hope_star_flags().to_vec(),
            served_teams: round.served_teams().to_vec(),
            scoreboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::rounds::Question;

    fn question(points: i32) -> Question {
        Question {
            text: "question".into(),
            options: vec![],
            answer: Some("answer".into()),
            correct_index: None,
            points,
            time_limit_secs: 30,
        }
    }

    #[test]
    fn speed_submissions_stay_hidden_until_the_window_closes() {
        let mut round = SpeedRound::new(vec![question(30)], vec![30, 20, 10]).unwrap();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round
            .submit_answer(1, "alpha", "answer".into(), t0 + Duration::from_secs(2))
            .unwrap();

        let open = SpeedSnapshot::build(&round, Vec::new(), t0 + Duration::from_secs(3));
        assert_eq!(open.answers.len(), 1);
        assert!(open.answers[0].text.is_none());

        round.close_question().unwrap();
        let closed = SpeedSnapshot::build(&round, Vec::new(), t0 + Duration::from_secs(4));
        assert_eq!(closed.answers[0].text.as_deref(), Some("answer"));
    }

    #[test]
    fn wrong_keyword_guesses_stay_hidden_until_the_round_ends() {
        let mut round = TileRound::new(
            "hidden keyword".into(),
            40,
            (0..4).map(|_| question(10)).collect(),
        )
        .unwrap();
        round.guess_keyword(1, "alpha", "near miss".into()).unwrap();

        let mid_round = TileSnapshot::build(&round, Vec::new(), Instant::now());
        assert!(mid_round.keyword_guesses[0].text.is_none());
        assert!(mid_round.keyword.is_none());

        round
            .guess_keyword(2, "beta", "hidden keyword".into())
            .unwrap();
        let finished = TileSnapshot::build(&round, Vec::new(), Instant::now());
        assert_eq!(finished.keyword_guesses[0].text.as_deref(), Some("near miss"));
        assert_eq!(finished.keyword.as_deref(), Some("hidden keyword"));
    }
}
