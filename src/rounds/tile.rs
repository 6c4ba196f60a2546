//! Tile/keyword round. Four hidden tiles each guard one question; a team
//! selects a tile, answers within the window, and the host confirms. At any
//! point before the tiles are exhausted, any team may instead bet on the
//! hidden keyword; a correct normalized guess ends the round with a fixed
//! bonus.

use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    engine::{
        EngineError,
        buzzer::TeamId,
        clock::TimerWindow,
        normalize::keyword_matches,
        scoring::{Judgment, standard_delta},
    },
    rounds::{Question, ScoreEvent, TeamAnswer, validate_question},
};

/// Number of tiles guarding the keyword.
pub const TILE_COUNT: usize = 4;

/// Phase of the tile/keyword round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum TilePhase {
    /// Waiting for a team to pick a tile.
    Idle,
    /// A tile has been picked; the host has not opened its question yet.
    TileSelected {
        /// Team that picked.
        team_id: TeamId,
        /// Picked tile index.
        tile: usize,
    },
    /// The tile's question is open for the selecting team only.
    QuestionOpen {
        /// Team allowed to answer.
        team_id: TeamId,
        /// Tile in play.
        tile: usize,
    },
    /// Submission received, waiting for the host's confirmation.
    WaitingConfirmation {
        /// Team that answered.
        team_id: TeamId,
        /// Tile in play.
        tile: usize,
    },
    /// The tile's question has been settled.
    Answered {
        /// Tile that was settled.
        tile: usize,
        /// Whether the answer was accepted.
        correct: bool,
    },
    /// Keyword found or tiles exhausted.
    Finished,
}

/// One tile and its lifecycle flags.
#[derive(Debug, Clone)]
pub struct Tile {
    question: Question,
    /// Settled tiles can no longer be selected, whichever way they went.
    exhausted: bool,
    /// Correctly answered tiles uncover their part of the image.
    revealed: bool,
}

impl Tile {
    /// The question guarded by this tile.
    pub fn question(&self) -> &Question {
        &self.question
    }

    /// Whether this tile can still be selected.
    pub fn is_open(&self) -> bool {
        !self.exhausted
    }

    /// Whether this tile's image part is uncovered.
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

/// State machine for the tile/keyword round.
#[derive(Debug, Clone)]
pub struct TileRound {
    keyword: String,
    keyword_bonus: i32,
    tiles: Vec<Tile>,
    phase: TilePhase,
    window: TimerWindow,
    answers: Vec<TeamAnswer>,
    keyword_guesses: Vec<TeamAnswer>,
    keyword_found_by: Option<TeamId>,
}

impl TileRound {
    /// Build the round from the hidden keyword, its bonus value, and exactly
    /// [`TILE_COUNT`] questions.
    pub fn new(
        keyword: String,
        keyword_bonus: i32,
        questions: Vec<Question>,
    ) -> Result<Self, EngineError> {
        if keyword.trim().is_empty() {
            return Err(EngineError::ValidationFailed(
                "keyword must not be empty".into(),
            ));
        }
        if keyword_bonus <= 0 {
            return Err(EngineError::ValidationFailed(
                "keyword bonus must be strictly positive".into(),
            ));
        }
        if questions.len() != TILE_COUNT {
            return Err(EngineError::ValidationFailed(format!(
                "tile round requires exactly {TILE_COUNT} questions, got {}",
                questions.len()
            )));
        }
        // The printed solution is shown when a tile settles.
        for question in &questions {
            validate_question(question, true)?;
        }
        Ok(Self {
            keyword,
            keyword_bonus,
            tiles: questions
                .into_iter()
                .map(|question| Tile {
                    question,
                    exhausted: false,
                    revealed: false,
                })
                .collect(),
            phase: TilePhase::Idle,
            window: TimerWindow::armed(Duration::ZERO),
            answers: Vec::new(),
            keyword_guesses: Vec::new(),
            keyword_found_by: None,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> TilePhase {
        self.phase
    }

    /// All tiles in board order.
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    /// The active timer window.
    pub fn window(&self) -> &TimerWindow {
        &self.window
    }

    /// Tile answers recorded during the round.
    pub fn answers(&self) -> &[TeamAnswer] {
        &self.answers
    }

    /// Keyword guesses recorded during the round.
    pub fn keyword_guesses(&self) -> &[TeamAnswer] {
        &self.keyword_guesses
    }

    /// Team that found the keyword, if any.
    pub fn keyword_found_by(&self) -> Option<TeamId> {
        self.keyword_found_by
    }

    /// The hidden keyword; only exposed to snapshots once the round is over.
    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// The question behind the tile currently in play.
    pub fn current_question(&self) -> Option<&Question> {
        let tile = match self.phase {
            TilePhase::TileSelected { tile, .. }
            | TilePhase::QuestionOpen { tile, .. }
            | TilePhase::WaitingConfirmation { tile, .. } => tile,
            _ => return None,
        };
        self.tiles.get(tile).map(Tile::question)
    }

    /// A team claims a still-hidden tile.
    pub fn select_tile(&mut self, team_id: TeamId, tile: usize) -> Result<TilePhase, EngineError> {
        if !matches!(self.phase, TilePhase::Idle) {
            return Err(EngineError::invalid(self.phase, "select-tile"));
        }
        let entry = self
            .tiles
            .get(tile)
            .ok_or_else(|| EngineError::NotFound(format!("tile {tile} does not exist")))?;
        if !entry.is_open() {
            return Err(EngineError::ValidationFailed(format!(
                "tile {tile} has already been played"
            )));
        }
        self.phase = TilePhase::TileSelected { team_id, tile };
        Ok(self.phase)
    }

    /// Host opens the selected tile's question and starts its clock.
    pub fn open_question(&mut self, now: Instant) -> Result<TilePhase, EngineError> {
        let TilePhase::TileSelected { team_id, tile } = self.phase else {
            return Err(EngineError::invalid(self.phase, "open-question"));
        };
        let duration = Duration::from_secs(self.tiles[tile].question.time_limit_secs);
        self.window = TimerWindow::start(duration, now);
        self.phase = TilePhase::QuestionOpen { team_id, tile };
        Ok(self.phase)
    }

    /// The selecting team submits its answer within the window.
    pub fn submit_answer(
        &mut self,
        team_id: TeamId,
        team_name: &str,
        text: String,
        now: Instant,
    ) -> Result<TilePhase, EngineError> {
        let TilePhase::QuestionOpen {
            team_id: selector,
            tile,
        } = self.phase
        else {
            return Err(EngineError::invalid(self.phase, "submit-answer"));
        };
        if team_id != selector {
            return Err(EngineError::ValidationFailed(format!(
                "only team {selector} may answer the selected tile"
            )));
        }
        if self.window.is_expired(now) {
            return Err(EngineError::WindowClosed("answer window has expired".into()));
        }

        self.answers.push(TeamAnswer::new(
            team_id,
            team_name.to_string(),
            text,
            self.window.elapsed_ms(now).unwrap_or(0),
        ));
        self.phase = TilePhase::WaitingConfirmation { team_id, tile };
        Ok(self.phase)
    }

    /// Host confirms or rejects the pending answer. Either way the tile is
    /// spent; only a confirmed tile is uncovered.
    pub fn judge(&mut self, judgment: Judgment) -> Result<(TilePhase, Vec<ScoreEvent>), EngineError> {
        let TilePhase::WaitingConfirmation { team_id, tile } = self.phase else {
            return Err(EngineError::invalid(self.phase, "judge-answer"));
        };
        let answer = self
            .answers
            .iter_mut()
            .rev()
            .find(|a| a.team_id == team_id && !a.judgment.is_terminal())
            .ok_or_else(|| EngineError::NotFound("no pending answer".into()))?;
        answer.judge(judgment)?;
        let delta = standard_delta(judgment, self.tiles[tile].question.points);
        answer.settle(delta)?;

        let correct = judgment == Judgment::Correct;
        self.tiles[tile].exhausted = true;
        self.tiles[tile].revealed = correct;
        self.phase = TilePhase::Answered { tile, correct };

        let mut events = Vec::new();
        if delta != 0 {
            events.push(ScoreEvent::new(team_id, delta, format!("tile {tile} answer")));
        }
        Ok((self.phase, events))
    }

    /// Host closes an expired or abandoned question; the tile is spent with
    /// no reveal and no score change.
    pub fn force_close(&mut self) -> Result<TilePhase, EngineError> {
        let tile = match self.phase {
            TilePhase::QuestionOpen { tile, .. } | TilePhase::WaitingConfirmation { tile, .. } => {
                tile
            }
            _ => return Err(EngineError::invalid(self.phase, "force-close")),
        };
        self.tiles[tile].exhausted = true;
        self.phase = TilePhase::Answered {
            tile,
            correct: false,
        };
        Ok(self.phase)
    }

    /// Back to tile selection, or finish when every tile is spent.
    pub fn advance(&mut self) -> Result<TilePhase, EngineError> {
        if !matches!(self.phase, TilePhase::Answered { .. }) {
            return Err(EngineError::invalid(self.phase, "advance"));
        }
        self.phase = if self.tiles.iter().any(Tile::is_open) {
            TilePhase::Idle
        } else {
            TilePhase::Finished
        };
        Ok(self.phase)
    }

    /// Any team bets on the hidden keyword. One guess per team per round; a
    /// correct guess ends the round immediately and awards the bonus.
    pub fn guess_keyword(
        &mut self,
        team_id: TeamId,
        team_name: &str,
        guess: String,
    ) -> Result<(TilePhase, Vec<ScoreEvent>), EngineError> {
        if matches!(self.phase, TilePhase::Finished) {
            return Err(EngineError::invalid(self.phase, "guess-keyword"));
        }
        if self.keyword_guesses.iter().any(|g| g.team_id == team_id) {
            return Err(EngineError::DuplicateAnswer(team_id));
        }

        let correct = keyword_matches(&self.keyword, &guess);
        let mut record = TeamAnswer::new(team_id, team_name.to_string(), guess, 0);
        record.judge(if correct {
            Judgment::Correct
        } else {
            Judgment::Incorrect
        })?;
        let delta = if correct { self.keyword_bonus } else { 0 };
        record.settle(delta)?;
        self.keyword_guesses.push(record);

        let mut events = Vec::new();
        if correct {
            self.keyword_found_by = Some(team_id);
            self.phase = TilePhase::Finished;
            events.push(ScoreEvent::new(team_id, delta, "keyword found"));
        }
        Ok((self.phase, events))
    }

    /// Return to the pristine idle state with every tile hidden again.
    pub fn reset(&mut self) {
        for tile in &mut self.tiles {
            tile.exhausted = false;
            tile.revealed = false;
        }
        self.phase = TilePhase::Idle;
        self.window = TimerWindow::armed(Duration::ZERO);
        self.answers.clear();
        self.keyword_guesses.clear();
        self.keyword_found_by = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> TileRound {
        let questions = (0..TILE_COUNT)
            .map(|i| Question {
                text: format!("question {i}"),
                options: vec![],
                answer: Some(format!("answer {i}")),
                correct_index: None,
                points: 10,
                time_limit_secs: 20,
            })
            .collect();
        TileRound::new("PVOIL Vung Ang".into(), 40, questions).unwrap()
    }

    #[test]
    fn tile_happy_path_scores_and_reveals() {
        let mut round = round();
        let t0 = Instant::now();

        round.select_tile(1, 2).unwrap();
        round.open_question(t0).unwrap();
        round
            .submit_answer(1, "alpha", "answer 2".into(), t0 + Duration::from_secs(5))
            .unwrap();
        let (phase, events) = round.judge(Judgment::Correct).unwrap();

        assert_eq!(phase, TilePhase::Answered { tile: 2, correct: true });
        assert_eq!(events, vec![ScoreEvent::new(1, 10, "tile 2 answer")]);
        assert!(round.tiles()[2].is_revealed());
        assert_eq!(round.advance().unwrap(), TilePhase::Idle);
    }

    #[test]
    fn spent_tile_cannot_be_selected_again() {
        let mut round = round();
        let t0 = Instant::now();
        round.select_tile(1, 0).unwrap();
        round.open_question(t0).unwrap();
        round.force_close().unwrap();
        round.advance().unwrap();

        let err = round.select_tile(2, 0).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(_)));
        assert!(round.select_tile(2, 1).is_ok());
    }

    #[test]
    fn only_the_selecting_team_may_answer() {
        let mut round = round();
        let t0 = Instant::now();
        round.select_tile(1, 0).unwrap();
        round.open_question(t0).unwrap();

        let err = round
            .submit_answer(2, "beta", "answer 0".into(), t0 + Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(_)));
    }

    #[test]
    fn late_submission_is_window_closed() {
        let mut round = round();
        let t0 = Instant::now();
        round.select_tile(1, 0).unwrap();
        round.open_question(t0).unwrap();

        let err = round
            .submit_answer(1, "alpha", "answer 0".into(), t0 + Duration::from_secs(21))
            .unwrap_err();
        assert!(matches!(err, EngineError::WindowClosed(_)));
    }

    #[test]
    fn keyword_guess_is_normalization_insensitive() {
        let mut round = round();
        let (phase, events) = round
            .guess_keyword(3, "gamma", "pvoil   vung-ang!".into())
            .unwrap();

        assert_eq!(phase, TilePhase::Finished);
        assert_eq!(events, vec![ScoreEvent::new(3, 40, "keyword found")]);
        assert_eq!(round.keyword_found_by(), Some(3));
    }

    #[test]
    fn wrong_keyword_guess_burns_the_teams_only_try() {
        let mut round = round();
        let (phase, events) = round.guess_keyword(3, "gamma", "wrong".into()).unwrap();
        assert_eq!(phase, TilePhase::Idle);
        assert!(events.is_empty());

        let err = round.guess_keyword(3, "gamma", "pvoil vung ang".into()).unwrap_err();
        assert_eq!(err, EngineError::DuplicateAnswer(3));

        // Another team can still win the keyword.
        let (phase, _) = round.guess_keyword(4, "delta", "PVOIL Vung Ang".into()).unwrap();
        assert_eq!(phase, TilePhase::Finished);
    }

    #[test]
    fn exhausting_all_tiles_finishes_the_round() {
        let mut round = round();
        let t0 = Instant::now();
        for tile in 0..TILE_COUNT {
            round.select_tile(1, tile).unwrap();
            round.open_question(t0).unwrap();
            round.force_close().unwrap();
            let phase = round.advance().unwrap();
            if tile + 1 == TILE_COUNT {
                assert_eq!(phase, TilePhase::Finished);
            } else {
                assert_eq!(phase, TilePhase::Idle);
            }
        }

        let err = round.guess_keyword(1, "alpha", "anything".into()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }
}
