//! Open-ended buzz round. The host opens a question, every team races on the
//! buzzer, the fastest press wins the right to answer aloud, and the host
//! judges. A wrong answer reopens the question for the remaining teams; the
//! press sequence survives the reopen so a team only ever gets one press per
//! question.

use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    engine::{
        EngineError,
        buzzer::{BuzzerPress, BuzzerRace, TeamId},
        clock::TimerWindow,
        scoring::{Judgment, standard_delta},
    },
    rounds::{Question, ScoreEvent, TeamAnswer, validate_question},
};

/// Phase of the open-ended buzz round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum BuzzPhase {
    /// Waiting for the host to open the first question.
    Idle,
    /// Buzzers armed, clock running.
    QuestionOpen,
    /// A team won the race and is answering aloud.
    Buzzed {
        /// Team that holds the floor.
        team_id: TeamId,
    },
    /// Question settled; answer shown.
    Revealed,
    /// All questions played.
    Finished,
}

/// State machine for the open-ended buzz round.
#[derive(Debug, Clone)]
pub struct BuzzRound {
    questions: Vec<Question>,
    phase: BuzzPhase,
    current: Option<usize>,
    window: TimerWindow,
    race: BuzzerRace,
    answers: Vec<TeamAnswer>,
}

impl BuzzRound {
    /// Build the round from its frozen question list.
    pub fn new(questions: Vec<Question>) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::ValidationFailed(
                "buzz round requires at least one question".into(),
            ));
        }
        // Answers are spoken here, so the printed solution is optional.
        for question in &questions {
            validate_question(question, false)?;
        }
        Ok(Self {
            questions,
            phase: BuzzPhase::Idle,
            current: None,
            window: TimerWindow::armed(Duration::ZERO),
            race: BuzzerRace::new(),
            answers: Vec::new(),
        })
    }

    /// Current phase.
    pub fn phase(&self) -> BuzzPhase {
        self.phase
    }

    /// Question currently in play.
    pub fn current_question(&self) -> Option<&Question> {
        self.current.and_then(|index| self.questions.get(index))
    }

    /// Index of the question currently in play.
    pub fn current_index(&self) -> Option<usize> {
        self.current
    }

    /// Total number of questions in the round.
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    /// The active timer window.
    pub fn window(&self) -> &TimerWindow {
        &self.window
    }

    /// Presses recorded for the current question.
    pub fn presses(&self) -> &[BuzzerPress] {
        self.race.presses()
    }

    /// Judged and pending answers for the current question.
    pub fn answers(&self) -> &[TeamAnswer] {
        &self.answers
    }

    /// Open the next question, or finish the round when none remain.
    pub fn advance(&mut self, now: Instant) -> Result<BuzzPhase, EngineError> {
        let next = match self.phase {
            BuzzPhase::Idle => 0,
            BuzzPhase::Revealed => self.current.map_or(0, |index| index + 1),
            _ => return Err(EngineError::invalid(self.phase, "advance")),
        };

        if next >= self.questions.len() {
            self.phase = BuzzPhase::Finished;
            return Ok(self.phase);
        }

        self.current = Some(next);
        self.window = TimerWindow::start(
            Duration::from_secs(self.questions[next].time_limit_secs),
            now,
        );
        self.race.clear();
        self.answers.clear();
        self.phase = BuzzPhase::QuestionOpen;
        Ok(self.phase)
    }

    /// Record a buzzer press; the first accepted press takes the floor.
    pub fn press(
        &mut self,
        team_id: TeamId,
        team_name: &str,
        now: Instant,
    ) -> Result<BuzzPhase, EngineError> {
        if !matches!(self.phase, BuzzPhase::QuestionOpen) {
            return Err(EngineError::invalid(self.phase, "press-buzzer"));
        }
        if self.window.is_expired(now) {
            return Err(EngineError::WindowClosed("buzz window has expired".into()));
        }

        let at_ms = self.window.elapsed_ms(now).unwrap_or(0);
        self.race.record(BuzzerPress {
            team_id,
            team_name: team_name.to_string(),
            at_ms,
        })?;

        // The race is resolved as presses arrive: with the authority
        // serializing commands, receipt order is the tie-break order. A team
        // already judged on this question keeps its press in the log (blocking
        // a re-press) but is no longer eligible for the floor.
        let floor = self
            .race
            .ranking()
            .into_iter()
            .find(|press| !self.answers.iter().any(|a| a.team_id == press.team_id))
            .map(|press| press.team_id)
            .ok_or_else(|| EngineError::ValidationFailed("press sequence is empty".into()))?;
        self.phase = BuzzPhase::Buzzed { team_id: floor };
        Ok(self.phase)
    }

    /// Judge the team currently holding the floor. A wrong answer reopens the
    /// question for the teams that have not pressed yet.
    pub fn judge(
        &mut self,
        judgment: Judgment,
        now: Instant,
    ) -> Result<(BuzzPhase, Vec<ScoreEvent>), EngineError> {
        let BuzzPhase::Buzzed { team_id } = self.phase else {
            return Err(EngineError::invalid(self.phase, "judge-answer"));
        };
        let question = self
            .current_question()
            .ok_or_else(|| EngineError::NotFound("no active question".into()))?;
        let points = question.points;

        let team_name = self
            .race
            .presses()
            .iter()
            .find(|press| press.team_id == team_id)
            .map(|press| press.team_name.clone())
            .unwrap_or_default();

        let mut answer = TeamAnswer::new(
            team_id,
            team_name,
            String::new(),
            self.window.elapsed_ms(now).unwrap_or(0),
        );
        answer.judge(judgment)?;
        let delta = standard_delta(judgment, points);
        answer.settle(delta)?;
        self.answers.push(answer);

        let mut events = Vec::new();
        if delta != 0 {
            events.push(ScoreEvent::new(team_id, delta, "buzz round answer"));
        }

        self.phase = match judgment {
            Judgment::Correct => BuzzPhase::Revealed,
            _ => {
                if self.window.is_expired(now) {
                    BuzzPhase::Revealed
                } else {
                    BuzzPhase::QuestionOpen
                }
            }
        };
        Ok((self.phase, events))
    }

    /// Host closes the question without a winner (time up or give-up).
    pub fn force_close(&mut self) -> Result<BuzzPhase, EngineError> {
        match self.phase {
            BuzzPhase::QuestionOpen | BuzzPhase::Buzzed { .. } => {
                self.phase = BuzzPhase::Revealed;
                Ok(self.phase)
            }
            _ => Err(EngineError::invalid(self.phase, "force-close")),
        }
    }

    /// Return to the pristine idle state, clearing presses and answers.
    pub fn reset(&mut self) {
        self.phase = BuzzPhase::Idle;
        self.current = None;
        self.window = TimerWindow::armed(Duration::ZERO);
        self.race.clear();
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> BuzzRound {
        let questions = (0..2)
            .map(|i| Question {
                text: format!("question {i}"),
                options: vec![],
                answer: Some(format!("answer {i}")),
                correct_index: None,
                points: 10,
                time_limit_secs: 15,
            })
            .collect();
        BuzzRound::new(questions).unwrap()
    }

    #[test]
    fn fastest_press_takes_the_floor() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();

        let phase = round.press(1, "alpha", t0 + Duration::from_millis(300)).unwrap();
        assert_eq!(phase, BuzzPhase::Buzzed { team_id: 1 });
    }

    #[test]
    fn correct_answer_scores_and_reveals() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round.press(1, "alpha", t0 + Duration::from_millis(300)).unwrap();

        let (phase, events) = round
            .judge(Judgment::Correct, t0 + Duration::from_secs(5))
            .unwrap();
        assert_eq!(phase, BuzzPhase::Revealed);
        assert_eq!(events, vec![ScoreEvent::new(1, 10, "buzz round answer")]);
    }

    #[test]
    fn wrong_answer_reopens_but_blocks_a_second_press() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round.press(1, "alpha", t0 + Duration::from_millis(300)).unwrap();

        let (phase, events) = round
            .judge(Judgment::Incorrect, t0 + Duration::from_secs(3))
            .unwrap();
        assert_eq!(phase, BuzzPhase::QuestionOpen);
        assert!(events.is_empty());

        // Same team may not race again on this question.
        let err = round
            .press(1, "alpha", t0 + Duration::from_secs(4))
            .unwrap_err();
        assert_eq!(err, EngineError::DuplicatePress(1));

        // Another team still can, and takes the floor even though the judged
        // team's press sits earlier in the race log.
        let phase = round.press(2, "beta", t0 + Duration::from_secs(5)).unwrap();
        assert_eq!(phase, BuzzPhase::Buzzed { team_id: 2 });

        // The same holds on a second reopen.
        let (phase, _) = round
            .judge(Judgment::Incorrect, t0 + Duration::from_secs(6))
            .unwrap();
        assert_eq!(phase, BuzzPhase::QuestionOpen);
        let phase = round.press(3, "gamma", t0 + Duration::from_secs(7)).unwrap();
        assert_eq!(phase, BuzzPhase::Buzzed { team_id: 3 });
    }

    #[test]
    fn press_after_expiry_is_window_closed() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();

        let err = round
            .press(1, "alpha", t0 + Duration::from_secs(16))
            .unwrap_err();
        assert!(matches!(err, EngineError::WindowClosed(_)));
        assert_eq!(round.phase(), BuzzPhase::QuestionOpen);
    }

    #[test]
    fn round_finishes_after_last_question() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round.force_close().unwrap();
        round.advance(t0).unwrap();
        round.force_close().unwrap();

        assert_eq!(round.advance(t0).unwrap(), BuzzPhase::Finished);
        let err = round.press(1, "alpha", t0).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }

    #[test]
    fn idle_round_rejects_judging() {
        let mut round = round();
        let err = round.judge(Judgment::Correct, Instant::now()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }
}
