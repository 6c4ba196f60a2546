//! Speed-ranked written round. Every team answers the same question within
//! one shared window; correct answers are ranked by submission time and paid
//! from a fixed descending award schedule. Deltas are applied in one batch
//! once the host has judged the last outstanding answer, so the ranking is
//! computed against the complete set.

use std::time::{Duration, Instant};

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    engine::{
        EngineError,
        buzzer::TeamId,
        clock::TimerWindow,
        scoring::{Judgment, speed_award},
    },
    rounds::{Question, ScoreEvent, TeamAnswer, validate_question},
};

/// Phase of the speed-ranked round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case", tag = "phase")]
pub enum SpeedPhase {
    /// Waiting for the host to open the first question.
    Idle,
    /// Window open; one submission per team accepted.
    QuestionOpen,
    /// Window closed; host judges the collected answers.
    QuestionClosed,
    /// All questions played.
    Finished,
}

/// State machine for the speed-ranked round.
#[derive(Debug, Clone)]
pub struct SpeedRound {
    questions: Vec<Question>,
    schedule: Vec<i32>,
    phase: SpeedPhase,
    current: Option<usize>,
    window: TimerWindow,
    answers: Vec<TeamAnswer>,
    scored: bool,
}

impl SpeedRound {
    /// Build the round from its frozen question list and award schedule.
    pub fn new(questions: Vec<Question>, schedule: Vec<i32>) -> Result<Self, EngineError> {
        if questions.is_empty() {
            return Err(EngineError::ValidationFailed(
                "speed round requires at least one question".into(),
            ));
        }
        if schedule.is_empty() || schedule.windows(2).any(|pair| pair[0] < pair[1]) {
            return Err(EngineError::ValidationFailed(
                "award schedule must be non-empty and descending".into(),
            ));
        }
        // Written answers are judged against the printed solution.
        for question in &questions {
            validate_question(question, true)?;
        }
        Ok(Self {
            questions,
            schedule,
            phase: SpeedPhase::Idle,
            current: None,
            window: TimerWindow::armed(Duration::ZERO),
            answers: Vec::new(),
            scored: false,
        })
    }

    /// Current phase.
    pub fn phase(&self) -> SpeedPhase {
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

    /// Answers collected for the current question.
    pub fn answers(&self) -> &[TeamAnswer] {
        &self.answers
    }

    /// The award schedule, top value first.
    pub fn schedule(&self) -> &[i32] {
        &self.schedule
    }

    /// Open the next question, or finish the round when none remain.
    ///
    /// Advancing is rejected while unjudged answers remain so no submission
    /// is ever silently discarded.
    pub fn advance(&mut self, now: Instant) -> Result<SpeedPhase, EngineError> {
        let next = match self.phase {
            SpeedPhase::Idle => 0,
            SpeedPhase::QuestionClosed => {
                if self.answers.iter().any(|a| !a.judgment.is_terminal()) {
                    return Err(EngineError::ValidationFailed(
                        "unjudged answers remain for the current question".into(),
                    ));
                }
                self.current.map_or(0, |index| index + 1)
            }
            _ => return Err(EngineError::invalid(self.phase, "advance")),
        };

        if next >= self.questions.len() {
            self.phase = SpeedPhase::Finished;
            return Ok(self.phase);
        }

        self.current = Some(next);
        self.window = TimerWindow::start(
            Duration::from_secs(self.questions[next].time_limit_secs),
            now,
        );
        self.answers.clear();
        self.scored = false;
        self.phase = SpeedPhase::QuestionOpen;
        Ok(self.phase)
    }

    /// Record one team's written answer.
    pub fn submit_answer(
        &mut self,
        team_id: TeamId,
        team_name: &str,
        text: String,
        now: Instant,
    ) -> Result<SpeedPhase, EngineError> {
        if !matches!(self.phase, SpeedPhase::QuestionOpen) {
            return Err(EngineError::invalid(self.phase, "submit-answer"));
        }
        if self.window.is_expired(now) {
            return Err(EngineError::WindowClosed("answer window has expired".into()));
        }
        if self.answers.iter().any(|a| a.team_id == team_id) {
            return Err(EngineError::DuplicateAnswer(team_id));
        }

        self.answers.push(TeamAnswer::new(
            team_id,
            team_name.to_string(),
            text,
            self.window.elapsed_ms(now).unwrap_or(0),
        ));
        Ok(self.phase)
    }

    /// Close the window, by host force-close or by an observed expiry.
    /// Idempotent at the orchestration level: a second close attempt is an
    /// [`EngineError::InvalidTransition`].
    pub fn close_question(&mut self) -> Result<SpeedPhase, EngineError> {
        if !matches!(self.phase, SpeedPhase::QuestionOpen) {
            return Err(EngineError::invalid(self.phase, "force-close"));
        }
        self.phase = SpeedPhase::QuestionClosed;
        Ok(self.phase)
    }

    /// Judge one team's answer. When the final outstanding answer receives
    /// its judgment, the correct ones are ranked by submission time and the
    /// whole question is scored in one pass.
    pub fn judge(
        &mut self,
        team_id: TeamId,
        judgment: Judgment,
    ) -> Result<(SpeedPhase, Vec<ScoreEvent>), EngineError> {
        if !matches!(self.phase, SpeedPhase::QuestionClosed) {
            return Err(EngineError::invalid(self.phase, "judge-answer"));
        }
        let answer = self
            .answers
            .iter_mut()
            .find(|a| a.team_id == team_id)
            .ok_or_else(|| EngineError::NotFound(format!("no answer from team {team_id}")))?;
        answer.judge(judgment)?;

        if self.answers.iter().any(|a| !a.judgment.is_terminal()) {
            return Ok((self.phase, Vec::new()));
        }
        Ok((self.phase, self.settle_question()?))
    }

    /// Rank correct answers by submission time and settle every record.
    fn settle_question(&mut self) -> Result<Vec<ScoreEvent>, EngineError> {
        if self.scored {
            return Err(EngineError::AlreadyJudged(0));
        }
        self.scored = true;

        let mut correct: Vec<usize> = (0..self.answers.len())
            .filter(|&i| self.answers[i].judgment == Judgment::Correct)
            .collect();
        correct.sort_by_key(|&i| self.answers[i].submitted_at_ms);

        let mut events = Vec::new();
        for (rank, &index) in correct.iter().enumerate() {
            let delta = speed_award(rank, &self.schedule);
            self.answers[index].settle(delta)?;
            if delta != 0 {
                events.push(ScoreEvent::new(
                    self.answers[index].team_id,
                    delta,
                    format!("speed rank {}", rank + 1),
                ));
            }
        }
        for answer in &mut self.answers {
            if answer.points_awarded.is_none() {
                answer.settle(0)?;
            }
        }
        Ok(events)
    }

    /// Return to the pristine idle state.
    pub fn reset(&mut self) {
        self.phase = SpeedPhase::Idle;
        self.current = None;
        self.window = TimerWindow::armed(Duration::ZERO);
        self.answers.clear();
        self.scored = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn round() -> SpeedRound {
        let questions = vec![Question {
            text: "question".into(),
            options: vec![],
            answer: Some("answer".into()),
            correct_index: None,
            points: 30,
            time_limit_secs: 30,
        }];
        SpeedRound::new(questions, vec![30, 20, 10]).unwrap()
    }

    #[test]
    fn ranking_awards_follow_submission_time() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();

        round
            .submit_answer(1, "alpha", "answer".into(), t0 + Duration::from_secs(2))
            .unwrap();
        round
            .submit_answer(2, "beta", "answer".into(), t0 + Duration::from_secs(5))
            .unwrap();
        round
            .submit_answer(3, "gamma", "answer".into(), t0 + Duration::from_secs(1))
            .unwrap();
        round
            .submit_answer(4, "delta", "nope".into(), t0 + Duration::from_secs(3))
            .unwrap();
        round.close_question().unwrap();

        round.judge(1, Judgment::Correct).unwrap();
        round.judge(2, Judgment::Correct).unwrap();
        round.judge(3, Judgment::Correct).unwrap();
        let (_, events) = round.judge(4, Judgment::Incorrect).unwrap();

        assert_eq!(
            events,
            vec![
                ScoreEvent::new(3, 30, "speed rank 1"),
                ScoreEvent::new(1, 20, "speed rank 2"),
                ScoreEvent::new(2, 10, "speed rank 3"),
            ]
        );
        let delta_for = |team: TeamId| {
            round
                .answers()
                .iter()
                .find(|a| a.team_id == team)
                .and_then(|a| a.points_awarded)
        };
        assert_eq!(delta_for(4), Some(0));
    }

    #[test]
    fn duplicate_submission_is_rejected() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round
            .submit_answer(1, "alpha", "first".into(), t0 + Duration::from_secs(1))
            .unwrap();

        let err = round
            .submit_answer(1, "alpha", "second".into(), t0 + Duration::from_secs(2))
            .unwrap_err();
        assert_eq!(err, EngineError::DuplicateAnswer(1));
        assert_eq!(round.answers().len(), 1);
    }

    #[test]
    fn re_judging_is_rejected_and_scores_stand() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round
            .submit_answer(1, "alpha", "answer".into(), t0 + Duration::from_secs(1))
            .unwrap();
        round.close_question().unwrap();
        round.judge(1, Judgment::Correct).unwrap();

        let err = round.judge(1, Judgment::Incorrect).unwrap_err();
        assert_eq!(err, EngineError::AlreadyJudged(1));
    }

    #[test]
    fn submission_after_expiry_is_window_closed() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();

        let err = round
            .submit_answer(1, "alpha", "late".into(), t0 + Duration::from_secs(31))
            .unwrap_err();
        assert!(matches!(err, EngineError::WindowClosed(_)));
    }

    #[test]
    fn advancing_with_unjudged_answers_is_rejected() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round
            .submit_answer(1, "alpha", "answer".into(), t0 + Duration::from_secs(1))
            .unwrap();
        round.close_question().unwrap();

        let err = round.advance(t0 + Duration::from_secs(40)).unwrap_err();
        assert!(matches!(err, EngineError::ValidationFailed(_)));

        round.judge(1, Judgment::Correct).unwrap();
        assert_eq!(
            round.advance(t0 + Duration::from_secs(41)).unwrap(),
            SpeedPhase::Finished
        );
    }

    #[test]
    fn double_close_is_an_invalid_transition() {
        let mut round = round();
        let t0 = Instant::now();
        round.advance(t0).unwrap();
        round.close_question().unwrap();

        let err = round.close_question().unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
    }
}
