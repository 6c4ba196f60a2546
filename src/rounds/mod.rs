//! The four round state machines plus the data they share: immutable question
//! content, per-question answer records, and the score events machines emit
//! for the orchestration layer to apply.

pub mod buzz;
pub mod speed;
pub mod steal;
pub mod tile;

use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::{EngineError, buzzer::TeamId, scoring::Judgment};

/// Immutable content for one prompt. Loaded before a round begins and never
/// mutated while the round is active.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    /// Prompt shown to the teams.
    pub text: String,
    /// Optional multiple-choice options.
    pub options: Vec<String>,
    /// Expected answer text, when the round judges free text.
    pub answer: Option<String>,
    /// Index into `options` for multiple-choice questions.
    pub correct_index: Option<usize>,
    /// Points awarded for a correct answer.
    pub points: i32,
    /// Answer window duration in seconds.
    pub time_limit_secs: u64,
}

/// One team's submission for the current question.
///
/// `points_awarded` doubles as the scored-flag: it flips from `None` exactly
/// once, which is what makes judging idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct TeamAnswer {
    /// Team that submitted.
    pub team_id: TeamId,
    /// Display name captured at submission time.
    pub team_name: String,
    /// Raw answer text.
    pub text: String,
    /// Host ruling, `Unjudged` until a terminal value is assigned.
    pub judgment: Judgment,
    /// Milliseconds since the question window opened.
    pub submitted_at_ms: u64,
    /// Delta applied to the team's total, set exactly once at scoring time.
    pub points_awarded: Option<i32>,
    /// Whether this was the acting team answering its own question.
    pub is_main_team: bool,
    /// Whether the hope-star modifier was active for this answer.
    pub used_hope_star: bool,
}

impl TeamAnswer {
    /// Fresh unjudged record for a submission.
    pub fn new(team_id: TeamId, team_name: String, text: String, submitted_at_ms: u64) -> Self {
        Self {
            team_id,
            team_name,
            text,
            judgment: Judgment::Unjudged,
            submitted_at_ms,
            points_awarded: None,
            is_main_team: false,
            used_hope_star: false,
        }
    }

    /// Assign a terminal judgment, rejecting re-judgment of a settled answer.
    pub fn judge(&mut self, judgment: Judgment) -> Result<(), EngineError> {
        if self.judgment.is_terminal() {
            return Err(EngineError::AlreadyJudged(self.team_id));
        }
        if !judgment.is_terminal() {
            return Err(EngineError::ValidationFailed(
                "judgment must be correct or incorrect".into(),
            ));
        }
        self.judgment = judgment;
        Ok(())
    }

    /// Record the applied delta, rejecting a second scoring call.
    pub fn settle(&mut self, delta: i32) -> Result<(), EngineError> {
        if self.points_awarded.is_some() {
            return Err(EngineError::AlreadyJudged(self.team_id));
        }
        self.points_awarded = Some(delta);
        Ok(())
    }
}

/// Point delta produced by a machine, applied by the orchestration layer to
/// exactly one team's running total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ScoreEvent {
    /// Team whose total changes.
    pub team_id: TeamId,
    /// Signed delta; totals may go negative under the steal penalty.
    pub delta: i32,
    /// Short label describing where the delta came from.
    pub reason: String,
}

impl ScoreEvent {
    /// Build a score event, skipping the allocation ceremony at call sites.
    pub fn new(team_id: TeamId, delta: i32, reason: impl Into<String>) -> Self {
        Self {
            team_id,
            delta,
            reason: reason.into(),
        }
    }
}

/// Validate that a question carries the fields a round's judging rules need.
pub fn validate_question(question: &Question, needs_answer_text: bool) -> Result<(), EngineError> {
    if question.text.trim().is_empty() {
        return Err(EngineError::ValidationFailed(
            "question text must not be empty".into(),
        ));
    }
    if question.points <= 0 {
        return Err(EngineError::ValidationFailed(
            "question point value must be strictly positive".into(),
        ));
    }
    if let Some(index) = question.correct_index {
        if index >= question.options.len() {
            return Err(EngineError::ValidationFailed(format!(
                "correct index {index} is out of range for {} options",
                question.options.len()
            )));
        }
    }
    if needs_answer_text && question.answer.as_deref().map_or(true, |a| a.trim().is_empty()) {
        return Err(EngineError::ValidationFailed(
            "question must carry an answer text".into(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> Question {
        Question {
            text: "capital of norway?".into(),
            options: vec![],
            answer: Some("oslo".into()),
            correct_index: None,
            points: 10,
            time_limit_secs: 15,
        }
    }

    #[test]
    fn judging_twice_is_rejected() {
        let mut answer = TeamAnswer::new(1, "alpha".into(), "oslo".into(), 1200);
        answer.judge(Judgment::Correct).unwrap();

        let err = answer.judge(Judgment::Incorrect).unwrap_err();
        assert_eq!(err, EngineError::AlreadyJudged(1));
        assert_eq!(answer.judgment, Judgment::Correct);
    }

    #[test]
    fn settling_twice_is_rejected() {
        let mut answer = TeamAnswer::new(2, "beta".into(), "oslo".into(), 800);
        answer.settle(10).unwrap();

        assert_eq!(answer.settle(10).unwrap_err(), EngineError::AlreadyJudged(2));
        assert_eq!(answer.points_awarded, Some(10));
    }

    #[test]
    fn unjudged_is_not_a_terminal_ruling() {
        let mut answer = TeamAnswer::new(3, "gamma".into(), "oslo".into(), 0);
        assert!(answer.judge(Judgment::Unjudged).is_err());
    }

    #[test]
    fn question_validation_catches_missing_fields() {
        assert!(validate_question(&question(), true).is_ok());

        let mut missing_answer = question();
        missing_answer.answer = None;
        assert!(validate_question(&missing_answer, true).is_err());
        assert!(validate_question(&missing_answer, false).is_ok());

        let mut bad_index = question();
        bad_index.options = vec!["a".into(), "b".into()];
        bad_index.correct_index = Some(2);
        assert!(validate_question(&bad_index, false).is_err());
    }
}
