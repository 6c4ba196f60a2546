//! Snapshot building blocks shared by the round snapshots and the public
//! read endpoints.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    engine::buzzer::TeamId,
    rounds::Question,
    state::game::Team,
};

/// Public projection of a team exposed to REST/SSE clients.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, ToSchema)]
pub struct TeamSummary {
    /// Team identifier.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Running score.
    pub score: i32,
    /// Whether the one-time hope star has been spent.
    pub hope_star_used: bool,
    /// Package selection order in the steal round, when assigned.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_order: Option<usize>,
}

impl From<&Team> for TeamSummary {
    fn from(team: &Team) -> Self {
        Self {
            id: team.id,
            name: team.name.clone(),
            score: team.score,
            hope_star_used: team.hope_star_used,
            package_order: team.package_order,
        }
    }
}

/// Projection of a question for clients. The correct answer is withheld
/// until the round reaches a reveal phase.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct QuestionView {
    /// Prompt text.
    pub text: String,
    /// Multiple-choice options, empty for free-text questions.
    pub options: Vec<String>,
    /// Point value.
    pub points: i32,
    /// Answer window duration in seconds.
    pub time_limit_secs: u64,
    /// Correct answer text, present only once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    /// Correct option index, present only once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub correct_index: Option<usize>,
}

impl QuestionView {
    /// Project a question, including its solution only when `revealed`.
    pub fn project(question: &Question, revealed: bool) -> Self {
        Self {
            text: question.text.clone(),
            options: question.options.clone(),
            points: question.points,
            time_limit_secs: question.time_limit_secs,
            answer: revealed.then(|| question.answer.clone()).flatten(),
            correct_index: if revealed { question.correct_index } else { None },
        }
    }
}
