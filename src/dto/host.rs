//! Request and response payloads for the host control surface.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    engine::buzzer::TeamId,
    state::game::RoundKind,
    dto::{common::TeamSummary, validation},
};

/// Payload creating a competition with its full round programme.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateCompetitionRequest {
    /// Display name of the competition.
    #[validate(length(min = 1, max = 128))]
    pub name: String,
    /// Competing teams, registration order preserved.
    #[validate(length(min = 2, max = 8), nested)]
    pub teams: Vec<TeamInput>,
    /// Open-ended buzz round programme.
    #[validate(nested)]
    pub buzz: BuzzRoundInput,
    /// Tile/keyword round programme.
    #[validate(nested)]
    pub tile: TileRoundInput,
    /// Speed-ranked round programme.
    #[validate(nested)]
    pub speed: SpeedRoundInput,
    /// Steal/package round programme.
    #[validate(nested)]
    pub steal: StealRoundInput,
}

/// One team at registration time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct TeamInput {
    /// Display name, unique within the competition.
    #[validate(length(min = 1, max = 64))]
    pub name: String,
}

/// One question at registration time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct QuestionInput {
    /// Prompt shown to teams.
    #[validate(length(min = 1))]
    pub text: String,
    /// Multiple-choice options, empty for open-ended prompts.
    #[serde(default)]
    pub options: Vec<String>,
    /// Expected answer text, shown at reveal.
    #[serde(default)]
    pub answer: Option<String>,
    /// Index into `options` of the correct choice.
    #[serde(default)]
    pub correct_index: Option<usize>,
    /// Point value.
    #[validate(range(min = 1))]
    pub points: i32,
    /// Answer window in seconds.
    #[validate(range(min = 1, max = 600))]
    pub time_limit_secs: u64,
}

/// Programme of the open-ended buzz round.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct BuzzRoundInput {
    /// Questions in play order.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Programme of the tile/keyword round.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct TileRoundInput {
    /// Keyword hidden behind the board.
    #[validate(custom(function = "validation::non_blank_keyword"))]
    pub keyword: String,
    /// Bonus awarded for finding the keyword. Falls back to the configured
    /// default when omitted.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub keyword_bonus: Option<i32>,
    /// Exactly one question per tile.
    #[validate(length(min = 4, max = 4), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Programme of the speed-ranked round.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SpeedRoundInput {
    /// Questions in play order.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
    /// Descending award schedule, e.g. `[30, 20, 10]`. Falls back to the
    /// configured default when omitted.
    #[serde(default)]
    #[validate(custom(function = "validation::descending_schedule"))]
    pub schedule: Option<Vec<i32>>,
}

/// One package at registration time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct PackageInput {
    /// Display label, e.g. `"40-40-40"`.
    #[validate(length(min = 1, max = 32))]
    pub label: String,
    /// Questions in play order.
    #[validate(length(min = 1), nested)]
    pub questions: Vec<QuestionInput>,
}

/// Programme of the steal/package round.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct StealRoundInput {
    /// One package per team.
    #[validate(length(min = 2, max = 8), nested)]
    pub packages: Vec<PackageInput>,
}

/// Judgment entered by the host for a pending answer.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct JudgeAnswerRequest {
    /// Team whose answer is judged. Omitted where the phase implies it.
    #[serde(default)]
    pub team_id: Option<TeamId>,
    /// Whether the answer is accepted.
    pub correct: bool,
}

/// Host pick of the acting team for a steal-round turn.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct AssignTeamRequest {
    /// Team that plays the next package.
    pub team_id: TeamId,
}

/// Host confirmation of the acting team's package choice.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SelectPackageRequest {
    /// Index of the chosen package.
    pub package: usize,
}

/// Competition identity plus roster, returned on creation and lookup.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompetitionSummary {
    /// Competition identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Registered teams in order.
    pub teams: Vec<TeamSummary>,
    /// Round formats in play order.
    pub rounds: Vec<RoundKind>,
    /// Creation time, RFC 3339.
    pub created_at: String,
    /// Last mutation time, RFC 3339.
    pub updated_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question() -> QuestionInput {
        QuestionInput {
            text: "question".into(),
            options: vec![],
            answer: Some("answer".into()),
            correct_index: None,
            points: 10,
            time_limit_secs: 15,
        }
    }

    fn request(team_count: usize) -> CreateCompetitionRequest {
        CreateCompetitionRequest {
            name: "finals".into(),
            teams: (0..team_count)
                .map(|i| TeamInput {
                    name: format!("team {i}"),
                })
                .collect(),
            buzz: BuzzRoundInput {
                questions: vec![question()],
            },
            tile: TileRoundInput {
                keyword: "hidden keyword".into(),
                keyword_bonus: None,
                questions: (0..4).map(|_| question()).collect(),
            },
            speed: SpeedRoundInput {
                questions: vec![question()],
                schedule: None,
            },
            steal: StealRoundInput {
                packages: (0..team_count)
                    .map(|i| PackageInput {
                        label: format!("package {i}"),
                        questions: vec![question()],
                    })
                    .collect(),
            },
        }
    }

    #[test]
    fn well_formed_programme_passes_validation() {
        request(3).validate().unwrap();
    }

    #[test]
    fn roster_length_bounds_are_enforced() {
        assert!(request(1).validate().is_err());
        assert!(request(9).validate().is_err());
    }

    #[test]
    fn nested_question_errors_surface_through_validate() {
        let mut bad = request(2);
        bad.buzz.questions[0].text.clear();
        assert!(bad.validate().is_err());

        let mut short_board = request(2);
        short_board.tile.questions.pop();
        assert!(short_board.validate().is_err());
    }
}
