//! Request payloads for the team-facing play surface.

use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

use crate::engine::buzzer::TeamId;

/// Buzzer press from a team console or the HTTP fallback.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PressBuzzerRequest {
    /// Pressing team.
    pub team_id: TeamId,
}

/// Written answer submission.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct SubmitAnswerRequest {
    /// Submitting team.
    pub team_id: TeamId,
    /// Answer text.
    #[validate(length(min = 1, max = 512))]
    pub text: String,
}

/// Tile pick in the tile/keyword round.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SelectTileRequest {
    /// Selecting team.
    pub team_id: TeamId,
    /// Board position of the tile.
    pub tile: usize,
}

/// Keyword guess in the tile/keyword round.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct KeywordGuessRequest {
    /// Guessing team.
    pub team_id: TeamId,
    /// Guess text, compared after normalization.
    #[validate(length(min = 1, max = 128))]
    pub text: String,
}

/// Hope-star flag for the upcoming steal-round question.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct HopeStarRequest {
    /// Flagging team.
    pub team_id: TeamId,
}
