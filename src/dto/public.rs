//! Payloads for the read-only public surface.

use serde::Serialize;
use utoipa::ToSchema;

use crate::dto::common::TeamSummary;

/// Scores for every registered team, registration order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardResponse {
    /// Competition identifier.
    pub competition_id: String,
    /// Teams with their current totals.
    pub teams: Vec<TeamSummary>,
}
