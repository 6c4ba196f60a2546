//! Runtime domain state for one competition: the team roster and the four
//! round engines. Owned exclusively by [`crate::state::AppState`]; everything
//! outside the orchestration layer only ever sees read-only snapshots.

use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    engine::{EngineError, buzzer::TeamId},
    rounds::{
        ScoreEvent,
        buzz::{BuzzPhase, BuzzRound},
        speed::{SpeedPhase, SpeedRound},
        steal::{StealPhase, StealRound},
        tile::{TilePhase, TileRound},
    },
};

/// Identifies one of the four round formats; doubles as the round id in the
/// command API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoundKind {
    /// Open-ended buzz round.
    Buzz,
    /// Image-reveal tile/keyword round.
    Tile,
    /// Speed-ranked written round.
    Speed,
    /// Package-based steal round.
    Steal,
}

impl std::fmt::Display for RoundKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            RoundKind::Buzz => "buzz",
            RoundKind::Tile => "tile",
            RoundKind::Speed => "speed",
            RoundKind::Steal => "steal",
        };
        f.write_str(label)
    }
}

/// A participating team and its competition-wide flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Team {
    /// Identifier unique within the competition.
    pub id: TeamId,
    /// Display name.
    pub name: String,
    /// Running total; may go negative under the steal penalty.
    pub score: i32,
    /// Whether the one-time hope star has been spent.
    pub hope_star_used: bool,
    /// Order in which this team selected its package, when it has.
    pub package_order: Option<usize>,
}

impl Team {
    /// Fresh team with a zeroed score and an unspent hope star.
    pub fn new(id: TeamId, name: String) -> Self {
        Self {
            id,
            name,
            score: 0,
            hope_star_used: false,
            package_order: None,
        }
    }
}

/// One of the four round state machines, tagged by its format.
#[derive(Debug, Clone)]
pub enum RoundEngine {
    /// Open-ended buzz round machine.
    Buzz(BuzzRound),
    /// Tile/keyword round machine.
    Tile(TileRound),
    /// Speed-ranked round machine.
    Speed(SpeedRound),
    /// Steal/package round machine.
    Steal(StealRound),
}

impl RoundEngine {
    /// Format tag of this engine.
    pub fn kind(&self) -> RoundKind {
        match self {
            RoundEngine::Buzz(_) => RoundKind::Buzz,
            RoundEngine::Tile(_) => RoundKind::Tile,
            RoundEngine::Speed(_) => RoundKind::Speed,
            RoundEngine::Steal(_) => RoundKind::Steal,
        }
    }

    /// Whether the round has not started or has fully finished, i.e. the
    /// competition may be replaced without losing live play.
    pub fn is_quiescent(&self) -> bool {
        match self {
            RoundEngine::Buzz(r) => {
                matches!(r.phase(), BuzzPhase::Idle | BuzzPhase::Finished)
            }
            RoundEngine::Tile(r) => {
                matches!(r.phase(), TilePhase::Idle | TilePhase::Finished)
            }
            RoundEngine::Speed(r) => {
                matches!(r.phase(), SpeedPhase::Idle | SpeedPhase::Finished)
            }
            RoundEngine::Steal(r) => {
                matches!(r.phase(), StealPhase::Idle | StealPhase::Finished)
            }
        }
    }

    /// Drop all round progress back to the idle phase.
    pub fn reset(&mut self) {
        match self {
            RoundEngine::Buzz(r) => r.reset(),
            RoundEngine::Tile(r) => r.reset(),
            RoundEngine::Speed(r) => r.reset(),
            RoundEngine::Steal(r) => r.reset(),
        }
    }
}

/// Aggregated state for one competition.
#[derive(Debug, Clone)]
pub struct Competition {
    /// Primary identifier of the competition.
    pub id: Uuid,
    /// Display name of the competition.
    pub name: String,
    /// Creation timestamp for auditing.
    pub created_at: SystemTime,
    /// Last time any command mutated this competition.
    pub updated_at: SystemTime,
    /// Participating teams in registration order.
    pub teams: IndexMap<TeamId, Team>,
    /// The four round engines keyed by format.
    pub rounds: IndexMap<RoundKind, RoundEngine>,
}

impl Competition {
    /// Build a fresh competition from a validated roster and round set.
    pub fn new(
        name: String,
        teams: IndexMap<TeamId, Team>,
        rounds: IndexMap<RoundKind, RoundEngine>,
    ) -> Self {
        let timestamp = SystemTime::now();
        Self {
            id: Uuid::new_v4(),
            name,
            created_at: timestamp,
            updated_at: timestamp,
            teams,
            rounds,
        }
    }

    /// Look up a team by id.
    pub fn team(&self, team_id: TeamId) -> Result<&Team, EngineError> {
        self.teams
            .get(&team_id)
            .ok_or_else(|| EngineError::NotFound(format!("team {team_id} does not exist")))
    }

    /// Look up a team mutably by id.
    pub fn team_mut(&mut self, team_id: TeamId) -> Result<&mut Team, EngineError> {
        self.teams
            .get_mut(&team_id)
            .ok_or_else(|| EngineError::NotFound(format!("team {team_id} does not exist")))
    }

    /// Look up a round engine by format.
    pub fn round(&self, kind: RoundKind) -> Result<&RoundEngine, EngineError> {
        self.rounds
            .get(&kind)
            .ok_or_else(|| EngineError::NotFound(format!("round `{kind}` is not configured")))
    }

    /// Look up a round engine mutably by format.
    pub fn round_mut(&mut self, kind: RoundKind) -> Result<&mut RoundEngine, EngineError> {
        self.rounds
            .get_mut(&kind)
            .ok_or_else(|| EngineError::NotFound(format!("round `{kind}` is not configured")))
    }

    /// Apply a batch of score events to the roster, debiting/crediting
    /// exactly one team per event.
    pub fn apply_scores(&mut self, events: &[ScoreEvent]) -> Result<(), EngineError> {
        for event in events {
            let team = self.team_mut(event.team_id)?;
            team.score += event.delta;
        }
        if !events.is_empty() {
            self.updated_at = SystemTime::now();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::rounds::Question;

    fn competition() -> Competition {
        let mut teams = IndexMap::new();
        teams.insert(1, Team::new(1, "alpha".into()));
        teams.insert(2, Team::new(2, "beta".into()));

        let mut rounds = IndexMap::new();
        rounds.insert(
            RoundKind::Steal,
            RoundEngine::Steal(
                StealRound::new(
                    vec![(
                        "20s".into(),
                        vec![Question {
                            text: "q".into(),
                            options: vec![],
                            answer: Some("a".into()),
                            correct_index: None,
                            points: 20,
                            time_limit_secs: 15,
                        }],
                    )],
                    Duration::from_secs(5),
                )
                .unwrap(),
            ),
        );
        Competition::new("finals".into(), teams, rounds)
    }

    #[test]
    fn score_events_settle_against_the_roster() {
        let mut competition = competition();
        competition
            .apply_scores(&[
                ScoreEvent::new(1, -20, "package answer"),
                ScoreEvent::new(2, 20, "steal answer"),
            ])
            .unwrap();

        assert_eq!(competition.team(1).unwrap().score, -20);
        assert_eq!(competition.team(2).unwrap().score, 20);
    }

    #[test]
    fn unknown_references_are_not_found() {
        let mut competition = competition();
        assert!(matches!(
            competition.team(9).unwrap_err(),
            EngineError::NotFound(_)
        ));
        assert!(matches!(
            competition.round(RoundKind::Buzz).unwrap_err(),
            EngineError::NotFound(_)
        ));
        assert!(matches!(
            competition
                .apply_scores(&[ScoreEvent::new(9, 5, "ghost")])
                .unwrap_err(),
            EngineError::NotFound(_)
        ));
    }
}
