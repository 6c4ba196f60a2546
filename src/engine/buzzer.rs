//! Buzzer race bookkeeping. The serializing authority appends presses in
//! receipt order; the resolver then yields a deterministic winner and ranking
//! even when two presses carry the same millisecond timestamp.

use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::EngineError;

/// Team identifier, unique within a competition.
pub type TeamId = u32;

/// A single accepted buzzer press within the current window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BuzzerPress {
    /// Team that pressed.
    pub team_id: TeamId,
    /// Display name captured at press time so snapshots stay self-sufficient.
    pub team_name: String,
    /// Milliseconds since the window opened, as read by the authority.
    pub at_ms: u64,
}

/// Ordered press sequence for one buzz window.
///
/// The sequence is cleared whenever a phase transition opens a new window.
/// Duplicate presses are rejected up front rather than de-duplicated later,
/// which guarantees exactly-once participation per team per window.
#[derive(Debug, Clone, Default)]
pub struct BuzzerRace {
    presses: Vec<BuzzerPress>,
}

impl BuzzerRace {
    /// Empty race with no recorded presses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a press in receipt order.
    ///
    /// Returns the press's position in the sequence, or
    /// [`EngineError::DuplicatePress`] when the team already pressed in this
    /// window, leaving the sequence unchanged.
    pub fn record(&mut self, press: BuzzerPress) -> Result<usize, EngineError> {
        if self.presses.iter().any(|p| p.team_id == press.team_id) {
            return Err(EngineError::DuplicatePress(press.team_id));
        }
        self.presses.push(press);
        Ok(self.presses.len() - 1)
    }

    /// The winning press: smallest timestamp, ties broken by receipt order.
    pub fn winner(&self) -> Option<&BuzzerPress> {
        self.ranking().into_iter().next()
    }

    /// All presses ordered by timestamp ascending; equal timestamps keep
    /// their receipt order (stable sort).
    pub fn ranking(&self) -> Vec<&BuzzerPress> {
        let mut ranked: Vec<&BuzzerPress> = self.presses.iter().collect();
        ranked.sort_by_key(|press| press.at_ms);
        ranked
    }

    /// Presses in receipt order.
    pub fn presses(&self) -> &[BuzzerPress] {
        &self.presses
    }

    /// Number of accepted presses.
    pub fn len(&self) -> usize {
        self.presses.len()
    }

    /// Whether no press has been accepted yet.
    pub fn is_empty(&self) -> bool {
        self.presses.is_empty()
    }

    /// Drop all presses when a new window opens.
    pub fn clear(&mut self) {
        self.presses.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(team_id: TeamId, at_ms: u64) -> BuzzerPress {
        BuzzerPress {
            team_id,
            team_name: format!("team-{team_id}"),
            at_ms,
        }
    }

    #[test]
    fn winner_is_earliest_timestamp() {
        let mut race = BuzzerRace::new();
        race.record(press(1, 250)).unwrap();
        race.record(press(2, 120)).unwrap();
        race.record(press(3, 400)).unwrap();

        assert_eq!(race.winner().unwrap().team_id, 2);
    }

    #[test]
    fn equal_timestamps_break_by_receipt_order() {
        let mut race = BuzzerRace::new();
        race.record(press(1, 100)).unwrap();
        race.record(press(2, 100)).unwrap();
        race.record(press(3, 150)).unwrap();

        assert_eq!(race.winner().unwrap().team_id, 1);
        let ranking: Vec<TeamId> = race.ranking().iter().map(|p| p.team_id).collect();
        assert_eq!(ranking, vec![1, 2, 3]);
    }

    #[test]
    fn duplicate_press_is_rejected_and_sequence_unchanged() {
        let mut race = BuzzerRace::new();
        race.record(press(1, 100)).unwrap();

        let err = race.record(press(1, 90)).unwrap_err();
        assert_eq!(err, EngineError::DuplicatePress(1));
        assert_eq!(race.len(), 1);
        assert_eq!(race.winner().unwrap().at_ms, 100);
    }

    #[test]
    fn clear_opens_a_fresh_window() {
        let mut race = BuzzerRace::new();
        race.record(press(1, 100)).unwrap();
        race.clear();

        assert!(race.is_empty());
        assert!(race.record(press(1, 10)).is_ok());
    }
}
