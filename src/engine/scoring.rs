//! Pure scoring rules. Every function here maps a judgment plus context to a
//! signed point delta; applying the delta to a team total and enforcing the
//! once-per-answer invariant is the round machines' job.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Tri-state judgment of a submitted answer. `Unjudged` is a first-class
/// value so "not yet judged" is exhaustively matched instead of hiding in a
/// nullable boolean.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Judgment {
    /// The host has not ruled on this answer yet.
    Unjudged,
    /// Accepted by the host.
    Correct,
    /// Rejected by the host.
    Incorrect,
}

impl Judgment {
    /// Whether this judgment is terminal (correct or incorrect).
    pub fn is_terminal(self) -> bool {
        !matches!(self, Judgment::Unjudged)
    }
}

/// Distinguishes an acting team answering its own question from another team
/// answering after winning the post-failure buzzer race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttemptKind {
    /// The designated main team attempting its own question.
    OwnQuestion,
    /// A contesting team answering after winning the steal race.
    Steal,
}

/// Delta for the standard rounds: correct earns the question's value,
/// anything else earns nothing.
pub fn standard_delta(judgment: Judgment, point_value: i32) -> i32 {
    match judgment {
        Judgment::Correct => point_value,
        Judgment::Incorrect | Judgment::Unjudged => 0,
    }
}

/// Delta for the steal/package round. The main team is penalised for a wrong
/// attempt on its own question; a failed steal costs nothing.
pub fn steal_delta(attempt: AttemptKind, judgment: Judgment, point_value: i32) -> i32 {
    match (attempt, judgment) {
        (_, Judgment::Correct) => point_value,
        (AttemptKind::OwnQuestion, Judgment::Incorrect) => -point_value,
        (AttemptKind::Steal, Judgment::Incorrect) => 0,
        (_, Judgment::Unjudged) => 0,
    }
}

/// Award for the speed-ranked round: `rank` is the position (0-based) among
/// correct answers ordered by submission time; ranks beyond the schedule earn
/// nothing.
pub fn speed_award(rank: usize, schedule: &[i32]) -> i32 {
    schedule.get(rank).copied().unwrap_or(0)
}

/// Apply the one-time hope-star modifier: a flagged correct answer doubles
/// its delta. Penalties and zero deltas are never amplified.
pub fn with_hope_star(delta: i32, flagged: bool) -> i32 {
    if flagged && delta > 0 { delta * 2 } else { delta }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_round_has_no_penalty() {
        assert_eq!(standard_delta(Judgment::Correct, 10), 10);
        assert_eq!(standard_delta(Judgment::Incorrect, 10), 0);
        assert_eq!(standard_delta(Judgment::Unjudged, 10), 0);
    }

    #[test]
    fn own_question_penalises_wrong_answers() {
        assert_eq!(steal_delta(AttemptKind::OwnQuestion, Judgment::Correct, 20), 20);
        assert_eq!(steal_delta(AttemptKind::OwnQuestion, Judgment::Incorrect, 20), -20);
        assert_eq!(steal_delta(AttemptKind::OwnQuestion, Judgment::Unjudged, 20), 0);
    }

    #[test]
    fn failed_steal_costs_nothing() {
        assert_eq!(steal_delta(AttemptKind::Steal, Judgment::Correct, 20), 20);
        assert_eq!(steal_delta(AttemptKind::Steal, Judgment::Incorrect, 20), 0);
    }

    #[test]
    fn speed_awards_follow_the_schedule() {
        let schedule = [30, 20, 10];
        assert_eq!(speed_award(0, &schedule), 30);
        assert_eq!(speed_award(2, &schedule), 10);
        assert_eq!(speed_award(3, &schedule), 0);
    }

    #[test]
    fn hope_star_doubles_only_positive_deltas() {
        assert_eq!(with_hope_star(20, true), 40);
        assert_eq!(with_hope_star(20, false), 20);
        assert_eq!(with_hope_star(-20, true), -20);
        assert_eq!(with_hope_star(0, true), 0);
    }
}
