//! Pure gameplay primitives shared by every round: the game clock, the buzzer
//! race resolver, the scoring rules, and answer normalization. Nothing in this
//! module performs IO or owns shared state.

pub mod buzzer;
pub mod clock;
pub mod normalize;
pub mod scoring;

use thiserror::Error;

/// Recoverable rejection returned when a command cannot be applied.
///
/// All variants leave the round state untouched; the orchestration layer
/// surfaces them to the issuing client only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// The command is not legal in the round's current phase.
    #[error("invalid transition: {command} cannot be applied while in {phase}")]
    InvalidTransition {
        /// Phase the round was in when the command arrived.
        phase: String,
        /// Human-readable name of the rejected command.
        command: String,
    },
    /// A timing-sensitive command arrived after its window expired.
    #[error("window closed: {0}")]
    WindowClosed(String),
    /// A second buzzer press from the same team within one window.
    #[error("duplicate press from team {0}")]
    DuplicatePress(u32),
    /// A second answer from the same team within one window.
    #[error("duplicate answer from team {0}")]
    DuplicateAnswer(u32),
    /// Re-judgment of an answer that already carries a terminal judgment.
    #[error("answer from team {0} has already been judged")]
    AlreadyJudged(u32),
    /// Malformed or ineligible command payload; nothing was applied.
    #[error("validation failed: {0}")]
    ValidationFailed(String),
    /// The command references a team, question, tile, or package that does
    /// not exist in the current configuration.
    #[error("not found: {0}")]
    NotFound(String),
}

impl EngineError {
    /// Build an [`EngineError::InvalidTransition`] from a phase debug label
    /// and the command name.
    pub fn invalid(phase: impl std::fmt::Debug, command: &str) -> Self {
        Self::InvalidTransition {
            phase: format!("{phase:?}"),
            command: command.to_string(),
        }
    }
}
