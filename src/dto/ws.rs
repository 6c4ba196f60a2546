//! Messages exchanged with team consoles over the WebSocket endpoint.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::buzzer::TeamId;

/// Messages accepted from team console WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum ConsoleInboundMessage {
    /// Handshake binding the socket to a team.
    #[serde(rename = "identification")]
    Identification {
        /// Team the console claims to be.
        team_id: TeamId,
    },
    /// Buzzer press from an identified console.
    #[serde(rename = "buzz")]
    Buzz {
        /// Pressing team.
        team_id: TeamId,
    },
    /// Any message type this server does not understand.
    #[serde(other)]
    Unknown,
}

impl ConsoleInboundMessage {
    /// Team id carried by an identification message, `None` for anything else.
    pub fn identification_team(&self) -> Option<TeamId> {
        match self {
            Self::Identification { team_id } => Some(*team_id),
            _ => None,
        }
    }
}

/// Positive acknowledgement sent to a console after successful identification.
#[derive(Debug, Serialize, ToSchema)]
pub struct ConsoleAck {
    /// Team the socket is now bound to.
    pub team_id: TeamId,
    /// Human-readable acknowledgement status.
    pub status: String,
}

/// Feedback sent to a console after it triggers a buzz event.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BuzzFeedback {
    /// Pressing team.
    pub team_id: TeamId,
    /// Whether the press entered the race.
    pub accepted: bool,
    /// Position in the race when the press was accepted, first is 1.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}
