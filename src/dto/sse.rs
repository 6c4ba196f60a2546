//! Payload types carried over the SSE streams.

use serde::Serialize;
use utoipa::ToSchema;

/// Dispatched payload carried across SSE channels.
#[derive(Clone, Debug)]
pub struct ServerEvent {
    /// Optional SSE event name.
    pub event: Option<String>,
    /// Serialized JSON body.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Plain-text event without JSON serialization.
    pub fn new(event: Option<String>, data: String) -> Self {
        Self { event, data }
    }
}

/// Initial payload sent to the host console when its stream is established.
#[derive(Debug, Serialize, ToSchema)]
pub struct HostHandshake {
    /// Token the host must echo in `x-host-token` on every host route.
    pub token: String,
}
