//! Fan-out side of the distribution layer: one broadcast channel per SSE
//! audience, plus the single-holder host credential.
//!
//! Channels are deliberately lossy. A subscriber that falls behind drops
//! intermediate events, and the full round snapshot following every applied
//! command brings it back in sync, so nothing here retries or buffers.

use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::{dto::sse::ServerEvent, error::ServiceError};

/// Broadcast channels feeding the SSE endpoints.
pub struct EventChannels {
    spectators: EventChannel,
    host: EventChannel,
    host_token: Mutex<Option<String>>,
}

impl EventChannels {
    /// Build both channels with the given per-channel capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            spectators: EventChannel::new(capacity),
            host: EventChannel::new(capacity),
            host_token: Mutex::new(None),
        }
    }

    /// Channel carrying events every spectator display may see.
    pub fn spectators(&self) -> &EventChannel {
        &self.spectators
    }

    /// Channel carrying host-only events, such as pending judgments.
    pub fn host(&self) -> &EventChannel {
        &self.host
    }

    /// Issue the host credential, rejecting a second concurrent holder.
    pub async fn claim_host_token(&self) -> Result<String, ServiceError> {
        let mut slot = self.host_token.lock().await;
        if slot.is_some() {
            return Err(ServiceError::Unauthorized(
                "another host stream already holds the token".into(),
            ));
        }
        let token = Uuid::new_v4().simple().to_string();
        *slot = Some(token.clone());
        Ok(token)
    }

    /// Return the credential once the holding stream disconnects, letting a
    /// crashed host console reconnect and negotiate a fresh one.
    pub async fn release_host_token(&self) {
        self.host_token.lock().await.take();
    }

    /// Check a presented credential against the issued one.
    pub async fn authorize_host(&self, presented: &str) -> Result<(), ServiceError> {
        match self.host_token.lock().await.as_deref() {
            Some(token) if token == presented => Ok(()),
            Some(_) => Err(ServiceError::Unauthorized(
                "host token does not match".into(),
            )),
            None => Err(ServiceError::Unauthorized(
                "no host stream has claimed the token yet".into(),
            )),
        }
    }
}

/// One lossy broadcast channel.
pub struct EventChannel {
    sender: broadcast::Sender<ServerEvent>,
}

impl EventChannel {
    fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Attach a subscriber; it sees events published from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<ServerEvent> {
        self.sender.subscribe()
    }

    /// Publish to all current subscribers. Delivery errors are ignored, the
    /// next snapshot carries the full state anyway.
    pub fn publish(&self, event: ServerEvent) {
        let _ = self.sender.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn host_token_has_a_single_holder() {
        let channels = EventChannels::new(4);

        let token = channels.claim_host_token().await.unwrap();
        assert!(channels.claim_host_token().await.is_err());
        channels.authorize_host(&token).await.unwrap();

        channels.release_host_token().await;
        let fresh = channels.claim_host_token().await.unwrap();
        assert_ne!(token, fresh);
    }

    #[tokio::test]
    async fn stale_and_missing_tokens_are_rejected() {
        let channels = EventChannels::new(4);
        assert!(channels.authorize_host("anything").await.is_err());

        let token = channels.claim_host_token().await.unwrap();
        assert!(channels.authorize_host("not-the-token").await.is_err());
        channels.authorize_host(&token).await.unwrap();
    }

    #[tokio::test]
    async fn publish_reaches_only_subscribed_channels() {
        let channels = EventChannels::new(4);
        let mut spectator = channels.spectators().subscribe();
        let mut host = channels.host().subscribe();

        channels
            .host()
            .publish(ServerEvent::new(Some("pending".into()), "{}".into()));

        let received = host.recv().await.unwrap();
        assert_eq!(received.event.as_deref(), Some("pending"));
        assert!(spectator.try_recv().is_err());
    }
}
