//! Bridges the broadcast channels to axum SSE responses.
//!
//! Each response owns a forwarder task relaying broadcast events into the
//! response body. The host variant additionally holds the single host
//! credential for the lifetime of the connection and returns it when the
//! stream drops.

use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info};

use crate::{
    dto::sse::{HostHandshake, ServerEvent},
    error::ServiceError,
    state::SharedState,
};

/// Events buffered between the forwarder task and the response body.
const FORWARD_BUFFER: usize = 8;

/// Handshake event name delivered first on every host stream.
const EVENT_HOST_TOKEN: &str = "host_token";

/// Attach a spectator display to the public stream.
pub fn spectator_stream(
    state: &SharedState,
) -> Sse<impl Stream<Item = Result<Event, Infallible>> + use<>> {
    forward(state.events().spectators().subscribe(), None, None)
}

/// Attach the host console, claiming the host credential.
///
/// The first event on the stream is the `host_token` handshake, delivered to
/// this subscriber only. The credential is released when the stream drops.
pub async fn host_stream(
    state: &SharedState,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>> + use<>>, ServiceError> {
    let token = state.events().claim_host_token().await?;
    let receiver = state.events().host().subscribe();
    let handshake = ServerEvent::json(Some(EVENT_HOST_TOKEN.to_string()), &HostHandshake { token })
        .map_err(|err| ServiceError::InvalidState(format!("handshake payload: {err}")))?;
    Ok(forward(receiver, Some(handshake), Some(state.clone())))
}

/// Spawn the forwarder and wrap its output channel as an SSE response.
///
/// `token_holder` carries the shared state for host streams so the spawned
/// task can release the credential even after the request context is gone.
fn forward(
    mut receiver: broadcast::Receiver<ServerEvent>,
    greeting: Option<ServerEvent>,
    token_holder: Option<SharedState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(FORWARD_BUFFER);

    if let Some(payload) = greeting {
        // The channel is freshly created, the greeting always fits.
        let _ = tx.try_send(Ok(to_event(payload)));
    }

    tokio::spawn(async move {
        loop {
            let payload = tokio::select! {
                _ = tx.closed() => break,
                received = receiver.recv() => match received {
                    Ok(payload) => payload,
                    Err(RecvError::Lagged(skipped)) => {
                        debug!(skipped, "sse subscriber lagged, next snapshot restores its view");
                        continue;
                    }
                    Err(RecvError::Closed) => break,
                },
            };
            if tx.send(Ok(to_event(payload))).await.is_err() {
                break;
            }
        }

        match token_holder {
            Some(state) => {
                state.events().release_host_token().await;
                info!("host sse stream closed, token released");
            }
            None => info!("spectator sse stream closed"),
        }
    });

    Sse::new(ReceiverStream::new(rx)).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

fn to_event(payload: ServerEvent) -> Event {
    let mut event = Event::default().data(payload.data);
    if let Some(name) = payload.event {
        event = event.event(name);
    }
    event
}
