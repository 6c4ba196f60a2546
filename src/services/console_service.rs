//! WebSocket lifecycle for team consoles: identification, the buzz fast
//! path, and registry upkeep.

use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};

use crate::{
    dto::{
        play::PressBuzzerRequest,
        ws::{BuzzFeedback, ConsoleAck, ConsoleInboundMessage},
    },
    engine::buzzer::TeamId,
    rounds::{buzz::BuzzPhase, steal::StealPhase},
    services::play_service,
    state::{
        ConsoleConnection, SharedState,
        game::{RoundEngine, RoundKind},
    },
};

const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle for an individual console WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("websocket identification timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match serde_json::from_str::<ConsoleInboundMessage>(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse console message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let Some(team_id) = inbound.identification_team() else {
        warn!("first message was not identification");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    let team_known = state
        .read_competition(|competition| Ok(competition.teams.contains_key(&team_id)))
        .await
        .unwrap_or(false);
    if !team_known {
        warn!(team_id, "identification for unknown team");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    }

    state.consoles().insert(
        team_id,
        ConsoleConnection {
            team_id,
            tx: outbound_tx.clone(),
        },
    );
    send_to_console(
        &outbound_tx,
        &ConsoleAck {
            team_id,
            status: "identified".into(),
        },
    );
    info!(team_id, "console connected");

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match serde_json::from_str::<ConsoleInboundMessage>(&text) {
                Ok(ConsoleInboundMessage::Buzz { team_id: pressed }) => {
                    if pressed != team_id {
                        warn!(team_id, pressed, "ignoring buzz with mismatched team id");
                        continue;
                    }
                    handle_buzz(&state, team_id, &outbound_tx).await;
                }
                Ok(ConsoleInboundMessage::Identification { .. }) => {
                    warn!(team_id, "ignoring duplicate identification message");
                }
                Ok(ConsoleInboundMessage::Unknown) => {
                    warn!(team_id, "ignoring unknown console message");
                }
                Err(err) => {
                    warn!(team_id, error = %err, "failed to parse console message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(team_id, "console closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(team_id, error = %err, "websocket error");
                break;
            }
        }
    }

    state.consoles().remove(&team_id);
    info!(team_id, "console disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Route a console buzz to whichever round is currently racing, then report
/// the verdict back to the pressing console only.
async fn handle_buzz(
    state: &SharedState,
    team_id: TeamId,
    outbound_tx: &mpsc::UnboundedSender<Message>,
) {
    let Some(kind) = active_race_round(state).await else {
        send_to_console(
            outbound_tx,
            &BuzzFeedback {
                team_id,
                accepted: false,
                position: None,
            },
        );
        return;
    };

    let feedback = match play_service::press_buzzer(state, kind, PressBuzzerRequest { team_id })
        .await
    {
        Ok((_press, position)) => BuzzFeedback {
            team_id,
            accepted: true,
            position: Some(position),
        },
        Err(err) => {
            info!(team_id, round = %kind, error = %err, "buzz rejected");
            BuzzFeedback {
                team_id,
                accepted: false,
                position: None,
            }
        }
    };
    send_to_console(outbound_tx, &feedback);
}

/// Find the round whose phase currently accepts buzzer presses, if any.
/// The engine re-validates under the write lock, so a stale answer here can
/// only produce a rejection, never a misapplied press.
async fn active_race_round(state: &SharedState) -> Option<RoundKind> {
    state
        .read_competition(|competition| {
            Ok(competition.rounds.iter().find_map(|(kind, engine)| {
                let racing = match engine {
                    RoundEngine::Buzz(round) => {
                        matches!(round.phase(), BuzzPhase::QuestionOpen)
                    }
                    RoundEngine::Steal(round) => {
                        matches!(round.phase(), StealPhase::BuzzerWindow)
                    }
                    _ => false,
                };
                racing.then_some(*kind)
            }))
        })
        .await
        .ok()
        .flatten()
}

/// Serialize a payload and push it onto the provided WebSocket sender.
fn send_to_console<T>(tx: &mpsc::UnboundedSender<Message>, value: &T)
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    match serde_json::to_string(value) {
        Ok(payload) => {
            let _ = tx.send(Message::Text(payload.into()));
        }
        Err(err) => warn!(error = %err, "failed to serialize console message `{value:?}`"),
    }
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}
