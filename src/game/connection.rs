use super::coordinator::CoordinatorHandle;
use super::messages::{ClientMessage, ServerMessage};
use super::participant::Participant;
use crate::error::OutboxError;
use axum::extract::ws::{Message, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::time::{Instant, interval_at, timeout};
use tracing::{debug, info, warn};

pub const OUTBOX_CAPACITY: usize = 256;
pub const MAX_FRAME_SIZE: usize = 512;

/// Timings for the write deadline and the application-level heartbeat.
/// `ping_period` must stay below `pong_wait` so a live client always has a
/// ping to answer before its read deadline expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    pub write_wait: Duration,
    pub pong_wait: Duration,
    pub ping_period: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        let pong_wait = Duration::from_secs(60);
        Self {
            write_wait: Duration::from_secs(10),
            pong_wait,
            ping_period: pong_wait * 9 / 10,
        }
    }
}

/// Producer half of a connection's bounded outbound queue.
/// Not `Clone`: dropping it is what closes the queue.
#[derive(Debug)]
pub struct Outbox {
    tx: mpsc::Sender<String>,
}

impl Outbox {
    pub fn channel() -> (Self, mpsc::Receiver<String>) {
        let (tx, rx) = mpsc::channel(OUTBOX_CAPACITY);
        (Self { tx }, rx)
    }

    /// Queue a serialized frame without waiting
    pub fn push(&self, frame: String) -> Result<(), OutboxError> {
        self.tx.try_send(frame).map_err(|err| match err {
            TrySendError::Full(_) => OutboxError::Full,
            TrySendError::Closed(_) => OutboxError::Closed,
        })
    }
}

pub fn encode(msg: &ServerMessage) -> Option<String> {
    match serde_json::to_string(msg) {
        Ok(json) => Some(json),
        Err(err) => {
            warn!(%err, ?msg, "Failed to encode server message");
            None
        }
    }
}

/// Drive one accepted socket until either direction stops.
/// Registers the participant, runs both pumps and unregisters on the way out.
pub async fn run_connection(
    socket: WebSocket,
    coordinator: CoordinatorHandle,
    display_name: String,
    heartbeat: HeartbeatConfig,
) {
    let (outbox, rx) = Outbox::channel();
    let participant = Participant::new(&display_name, outbox);
    let participant_id = participant.id.clone();
    info!(participant_id, display_name, "New WebSocket connection");

    if !coordinator.register(participant) {
        return;
    }

    let (sender, receiver) = socket.split();
    let mut outbound = tokio::spawn(outbound_pump(sender, rx, heartbeat));
    let mut inbound = tokio::spawn(inbound_pump(
        receiver,
        coordinator.clone(),
        participant_id.clone(),
        heartbeat.pong_wait,
    ));

    tokio::select! {
        _ = &mut inbound => {
            // The coordinator drops the outbox on unregister; let the pump
            // flush and send its close frame.
            if timeout(heartbeat.write_wait, &mut outbound).await.is_err() {
                outbound.abort();
            }
        }
        _ = &mut outbound => {
            inbound.abort();
            coordinator.unregister(&participant_id);
        }
    }

    info!(participant_id, "WebSocket connection closed");
}

async fn outbound_pump(
    mut sender: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<String>,
    heartbeat: HeartbeatConfig,
) {
    let Some(ping) = encode(&ServerMessage::Ping) else {
        return;
    };
    let mut ticker = interval_at(Instant::now() + heartbeat.ping_period, heartbeat.ping_period);

    loop {
        let msg = tokio::select! {
            frame = rx.recv() => match frame {
                Some(json) => Message::Text(json),
                None => {
                    debug!("Outbound queue closed, sending close frame");
                    let _ = timeout(heartbeat.write_wait, sender.send(Message::Close(None))).await;
                    break;
                }
            },
            _ = ticker.tick() => Message::Text(ping.clone()),
        };

        match timeout(heartbeat.write_wait, sender.send(msg)).await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => {
                warn!(%err, "Write failed");
                break;
            }
            Err(_) => {
                warn!("Write deadline exceeded");
                break;
            }
        }
    }

    let _ = timeout(heartbeat.write_wait, sender.close()).await;
}

async fn inbound_pump(
    mut receiver: SplitStream<WebSocket>,
    coordinator: CoordinatorHandle,
    participant_id: String,
    pong_wait: Duration,
) {
    loop {
        // Every received frame restarts the liveness window
        let msg = match timeout(pong_wait, receiver.next()).await {
            Ok(Some(Ok(msg))) => msg,
            Ok(Some(Err(err))) => {
                info!(participant_id, %err, "Read failed");
                break;
            }
            Ok(None) => break,
            Err(_) => {
                info!(participant_id, "No frame within liveness window");
                break;
            }
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => {
                debug!(participant_id, "Received close frame");
                break;
            }
            _ => {
                debug!("Received non-text message, ignoring");
                continue;
            }
        };

        let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
            warn!(participant_id, raw = %text, "Failed to parse client message");
            continue;
        };

        match client_msg {
            ClientMessage::Pong => debug!(participant_id, "Pong received"),
            ClientMessage::Move { column } => coordinator.submit_move(&participant_id, column),
        }
    }

    coordinator.unregister(&participant_id);
}
