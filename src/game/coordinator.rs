use super::connection::encode;
use super::lobby::{Lobby, MatchOutcome};
use super::messages::ServerMessage;
use super::participant::Participant;
use super::session::{MoveOutcome, Seat, Session};
use crate::error::OutboxError;
use crate::leaderboard::Leaderboard;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Everything the coordinator reacts to, processed one at a time
#[derive(Debug)]
pub enum CoordinatorEvent {
    Register(Participant),
    Unregister { participant_id: String },
    Move { participant_id: String, column: i64 },
}

/// Cloneable sending side of the coordinator's event queue
#[derive(Clone)]
pub struct CoordinatorHandle {
    tx: mpsc::UnboundedSender<CoordinatorEvent>,
}

impl CoordinatorHandle {
    /// Returns false if the coordinator is no longer running
    pub fn register(&self, participant: Participant) -> bool {
        self.send(CoordinatorEvent::Register(participant))
    }

    pub fn unregister(&self, participant_id: &str) {
        self.send(CoordinatorEvent::Unregister {
            participant_id: participant_id.to_string(),
        });
    }

    pub fn submit_move(&self, participant_id: &str, column: i64) {
        self.send(CoordinatorEvent::Move {
            participant_id: participant_id.to_string(),
            column,
        });
    }

    fn send(&self, event: CoordinatorEvent) -> bool {
        if self.tx.send(event).is_err() {
            warn!("Coordinator stopped, dropping event");
            return false;
        }
        true
    }
}

/// Sole owner of the participant and session registries.
/// Only ever touched from its own event loop.
pub struct Coordinator {
    participants: HashMap<String, Participant>,
    sessions: HashMap<String, Session>,
    lobby: Lobby,
    leaderboard: Leaderboard,
}

impl Coordinator {
    pub fn new(leaderboard: Leaderboard) -> Self {
        Self {
            participants: HashMap::new(),
            sessions: HashMap::new(),
            lobby: Lobby::new(),
            leaderboard,
        }
    }

    /// Start the event loop on its own task
    pub fn spawn(leaderboard: Leaderboard) -> CoordinatorHandle {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(Self::new(leaderboard).run(rx));
        CoordinatorHandle { tx }
    }

    pub async fn run(mut self, mut rx: mpsc::UnboundedReceiver<CoordinatorEvent>) {
        info!("Coordinator started");
        while let Some(event) = rx.recv().await {
            self.handle_event(event);
        }
        info!("Coordinator stopped");
    }

    pub fn handle_event(&mut self, event: CoordinatorEvent) {
        match event {
            CoordinatorEvent::Register(participant) => self.register(participant),
            CoordinatorEvent::Unregister { participant_id } => self.unregister(&participant_id),
            CoordinatorEvent::Move {
                participant_id,
                column,
            } => self.handle_move(&participant_id, column),
        }
    }

    pub fn participant_count(&self) -> usize {
        self.participants.len()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    pub fn waiting_count(&self) -> usize {
        self.lobby.waiting_count()
    }

    pub fn session_of(&self, participant_id: &str) -> Option<&str> {
        self.participants.get(participant_id)?.session_id.as_deref()
    }

    fn register(&mut self, participant: Participant) {
        let participant_id = participant.id.clone();
        info!(
            participant_id,
            display_name = participant.display_name,
            "Participant registered"
        );
        self.participants.insert(participant_id.clone(), participant);

        loop {
            match self.lobby.try_match(participant_id.clone()) {
                MatchOutcome::Waiting => {
                    debug!(participant_id, "Participant waiting for opponent");
                    return;
                }
                MatchOutcome::Matched { opponent_id }
                    if !self.participants.contains_key(&opponent_id) =>
                {
                    warn!(opponent_id, "Skipping stale lobby entry");
                }
                MatchOutcome::Matched { opponent_id } => {
                    // The newcomer takes side A and moves first
                    self.start_session(&participant_id, &opponent_id);
                    return;
                }
            }
        }
    }

    fn seat_for(&self, participant_id: &str) -> Option<Seat> {
        let participant = self.participants.get(participant_id)?;
        Some(Seat::new(participant_id, participant.display_name.clone()))
    }

    fn start_session(&mut self, side_a_id: &str, side_b_id: &str) {
        let (Some(side_a), Some(side_b)) = (self.seat_for(side_a_id), self.seat_for(side_b_id))
        else {
            return;
        };

        let session_id = uuid::Uuid::new_v4().to_string();
        for id in [side_a_id, side_b_id] {
            if let Some(participant) = self.participants.get_mut(id) {
                participant.session_id = Some(session_id.clone());
            }
        }

        info!(
            session_id,
            side_a = side_a.display_name,
            side_b = side_b.display_name,
            "Session started"
        );

        let mut session = Session::new(session_id.clone(), side_a, side_b);
        let frames = session.start(Utc::now());
        self.sessions.insert(session_id.clone(), session);

        for frame in &frames {
            self.broadcast(&session_id, frame);
        }
    }

    fn unregister(&mut self, participant_id: &str) {
        // Dropping the participant drops its outbox, which ends the outbound pump
        let Some(participant) = self.participants.remove(participant_id) else {
            return;
        };
        self.lobby.remove_waiting(participant_id);
        info!(
            participant_id,
            display_name = participant.display_name,
            "Participant left"
        );

        // The opponent is not notified and the session is left as is;
        // it is only retired once nobody in it is still connected.
        let Some(session_id) = participant.session_id else {
            return;
        };
        let orphaned = self.sessions.get(&session_id).is_some_and(|session| {
            session
                .seats()
                .iter()
                .all(|seat| !self.participants.contains_key(&seat.participant_id))
        });
        if orphaned {
            self.sessions.remove(&session_id);
            info!(session_id, "Orphaned session retired");
        }
    }

    fn handle_move(&mut self, participant_id: &str, column: i64) {
        let Some(session_id) = self
            .participants
            .get(participant_id)
            .and_then(|p| p.session_id.clone())
        else {
            debug!(participant_id, column, "Move ignored: not in a session");
            return;
        };
        let Some(session) = self.sessions.get_mut(&session_id) else {
            debug!(participant_id, session_id, "Move ignored: session retired");
            return;
        };
        let Some(outcome) = session.handle_move(participant_id, column) else {
            debug!(participant_id, column, "Move ignored");
            return;
        };

        match outcome {
            MoveOutcome::Continued(frame) => self.broadcast(&session_id, &frame),
            MoveOutcome::Ended { frame, winner } => {
                info!(
                    session_id,
                    winner = winner.as_deref().unwrap_or("Draw"),
                    "Session ended"
                );
                self.broadcast(&session_id, &frame);
                self.sessions.remove(&session_id);
                if let Some(winner) = winner {
                    self.record_win(winner);
                }
            }
        }
    }

    /// Fire-and-forget; failures are logged and never reach the players
    fn record_win(&self, display_name: String) {
        let leaderboard = self.leaderboard.clone();
        tokio::spawn(async move {
            match leaderboard.increment_win(&display_name).await {
                Ok(()) => info!(display_name, "Win recorded"),
                Err(err) => error!(display_name, %err, "Failed to record win"),
            }
        });
    }

    fn broadcast(&mut self, session_id: &str, msg: &ServerMessage) {
        let Some(session) = self.sessions.get(session_id) else {
            return;
        };
        let member_ids = session.seats().clone().map(|seat| seat.participant_id);
        let Some(frame) = encode(msg) else {
            return;
        };
        for id in &member_ids {
            self.send_to(id, frame.clone());
        }
    }

    fn send_to(&mut self, participant_id: &str, frame: String) {
        let Some(participant) = self.participants.get_mut(participant_id) else {
            return;
        };
        let Some(outbox) = participant.outbox() else {
            return;
        };
        match outbox.push(frame) {
            Ok(()) => {}
            Err(OutboxError::Full) => {
                warn!(participant_id, "Outbound queue full, closing connection");
                participant.close_outbox();
            }
            Err(OutboxError::Closed) => {
                debug!(participant_id, "Outbound queue already closed");
                participant.close_outbox();
            }
        }
    }
}
