use super::board::{GameState, Outcome, Side};
use super::messages::ServerMessage;
use chrono::{DateTime, SecondsFormat, Utc};

/// A participant seated in a session, referenced by id only
#[derive(Debug, Clone, PartialEq)]
pub struct Seat {
    pub participant_id: String,
    pub display_name: String,
}

impl Seat {
    pub fn new(participant_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            participant_id: participant_id.into(),
            display_name: display_name.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    WaitingStart,
    InProgress,
    Ended(Outcome),
}

/// What a valid move produced
#[derive(Debug, PartialEq)]
pub enum MoveOutcome {
    /// Game goes on; broadcast the new state
    Continued(ServerMessage),
    /// Game is over; broadcast the end frame. `winner` is None on a draw.
    Ended {
        frame: ServerMessage,
        winner: Option<String>,
    },
}

/// A two-player game (pure logic, no I/O). Side A is seated first.
pub struct Session {
    pub id: String,
    seats: [Seat; 2],
    game: GameState,
    phase: SessionPhase,
}

impl Session {
    pub fn new(id: String, side_a: Seat, side_b: Seat) -> Self {
        Self {
            id,
            seats: [side_a, side_b],
            game: GameState::new(),
            phase: SessionPhase::WaitingStart,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn seats(&self) -> &[Seat; 2] {
        &self.seats
    }

    pub fn game(&self) -> &GameState {
        &self.game
    }

    pub fn side_of(&self, participant_id: &str) -> Option<Side> {
        match participant_id {
            id if id == self.seats[0].participant_id => Some(Side::A),
            id if id == self.seats[1].participant_id => Some(Side::B),
            _ => None,
        }
    }

    fn seat(&self, side: Side) -> &Seat {
        match side {
            Side::A => &self.seats[0],
            Side::B => &self.seats[1],
        }
    }

    /// Move out of WAITING_START. Returns the `start` frame followed by the
    /// initial `state` frame; empty if the session was already started.
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<ServerMessage> {
        if self.phase != SessionPhase::WaitingStart {
            return Vec::new();
        }

        let start = ServerMessage::Start {
            players: [
                self.seats[0].display_name.clone(),
                self.seats[1].display_name.clone(),
            ],
            time: now.to_rfc3339_opts(SecondsFormat::Secs, true),
        };
        self.phase = SessionPhase::InProgress;

        vec![start, self.state_frame()]
    }

    pub fn state_frame(&self) -> ServerMessage {
        ServerMessage::State {
            session_id: self.id.clone(),
            board: self.game.board.to_codes(),
            turn: self.game.turn.code(),
            outcome: self.game.outcome.code(),
        }
    }

    /// Apply a move from `participant_id`. Returns None when the move is
    /// ignored: session not in progress, not a member, not their turn,
    /// column out of range or full.
    pub fn handle_move(&mut self, participant_id: &str, column: i64) -> Option<MoveOutcome> {
        if self.phase != SessionPhase::InProgress {
            return None;
        }
        let side = self.side_of(participant_id)?;
        if !self.game.play(side, column) {
            return None;
        }

        let outcome = self.game.outcome;
        if !outcome.is_over() {
            return Some(MoveOutcome::Continued(self.state_frame()));
        }

        self.phase = SessionPhase::Ended(outcome);
        let winner = match outcome {
            Outcome::Win(side) => Some(self.seat(side).display_name.clone()),
            _ => None,
        };
        let frame = ServerMessage::End {
            winner: winner.clone().unwrap_or_else(|| "Draw".to_string()),
        };
        Some(MoveOutcome::Ended { frame, winner })
    }
}
