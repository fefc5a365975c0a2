use super::board::{COLS, ROWS};
use serde::{Deserialize, Deserializer, Serialize, de::Error as _};

#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Move {
        #[serde(deserialize_with = "whole_number")]
        column: i64,
    },
    Pong,
}

/// Browsers send plain JSON numbers, so `3.0` is as good as `3`.
/// Fractional values are rejected.
fn whole_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Number {
        Int(i64),
        Float(f64),
    }

    match Number::deserialize(deserializer)? {
        Number::Int(n) => Ok(n),
        Number::Float(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
        Number::Float(f) => Err(D::Error::custom(format!("column {f} is not a whole number"))),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Ping,
    Start {
        players: [String; 2],
        time: String,
    },
    State {
        #[serde(rename = "sessionId")]
        session_id: String,
        board: [[u8; COLS]; ROWS],
        turn: u8,
        outcome: u8,
    },
    End {
        winner: String,
    },
}
