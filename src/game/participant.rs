use super::connection::Outbox;

pub const DEFAULT_DISPLAY_NAME: &str = "Guest";

/// A connected player. Owns the producer side of its connection's queue
/// and refers to its session by id only.
#[derive(Debug)]
pub struct Participant {
    pub id: String,
    pub display_name: String,
    pub session_id: Option<String>,
    outbox: Option<Outbox>,
}

impl Participant {
    pub fn new(display_name: &str, outbox: Outbox) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            display_name: display_name.to_string(),
            session_id: None,
            outbox: Some(outbox),
        }
    }

    pub fn outbox(&self) -> Option<&Outbox> {
        self.outbox.as_ref()
    }

    /// Drop the queue producer; the outbound pump drains and then closes
    pub fn close_outbox(&mut self) {
        self.outbox = None;
    }

    pub fn is_matched(&self) -> bool {
        self.session_id.is_some()
    }
}

/// Resolve the display name from the connect-time query value.
/// Only a missing or empty name is replaced; anything else is kept verbatim.
pub fn display_name_or_default(requested: Option<&str>) -> String {
    match requested {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => DEFAULT_DISPLAY_NAME.to_string(),
    }
}
