use std::collections::VecDeque;

/// Result of attempting to join matchmaking
#[derive(Debug, PartialEq)]
pub enum MatchOutcome {
    Waiting,
    Matched { opponent_id: String },
}

/// FIFO queue of participants waiting for an opponent.
/// Owned by the coordinator loop, so no locking.
#[derive(Debug, Default)]
pub struct Lobby {
    waiting: VecDeque<String>,
}

impl Lobby {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair `participant_id` with the longest-waiting participant, or queue it.
    pub fn try_match(&mut self, participant_id: String) -> MatchOutcome {
        match self.waiting.pop_front() {
            Some(opponent_id) => MatchOutcome::Matched { opponent_id },
            None => {
                self.waiting.push_back(participant_id);
                MatchOutcome::Waiting
            }
        }
    }

    /// Remove a participant from waiting (on disconnect)
    pub fn remove_waiting(&mut self, participant_id: &str) {
        self.waiting.retain(|id| id != participant_id);
    }

    pub fn waiting_count(&self) -> usize {
        self.waiting.len()
    }
}
