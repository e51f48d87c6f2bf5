//! Turn arbitration values.

/// Whether this viewer currently holds the turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TurnState {
    /// Someone else holds the turn, or nobody does.
    #[default]
    Idle,
    /// We hold the turn and may send input.
    Mine,
}

impl TurnState {
    pub fn is_mine(self) -> bool {
        self == TurnState::Mine
    }
}

/// Transient turn/queue information delivered with each turn notification.
///
/// Only the `our_turn` part is retained by the session; the countdown and
/// queue size are display hints and are never enforced locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnUpdate {
    pub our_turn: bool,
    pub seconds_remaining: Option<u32>,
    pub queue_size: Option<u32>,
}

impl TurnUpdate {
    /// Builds the update for a `yourTurn` message.
    pub fn mine(seconds_remaining: Option<u32>) -> Self {
        Self {
            our_turn: true,
            seconds_remaining,
            queue_size: None,
        }
    }

    /// Builds the update for a `turnUpdate` message.
    pub fn waiting(seconds_remaining: Option<u32>, queue_size: u32) -> Self {
        Self {
            our_turn: false,
            seconds_remaining,
            queue_size: Some(queue_size),
        }
    }

    /// The turn state this update implies.
    pub fn state(&self) -> TurnState {
        if self.our_turn {
            TurnState::Mine
        } else {
            TurnState::Idle
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_turn_is_idle() {
        assert_eq!(TurnState::default(), TurnState::Idle);
        assert!(!TurnState::default().is_mine());
    }

    #[test]
    fn test_mine_update_has_no_queue_size() {
        let update = TurnUpdate::mine(Some(30));
        assert_eq!(update.state(), TurnState::Mine);
        assert_eq!(update.seconds_remaining, Some(30));
        assert_eq!(update.queue_size, None);
    }

    #[test]
    fn test_waiting_update_carries_queue_size() {
        let update = TurnUpdate::waiting(None, 3);
        assert_eq!(update.state(), TurnState::Idle);
        assert_eq!(update.seconds_remaining, None);
        assert_eq!(update.queue_size, Some(3));
    }
}
