/// Errors that reject a single client intent.
///
/// Every variant except `InsufficientBudget` is reported only to the
/// connection that issued the intent; `InsufficientBudget` additionally
/// aborts and restarts the round it was raised in.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// The room (or player within it) does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The room has no free seat.
    #[error("room {0} is full")]
    RoomFull(String),

    /// The operation is not allowed in the room's current state.
    #[error("invalid state for this operation: {0}")]
    InvalidState(String),

    /// The player already placed a bet this round; the first bet stands.
    #[error("player {0} already bet this round")]
    AlreadyBet(String),

    /// The bet exceeds the player's remaining budget.
    #[error("bet of {bet:.3}s exceeds remaining budget of {budget:.3}s")]
    InsufficientBudget { bet: f64, budget: f64 },

    /// The connection's outbound channel is gone.
    #[error("synchronization channel is not connected")]
    TransportUnavailable,
}

impl GameError {
    /// Stable wire code sent in `error` messages.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::RoomFull(_) => "room_full",
            Self::InvalidState(_) => "invalid_state",
            Self::AlreadyBet(_) => "already_bet",
            Self::InsufficientBudget { .. } => "insufficient_budget",
            Self::TransportUnavailable => "transport_unavailable",
        }
    }
}
