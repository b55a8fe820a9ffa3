/// Biddable seconds every player starts a room with. Never replenished.
pub const STARTING_BUDGET_SECS: f64 = 600.0;

/// A participant seated in a room.
///
/// The budget is mutated only by the owning room's round logic; it only
/// ever goes down.
pub struct PlayerSession {
    pub player_id: String,
    pub display_name: String,
    remaining_budget: f64,
    current_bet: Option<f64>,
}

impl PlayerSession {
    pub fn new(player_id: &str) -> Self {
        Self {
            player_id: player_id.to_string(),
            // Intents carry no separate name field
            display_name: player_id.to_string(),
            remaining_budget: STARTING_BUDGET_SECS,
            current_bet: None,
        }
    }

    pub fn remaining_budget(&self) -> f64 {
        self.remaining_budget
    }

    pub fn current_bet(&self) -> Option<f64> {
        self.current_bet
    }

    pub fn has_bet(&self) -> bool {
        self.current_bet.is_some()
    }

    /// Record an accepted bet and pay for it. The caller must have checked
    /// the bet against the remaining budget.
    pub fn commit_bet(&mut self, seconds: f64) {
        self.remaining_budget -= seconds;
        self.current_bet = Some(seconds);
    }

    pub fn clear_bet(&mut self) {
        self.current_bet = None;
    }
}
