use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::time::Instant;

/// Ticks a round counts down before the clock starts.
pub const COUNTDOWN_TICKS: u32 = 3;

/// Progression of one bidding round. Transitions are strictly forward; a
/// new round always gets a fresh `BiddingRound`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Phase {
    Countdown,
    Active,
    Resolving,
    Result,
}

/// A committed bid, stamped with the server receipt instant.
#[derive(Debug, Clone)]
pub struct Bet {
    pub player_id: String,
    pub seconds: f64,
    pub received_at: Instant,
}

/// One bidding round (pure logic, no I/O).
pub struct BiddingRound {
    phase: Phase,
    countdown_remaining: u32,
    clock_start: Option<Instant>,
    bets: Vec<Bet>,
    winner_id: Option<String>,
}

impl BiddingRound {
    pub fn new() -> Self {
        Self {
            phase: Phase::Countdown,
            countdown_remaining: COUNTDOWN_TICKS,
            clock_start: None,
            bets: Vec::new(),
            winner_id: None,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn countdown_remaining(&self) -> u32 {
        self.countdown_remaining
    }

    pub fn clock_start(&self) -> Option<Instant> {
        self.clock_start
    }

    pub fn bets(&self) -> &[Bet] {
        &self.bets
    }

    pub fn winner_id(&self) -> Option<&str> {
        self.winner_id.as_deref()
    }

    /// Decrement the countdown. Returns true when it reaches zero and the
    /// clock starts, moving the round to `Active`.
    pub fn tick_countdown(&mut self, now: Instant) -> bool {
        if self.phase != Phase::Countdown {
            return false;
        }
        self.countdown_remaining = self.countdown_remaining.saturating_sub(1);
        if self.countdown_remaining == 0 {
            self.phase = Phase::Active;
            self.clock_start = Some(now);
            return true;
        }
        false
    }

    /// Seconds the round clock has been running at `now`.
    pub fn elapsed_secs(&self, now: Instant) -> Option<f64> {
        self.clock_start
            .map(|start| now.saturating_duration_since(start).as_secs_f64())
    }

    /// Record an accepted bet. At most one per player; the caller enforces
    /// budget and idempotence checks.
    pub fn record_bet(&mut self, player_id: &str, seconds: f64, received_at: Instant) {
        self.bets.push(Bet {
            player_id: player_id.to_string(),
            seconds,
            received_at,
        });
    }

    /// Adjudicate the round: greatest bet wins, ties broken by earliest
    /// receipt. Moves the round to `Result` and returns the winner.
    pub fn resolve(&mut self) -> Option<String> {
        if self.phase != Phase::Active || self.bets.is_empty() {
            return None;
        }
        self.phase = Phase::Resolving;

        let winner = self
            .bets
            .iter()
            .max_by(|a, b| {
                a.seconds
                    .partial_cmp(&b.seconds)
                    .unwrap_or(Ordering::Equal)
                    // Earlier receipt ranks higher on equal bets
                    .then_with(|| b.received_at.cmp(&a.received_at))
            })
            .map(|bet| bet.player_id.clone());

        self.phase = Phase::Result;
        self.winner_id = winner.clone();
        winner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn countdown_ticks_to_active() {
        let mut round = BiddingRound::new();
        let now = Instant::now();

        assert_eq!(round.phase(), Phase::Countdown);
        assert_eq!(round.countdown_remaining(), 3);

        assert!(!round.tick_countdown(now));
        assert!(!round.tick_countdown(now));
        assert_eq!(round.countdown_remaining(), 1);

        assert!(round.tick_countdown(now));
        assert_eq!(round.phase(), Phase::Active);
        assert_eq!(round.clock_start(), Some(now));
    }

    #[test]
    fn elapsed_measures_from_clock_start() {
        let mut round = BiddingRound::new();
        let start = Instant::now();
        round.tick_countdown(start);
        round.tick_countdown(start);
        round.tick_countdown(start);

        let later = start + Duration::from_millis(12_500);
        assert_eq!(round.elapsed_secs(later), Some(12.5));
    }

    #[test]
    fn greatest_bet_wins() {
        let mut round = BiddingRound::new();
        let now = Instant::now();
        round.tick_countdown(now);
        round.tick_countdown(now);
        round.tick_countdown(now);

        round.record_bet("p0", 8.0, now + Duration::from_secs(8));
        round.record_bet("p1", 15.0, now + Duration::from_secs(15));
        round.record_bet("p2", 5.0, now + Duration::from_secs(5));
        round.record_bet("p3", 20.0, now + Duration::from_secs(20));

        assert_eq!(round.resolve(), Some("p3".to_string()));
        assert_eq!(round.phase(), Phase::Result);
        assert_eq!(round.winner_id(), Some("p3"));
    }

    #[test]
    fn tie_breaks_by_earliest_receipt() {
        let mut round = BiddingRound::new();
        let now = Instant::now();
        round.tick_countdown(now);
        round.tick_countdown(now);
        round.tick_countdown(now);

        // Identical bet values; A's receipt is earlier than B's
        round.record_bet("b", 12.5, now + Duration::from_millis(200));
        round.record_bet("a", 12.5, now + Duration::from_millis(100));

        assert_eq!(round.resolve(), Some("a".to_string()));
    }

    #[test]
    fn resolve_requires_active_phase_and_bets() {
        let mut round = BiddingRound::new();
        assert_eq!(round.resolve(), None);

        let now = Instant::now();
        round.tick_countdown(now);
        round.tick_countdown(now);
        round.tick_countdown(now);
        assert_eq!(round.resolve(), None); // no bets recorded
    }
}
