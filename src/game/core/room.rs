use super::messages::{BetReveal, PlayerSnapshot, RoomSnapshot, RoomSummary};
use super::player::PlayerSession;
use super::round::{BiddingRound, Phase};
use crate::game::error::GameError;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Rounds a game runs before the room finishes.
pub const TOTAL_ROUNDS: u32 = 10;
pub const DEFAULT_MAX_PLAYERS: usize = 4;
pub const DEFAULT_MIN_PLAYERS: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RoomStatus {
    Waiting,
    InProgress,
    Finished,
}

#[derive(Debug)]
pub struct JoinOutcome {
    /// The join filled the room and round 1 just began.
    pub started: bool,
}

pub struct LeaveOutcome {
    pub now_empty: bool,
    /// Everyone still seated has bet, so the active round can resolve.
    pub round_resolvable: bool,
}

#[derive(Debug)]
pub struct BetOutcome {
    pub bet_seconds: f64,
    /// This was the last outstanding bet of the round.
    pub all_bet: bool,
}

pub enum RoundAdvance {
    Next(u32),
    Finished,
}

/// One game session: a bounded roster of players, a lifecycle status, and
/// the active bidding round. Pure logic; the engine owns locking, timers,
/// and broadcasts.
pub struct Room {
    pub room_id: String,
    pub room_name: String,
    pub max_players: usize,
    pub min_players: usize,
    players: Vec<PlayerSession>,
    status: RoomStatus,
    current_round: u32,
    round: Option<BiddingRound>,
    // Bumped whenever a fresh round instance starts; timer tasks capture it
    // and bail out when it no longer matches.
    round_serial: u64,
    created_at: Instant,
}

impl Room {
    pub fn new(room_id: String, room_name: String, max_players: usize) -> Self {
        let max_players = max_players.max(1);
        Self {
            room_id,
            room_name,
            max_players,
            min_players: DEFAULT_MIN_PLAYERS.min(max_players),
            players: Vec::new(),
            status: RoomStatus::Waiting,
            current_round: 1,
            round: None,
            round_serial: 0,
            created_at: Instant::now(),
        }
    }

    pub fn status(&self) -> RoomStatus {
        self.status
    }

    pub fn occupancy(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn current_round(&self) -> u32 {
        self.current_round
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn round(&self) -> Option<&BiddingRound> {
        self.round.as_ref()
    }

    pub fn round_serial(&self) -> u64 {
        self.round_serial
    }

    pub fn players(&self) -> &[PlayerSession] {
        &self.players
    }

    pub fn has_player(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.player_id == player_id)
    }

    fn player_mut(&mut self, player_id: &str) -> Option<&mut PlayerSession> {
        self.players.iter_mut().find(|p| p.player_id == player_id)
    }

    /// Seat a player at the end of the roster. Filling the last seat starts
    /// the game.
    pub fn join(&mut self, player_id: &str) -> Result<JoinOutcome, GameError> {
        if self.players.len() >= self.max_players {
            return Err(GameError::RoomFull(self.room_id.clone()));
        }
        if self.status != RoomStatus::Waiting {
            return Err(GameError::InvalidState(format!(
                "room {} is not accepting players",
                self.room_id
            )));
        }
        if self.has_player(player_id) {
            return Err(GameError::InvalidState(format!(
                "player {player_id} is already in room {}",
                self.room_id
            )));
        }

        self.players.push(PlayerSession::new(player_id));

        let started = self.players.len() == self.max_players;
        if started {
            self.status = RoomStatus::InProgress;
            self.current_round = 1;
            self.begin_round();
        }
        Ok(JoinOutcome { started })
    }

    /// Remove a player. An active round stops waiting on them; if everyone
    /// left seated has already bet, the round becomes resolvable.
    pub fn leave(&mut self, player_id: &str) -> Result<LeaveOutcome, GameError> {
        let Some(idx) = self.players.iter().position(|p| p.player_id == player_id) else {
            return Err(GameError::NotFound(format!("player {player_id}")));
        };
        self.players.remove(idx);

        let round_resolvable = !self.players.is_empty()
            && self.round.as_ref().is_some_and(|r| r.phase() == Phase::Active)
            && self.all_occupants_bet();

        Ok(LeaveOutcome {
            now_empty: self.players.is_empty(),
            round_resolvable,
        })
    }

    /// Start a fresh round instance in COUNTDOWN, clearing every player's
    /// bet state and invalidating timers of the previous instance.
    pub fn begin_round(&mut self) {
        for player in &mut self.players {
            player.clear_bet();
        }
        self.round = Some(BiddingRound::new());
        self.round_serial += 1;
    }

    /// Countdown tick from the room's timer task.
    pub fn tick_countdown(&mut self, now: Instant) -> Option<Phase> {
        if self.status != RoomStatus::InProgress {
            return None;
        }
        let round = self.round.as_mut()?;
        if round.phase() != Phase::Countdown {
            return None;
        }
        round.tick_countdown(now);
        Some(round.phase())
    }

    pub fn all_occupants_bet(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.has_bet())
    }

    /// Accept a bet stamped with the server receipt instant. The bet value
    /// is the clock time elapsed at receipt.
    pub fn place_bet(&mut self, player_id: &str, now: Instant) -> Result<BetOutcome, GameError> {
        if self.status != RoomStatus::InProgress {
            return Err(GameError::InvalidState(format!(
                "room {} has no round in progress",
                self.room_id
            )));
        }
        let Some(round) = self.round.as_ref() else {
            return Err(GameError::InvalidState(format!(
                "room {} has no active round",
                self.room_id
            )));
        };
        if round.phase() != Phase::Active {
            return Err(GameError::InvalidState(
                "bets are only accepted while the clock runs".to_string(),
            ));
        }
        let bet_seconds = round
            .elapsed_secs(now)
            .expect("active round has a clock start");

        let Some(player) = self.player_mut(player_id) else {
            return Err(GameError::NotFound(format!("player {player_id}")));
        };
        if player.has_bet() {
            return Err(GameError::AlreadyBet(player_id.to_string()));
        }
        let budget = player.remaining_budget();
        if bet_seconds > budget {
            return Err(GameError::InsufficientBudget {
                bet: bet_seconds,
                budget,
            });
        }
        player.commit_bet(bet_seconds);

        self.round
            .as_mut()
            .expect("round presence checked above")
            .record_bet(player_id, bet_seconds, now);

        Ok(BetOutcome {
            bet_seconds,
            all_bet: self.all_occupants_bet(),
        })
    }

    /// Adjudicate the active round. Returns the winner id once the round
    /// reaches RESULT.
    pub fn resolve_round(&mut self) -> Option<String> {
        self.round.as_mut()?.resolve()
    }

    /// Leave RESULT: either start the next round or finish the game. The
    /// game ends after the final round, or as soon as fewer than
    /// `min_players` players still hold a positive budget.
    pub fn advance_after_result(&mut self) -> RoundAdvance {
        let solvent = self
            .players
            .iter()
            .filter(|p| p.remaining_budget() > 0.0)
            .count();
        if self.current_round >= TOTAL_ROUNDS || solvent < self.min_players {
            self.status = RoomStatus::Finished;
            self.round = None;
            self.round_serial += 1;
            return RoundAdvance::Finished;
        }
        self.current_round += 1;
        self.begin_round();
        RoundAdvance::Next(self.current_round)
    }

    /// Bet values revealed with the round result.
    pub fn bet_reveals(&self) -> Vec<BetReveal> {
        self.round
            .as_ref()
            .map(|round| {
                round
                    .bets()
                    .iter()
                    .map(|b| BetReveal {
                        player_id: b.player_id.clone(),
                        bet_seconds: b.seconds,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            status: self.status,
            occupancy: self.players.len(),
            max_players: self.max_players,
        }
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        RoomSnapshot {
            room_id: self.room_id.clone(),
            room_name: self.room_name.clone(),
            status: self.status,
            max_players: self.max_players,
            current_round: self.current_round,
            phase: self.round.as_ref().map(|r| r.phase()),
            countdown: self
                .round
                .as_ref()
                .filter(|r| r.phase() == Phase::Countdown)
                .map(|r| r.countdown_remaining()),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    player_id: p.player_id.clone(),
                    display_name: p.display_name.clone(),
                    remaining_budget: p.remaining_budget(),
                    has_bet: p.has_bet(),
                })
                .collect(),
            winner_id: self
                .round
                .as_ref()
                .and_then(|r| r.winner_id().map(String::from)),
        }
    }
}
