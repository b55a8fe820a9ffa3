//! Round progression timers.
//!
//! Each room drives its own countdown and result-display waits as plain
//! spawned sleeps; no global clock thread exists. Every task captures the
//! round serial it was started for and bails out when the room is gone or
//! a newer round instance has replaced it.

use super::registry::RoomRegistry;
use crate::game::core::messages::ServerMessage;
use crate::game::core::room::RoundAdvance;
use crate::game::core::round::Phase;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

pub const DEFAULT_COUNTDOWN_TICK: Duration = Duration::from_secs(1);
pub const DEFAULT_RESULT_DELAY: Duration = Duration::from_secs(3);

/// Timer cadence for a room's rounds, injectable so tests can shrink it.
#[derive(Debug, Clone, Copy)]
pub struct RoundTiming {
    pub countdown_tick: Duration,
    pub result_delay: Duration,
}

impl Default for RoundTiming {
    fn default() -> Self {
        Self {
            countdown_tick: DEFAULT_COUNTDOWN_TICK,
            result_delay: DEFAULT_RESULT_DELAY,
        }
    }
}

/// Tick the countdown once per interval, broadcasting each tick, until the
/// round clock starts.
pub(crate) fn spawn_countdown(registry: Arc<RoomRegistry>, room_id: String, serial: u64) {
    let tick = registry.timing().countdown_tick;
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(tick).await;

            let (snapshot, activated) = {
                let Some(mut room) = registry.room_mut(&room_id) else {
                    return;
                };
                if room.round_serial() != serial {
                    // A restart or a new round replaced this instance
                    return;
                }
                let Some(phase) = room.tick_countdown(Instant::now()) else {
                    return;
                };
                (room.snapshot(), phase == Phase::Active)
            };

            registry.broadcast_snapshot(&snapshot);
            if activated {
                info!(room_id, "Round clock started");
                return;
            }
        }
    });
}

/// Adjudicate a round whose last outstanding bet just arrived (or whose
/// last non-bettor left): pick the winner, reveal the bets, and schedule
/// the advance out of RESULT.
pub(crate) fn complete_round(registry: &Arc<RoomRegistry>, room_id: &str) {
    let (result, snapshot, serial) = {
        let Some(mut room) = registry.room_mut(room_id) else {
            return;
        };
        let Some(winner_id) = room.resolve_round() else {
            return;
        };
        let result = ServerMessage::RoundResult {
            round: room.current_round(),
            winner_id,
            bets: room.bet_reveals(),
        };
        (result, room.snapshot(), room.round_serial())
    };

    info!(
        room_id,
        round = snapshot.current_round,
        winner = ?snapshot.winner_id,
        "Round resolved"
    );
    registry.send_to_room_players(&snapshot, result);
    registry.broadcast_snapshot(&snapshot);
    spawn_result_delay(registry.clone(), room_id.to_string(), serial);
}

/// Hold the RESULT display, then start the next round or finish the game.
fn spawn_result_delay(registry: Arc<RoomRegistry>, room_id: String, serial: u64) {
    let delay = registry.timing().result_delay;
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        advance_room(registry, room_id, serial);
    });
}

fn advance_room(registry: Arc<RoomRegistry>, room_id: String, serial: u64) {
    let (snapshot, next_serial) = {
        let Some(mut room) = registry.room_mut(&room_id) else {
            return;
        };
        if room.round_serial() != serial {
            return;
        }
        if room.round().map(|r| r.phase()) != Some(Phase::Result) {
            return;
        }
        let next_serial = match room.advance_after_result() {
            RoundAdvance::Next(_) => Some(room.round_serial()),
            RoundAdvance::Finished => None,
        };
        (room.snapshot(), next_serial)
    };

    registry.broadcast_snapshot(&snapshot);
    match next_serial {
        Some(serial) => {
            info!(room_id, round = snapshot.current_round, "Starting next round");
            spawn_countdown(registry, room_id, serial);
        }
        None => {
            info!(room_id, "Game finished");
            // Status change is lobby-visible
            registry.broadcast_room_list();
        }
    }
}
