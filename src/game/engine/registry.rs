use super::driver::{self, RoundTiming};
use crate::game::core::messages::{RoomSnapshot, RoomSummary, ServerMessage};
use crate::game::core::room::{Room, RoomStatus};
use crate::game::error::GameError;
use dashmap::DashMap;
use dashmap::mapref::one::RefMut;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info};

/// Effect of a bet attempt computed under the room lock, applied after it
/// is released (list/room broadcasts must never run while a room entry is
/// held).
enum BetEffect {
    Accepted {
        bet_seconds: f64,
        all_bet: bool,
        snapshot: RoomSnapshot,
    },
    Restarted {
        error: GameError,
        serial: u64,
        snapshot: RoomSnapshot,
    },
}

/// Process-wide catalog of rooms plus the outbound channel of every
/// connected player. A room's mutable state is only ever touched through
/// its map entry, which serializes all operations on that room; rooms
/// progress independently of each other.
pub struct RoomRegistry {
    rooms: DashMap<String, Room>,
    player_rooms: DashMap<String, String>, // player_id -> room_id
    channels: DashMap<String, broadcast::Sender<ServerMessage>>,
    timing: RoundTiming,
}

impl RoomRegistry {
    pub fn new(timing: Option<RoundTiming>) -> Self {
        Self {
            rooms: DashMap::new(),
            player_rooms: DashMap::new(),
            channels: DashMap::new(),
            timing: timing.unwrap_or_default(),
        }
    }

    pub(crate) fn timing(&self) -> RoundTiming {
        self.timing
    }

    pub(crate) fn room_mut(&self, room_id: &str) -> Option<RefMut<'_, String, Room>> {
        self.rooms.get_mut(room_id)
    }

    pub fn register_channel(&self, player_id: &str, tx: broadcast::Sender<ServerMessage>) {
        debug!(player_id, "Registering player channel");
        self.channels.insert(player_id.to_string(), tx);
    }

    pub fn player_room(&self, player_id: &str) -> Option<String> {
        self.player_rooms.get(player_id).map(|r| r.clone())
    }

    /// Allocate a new WAITING room and announce it on the rooms topic.
    pub fn create_room(&self, room_name: &str, max_players: usize) -> RoomSummary {
        let room_id = uuid::Uuid::new_v4().to_string();
        let room = Room::new(room_id.clone(), room_name.to_string(), max_players);
        let summary = room.summary();
        self.rooms.insert(room_id.clone(), room);

        info!(room_id, room_name, "Room created");
        self.broadcast_room_list();
        summary
    }

    /// All rooms, oldest-created first.
    pub fn list_rooms(&self) -> Vec<RoomSummary> {
        let mut rooms: Vec<(Instant, RoomSummary)> = self
            .rooms
            .iter()
            .map(|room| (room.created_at(), room.summary()))
            .collect();
        rooms.sort_by_key(|(created_at, _)| *created_at);
        rooms.into_iter().map(|(_, summary)| summary).collect()
    }

    /// Rooms a player could be seated in right now.
    pub fn available_rooms(&self) -> Vec<RoomSummary> {
        self.list_rooms()
            .into_iter()
            .filter(|room| room.status == RoomStatus::Waiting && room.occupancy < room.max_players)
            .collect()
    }

    pub fn room_snapshot(&self, room_id: &str) -> Option<RoomSnapshot> {
        self.rooms.get(room_id).map(|room| room.snapshot())
    }

    /// Drop a room once it is empty. Occupied rooms are left untouched.
    pub fn remove_room(&self, room_id: &str) {
        if self.rooms.remove_if(room_id, |_, room| room.is_empty()).is_some() {
            info!(room_id, "Room removed");
            self.broadcast_room_list();
        }
    }

    /// Seat a player; filling the last seat starts round 1. The occupancy
    /// check and the insert happen under the room's entry lock.
    pub fn join_room(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
    ) -> Result<RoomSnapshot, GameError> {
        if self.player_rooms.contains_key(player_id) {
            return Err(GameError::InvalidState(format!(
                "player {player_id} is already in a room"
            )));
        }

        let (snapshot, started, serial) = {
            let mut room = self
                .rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::NotFound(format!("room {room_id}")))?;
            let outcome = room.join(player_id)?;
            (room.snapshot(), outcome.started, room.round_serial())
        };
        self.player_rooms
            .insert(player_id.to_string(), room_id.to_string());

        info!(room_id, player_id, occupancy = snapshot.players.len(), "Player joined");
        self.broadcast_snapshot(&snapshot);
        self.broadcast_room_list();

        if started {
            info!(room_id, "Room is full, starting round 1");
            driver::spawn_countdown(self.clone(), room_id.to_string(), serial);
        }
        Ok(snapshot)
    }

    /// Unseat a player. The last player out destroys the room; a leave
    /// during an active round re-checks bet completeness against the
    /// players still seated.
    pub fn leave_room(self: &Arc<Self>, room_id: &str, player_id: &str) -> Result<(), GameError> {
        let (outcome, snapshot) = {
            let mut room = self
                .rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::NotFound(format!("room {room_id}")))?;
            let outcome = room.leave(player_id)?;
            (outcome, room.snapshot())
        };
        self.player_rooms.remove(player_id);
        info!(room_id, player_id, "Player left");

        if outcome.now_empty {
            self.remove_room(room_id);
            return Ok(());
        }

        self.broadcast_snapshot(&snapshot);
        self.broadcast_room_list();

        if outcome.round_resolvable {
            driver::complete_round(self, room_id);
        }
        Ok(())
    }

    /// Accept a bet stamped at server receipt. An unpayable bid aborts the
    /// round and restarts it from the countdown for the whole room.
    pub fn place_bet(
        self: &Arc<Self>,
        room_id: &str,
        player_id: &str,
        received_at: Instant,
    ) -> Result<f64, GameError> {
        let effect = {
            let mut room = self
                .rooms
                .get_mut(room_id)
                .ok_or_else(|| GameError::NotFound(format!("room {room_id}")))?;
            match room.place_bet(player_id, received_at) {
                Ok(outcome) => BetEffect::Accepted {
                    bet_seconds: outcome.bet_seconds,
                    all_bet: outcome.all_bet,
                    snapshot: room.snapshot(),
                },
                Err(error @ GameError::InsufficientBudget { .. }) => {
                    room.begin_round();
                    BetEffect::Restarted {
                        error,
                        serial: room.round_serial(),
                        snapshot: room.snapshot(),
                    }
                }
                Err(err) => return Err(err),
            }
        };

        match effect {
            BetEffect::Accepted {
                bet_seconds,
                all_bet,
                snapshot,
            } => {
                info!(room_id, player_id, bet_seconds, "Bet accepted");
                self.broadcast_snapshot(&snapshot);
                if all_bet {
                    driver::complete_round(self, room_id);
                }
                Ok(bet_seconds)
            }
            BetEffect::Restarted {
                error,
                serial,
                snapshot,
            } => {
                info!(room_id, player_id, %error, "Unpayable bid, restarting round");
                self.send_to_room_players(&snapshot, ServerMessage::RoundRestarted);
                self.broadcast_snapshot(&snapshot);
                driver::spawn_countdown(self.clone(), room_id.to_string(), serial);
                Err(error)
            }
        }
    }

    /// A closed connection counts as leaving whatever room the player
    /// occupied.
    pub fn handle_disconnect(self: &Arc<Self>, player_id: &str) {
        info!(player_id, "Player disconnected");
        if let Some(room_id) = self.player_room(player_id) {
            let _ = self.leave_room(&room_id, player_id);
        }
        self.channels.remove(player_id);
    }

    pub(crate) fn send_to_player(&self, player_id: &str, msg: ServerMessage) {
        if let Some(tx) = self.channels.get(player_id) {
            let _ = tx.send(msg);
        }
    }

    pub(crate) fn send_to_room_players(&self, snapshot: &RoomSnapshot, msg: ServerMessage) {
        for player in &snapshot.players {
            self.send_to_player(&player.player_id, msg.clone());
        }
    }

    /// Push a game-state snapshot to every player seated in the room.
    pub(crate) fn broadcast_snapshot(&self, snapshot: &RoomSnapshot) {
        debug!(room_id = %snapshot.room_id, "Broadcasting room state");
        self.send_to_room_players(
            snapshot,
            ServerMessage::RoomState {
                room: snapshot.clone(),
            },
        );
    }

    /// Push the current summary list to every registered connection.
    pub(crate) fn broadcast_room_list(&self) {
        let msg = ServerMessage::RoomList {
            rooms: self.list_rooms(),
        };
        for entry in self.channels.iter() {
            let _ = entry.value().send(msg.clone());
        }
    }
}
