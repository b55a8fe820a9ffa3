use super::registry::RoomRegistry;
use crate::game::core::messages::RoomSnapshot;
use crate::game::core::room::DEFAULT_MAX_PLAYERS;
use crate::game::error::GameError;
use std::sync::Arc;
use tracing::{debug, info};

pub const QUICK_JOIN_ROOM_NAME: &str = "Quick Match";

/// Seat a player in the oldest joinable room, creating a fresh one when no
/// candidate accepts. The occupancy check and the seat insert happen under
/// each room's own entry lock, so two concurrent quick-joins can never both
/// be handed the last seat; the loser of the race moves on.
pub fn quick_join(registry: &Arc<RoomRegistry>, player_id: &str) -> Result<RoomSnapshot, GameError> {
    if let Some(room_id) = registry.player_room(player_id) {
        return Err(GameError::InvalidState(format!(
            "player {player_id} is already in room {room_id}"
        )));
    }

    for candidate in registry.available_rooms() {
        match registry.join_room(&candidate.room_id, player_id) {
            Ok(snapshot) => {
                info!(room_id = candidate.room_id, player_id, "Quick join seated player");
                return Ok(snapshot);
            }
            // Lost the race for this room; try the next candidate
            Err(GameError::RoomFull(_))
            | Err(GameError::InvalidState(_))
            | Err(GameError::NotFound(_)) => {
                debug!(room_id = candidate.room_id, "Quick join candidate no longer joinable");
            }
            Err(err) => return Err(err),
        }
    }

    let created = registry.create_room(QUICK_JOIN_ROOM_NAME, DEFAULT_MAX_PLAYERS);
    info!(room_id = created.room_id, player_id, "Quick join created a room");
    registry.join_room(&created.room_id, player_id)
}
