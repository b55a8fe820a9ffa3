use super::room::RoomStatus;
use super::round::Phase;
use serde::{Deserialize, Serialize};

/// Client intents arriving over the WebSocket.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        room_name: String,
        player_id: String,
        #[serde(default)]
        max_players: Option<usize>,
    },
    JoinRoom {
        room_id: String,
        player_id: String,
    },
    LeaveRoom {
        room_id: String,
        player_id: String,
    },
    PlaceBet {
        room_id: String,
        player_id: String,
    },
    QuickJoin {
        player_id: String,
    },
    ListRooms,
}

/// Lobby-facing summary of a room, pushed on the `rooms` topic.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSummary {
    pub room_id: String,
    pub room_name: String,
    pub status: RoomStatus,
    pub occupancy: usize,
    pub max_players: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerSnapshot {
    pub player_id: String,
    pub display_name: String,
    pub remaining_budget: f64,
    pub has_bet: bool,
}

/// Full game-state snapshot, pushed on a room's topic. Bet values stay
/// hidden until the round result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshot {
    pub room_id: String,
    pub room_name: String,
    pub status: RoomStatus,
    pub max_players: usize,
    pub current_round: u32,
    pub phase: Option<Phase>,
    pub countdown: Option<u32>,
    pub players: Vec<PlayerSnapshot>,
    pub winner_id: Option<String>,
}

/// A bet revealed with the round result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BetReveal {
    pub player_id: String,
    pub bet_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Current summary list; sent on any registry change and as the reply
    /// to `list_rooms`.
    RoomList { rooms: Vec<RoomSummary> },
    RoomCreated { room_id: String },
    RoomState { room: RoomSnapshot },
    /// Private ack to the bidder carrying the committed value.
    BetAccepted { bet_seconds: f64 },
    RoundResult {
        round: u32,
        winner_id: String,
        bets: Vec<BetReveal>,
    },
    /// An unpayable bid aborted the round; a fresh countdown follows.
    RoundRestarted,
    Error { code: String, message: String },
}
