pub mod game;

pub use game::messages;
pub use game::engine::RoundTiming;

use axum::{
    Json, Router,
    extract::{Path, Query, State, WebSocketUpgrade, ws::WebSocket},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use game::core::messages::{RoomSnapshot, RoomSummary};
use game::engine::{RoomRegistry, matchmaking};
use game::error::GameError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

async fn health() -> &'static str {
    "ok"
}

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<RoomRegistry>,
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    game::ws::handle_connection(socket, state.registry).await;
}

#[derive(Debug, Serialize)]
struct RoomListBody {
    rooms: Vec<RoomSummary>,
}

#[derive(Debug, Deserialize)]
struct ListRoomsParams {
    /// Restrict to rooms a player could join right now.
    #[serde(default)]
    available: bool,
}

async fn list_rooms(
    Query(params): Query<ListRoomsParams>,
    State(state): State<AppState>,
) -> Json<RoomListBody> {
    let rooms = if params.available {
        state.registry.available_rooms()
    } else {
        state.registry.list_rooms()
    };
    Json(RoomListBody { rooms })
}

async fn room_detail(
    Path(room_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<RoomSnapshot>, StatusCode> {
    state
        .registry
        .room_snapshot(&room_id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

#[derive(Debug, Deserialize)]
struct QuickJoinParams {
    player_id: String,
}

async fn quick_join(
    Query(params): Query<QuickJoinParams>,
    State(state): State<AppState>,
) -> Result<Json<RoomSnapshot>, (StatusCode, String)> {
    matchmaking::quick_join(&state.registry, &params.player_id)
        .map(Json)
        .map_err(|err| (error_status(&err), err.to_string()))
}

fn error_status(err: &GameError) -> StatusCode {
    match err {
        GameError::NotFound(_) => StatusCode::NOT_FOUND,
        GameError::RoomFull(_)
        | GameError::InvalidState(_)
        | GameError::AlreadyBet(_)
        | GameError::InsufficientBudget { .. } => StatusCode::CONFLICT,
        GameError::TransportUnavailable => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn app() -> Router {
    app_with_config(None)
}

/// Build the service, optionally overriding round timing (tests shrink the
/// countdown and result delays to milliseconds).
pub fn app_with_config(timing: Option<RoundTiming>) -> Router {
    let state = AppState {
        registry: Arc::new(RoomRegistry::new(timing)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/rooms", get(list_rooms))
        .route("/rooms/:room_id", get(room_detail))
        .route("/quick-join", post(quick_join))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
