use super::core::messages::{ClientMessage, ServerMessage};
use super::core::room::DEFAULT_MAX_PLAYERS;
use super::engine::{matchmaking, RoomRegistry};
use super::error::GameError;
use axum::extract::ws::{Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Context for a WebSocket connection, tracking the identified player.
struct ConnectionContext {
    player_id: Option<String>,
}

pub async fn handle_connection(socket: WebSocket, registry: Arc<RoomRegistry>) {
    info!("New WebSocket connection");
    let (mut sender, receiver) = socket.split();
    let (tx, mut rx) = broadcast::channel::<ServerMessage>(32);

    // Forward everything queued on the connection's channel to the socket
    let send_task = tokio::spawn(async move {
        while let Ok(msg) = rx.recv().await {
            debug!(?msg, "Sending message to client");
            let json = serde_json::to_string(&msg).unwrap();
            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let registry_clone = registry.clone();
    let recv_task = tokio::spawn(handle_incoming(receiver, tx, registry_clone));

    tokio::select! {
        _ = send_task => {},
        result = recv_task => {
            if let Ok(Some(player_id)) = result {
                registry.handle_disconnect(&player_id);
            }
        },
    }

    info!("WebSocket connection closed");
}

async fn handle_incoming(
    mut receiver: futures_util::stream::SplitStream<WebSocket>,
    tx: broadcast::Sender<ServerMessage>,
    registry: Arc<RoomRegistry>,
) -> Option<String> {
    let mut ctx = ConnectionContext { player_id: None };

    while let Some(Ok(msg)) = receiver.next().await {
        let Message::Text(text) = msg else {
            debug!("Received non-text message, ignoring");
            continue;
        };

        debug!(raw = %text, "Received message");

        let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) else {
            warn!(raw = %text, "Failed to parse client message");
            continue;
        };

        handle_message(client_msg, &tx, &registry, &mut ctx);
    }

    ctx.player_id
}

fn handle_message(
    msg: ClientMessage,
    tx: &broadcast::Sender<ServerMessage>,
    registry: &Arc<RoomRegistry>,
    ctx: &mut ConnectionContext,
) {
    match msg {
        ClientMessage::CreateRoom {
            room_name,
            player_id,
            max_players,
        } => {
            identify(ctx, registry, &player_id, tx);
            let summary =
                registry.create_room(&room_name, max_players.unwrap_or(DEFAULT_MAX_PLAYERS));
            reply(
                tx,
                ServerMessage::RoomCreated {
                    room_id: summary.room_id,
                },
            );
        }
        ClientMessage::JoinRoom { room_id, player_id } => {
            identify(ctx, registry, &player_id, tx);
            // On success the joiner hears about it through the room topic
            if let Err(err) = registry.join_room(&room_id, &player_id) {
                reject(tx, err);
            }
        }
        ClientMessage::LeaveRoom { room_id, player_id } => {
            identify(ctx, registry, &player_id, tx);
            if let Err(err) = registry.leave_room(&room_id, &player_id) {
                reject(tx, err);
            }
        }
        ClientMessage::PlaceBet { room_id, player_id } => {
            identify(ctx, registry, &player_id, tx);
            // The bet value is the clock time at receipt, stamped here
            let received_at = Instant::now();
            match registry.place_bet(&room_id, &player_id, received_at) {
                Ok(bet_seconds) => reply(tx, ServerMessage::BetAccepted { bet_seconds }),
                Err(err) => reject(tx, err),
            }
        }
        ClientMessage::QuickJoin { player_id } => {
            identify(ctx, registry, &player_id, tx);
            if let Err(err) = matchmaking::quick_join(registry, &player_id) {
                reject(tx, err);
            }
        }
        ClientMessage::ListRooms => {
            reply(
                tx,
                ServerMessage::RoomList {
                    rooms: registry.list_rooms(),
                },
            );
        }
    }
}

/// Bind the connection to a player and subscribe them to broadcasts.
fn identify(
    ctx: &mut ConnectionContext,
    registry: &RoomRegistry,
    player_id: &str,
    tx: &broadcast::Sender<ServerMessage>,
) {
    ctx.player_id = Some(player_id.to_string());
    registry.register_channel(player_id, tx.clone());
}

fn reply(tx: &broadcast::Sender<ServerMessage>, msg: ServerMessage) {
    if tx.send(msg).is_err() {
        debug!(error = %GameError::TransportUnavailable, "Reply dropped");
    }
}

/// Rejections go only to the connection that issued the intent.
fn reject(tx: &broadcast::Sender<ServerMessage>, err: GameError) {
    warn!(code = err.code(), %err, "Intent rejected");
    reply(
        tx,
        ServerMessage::Error {
            code: err.code().to_string(),
            message: err.to_string(),
        },
    );
}
