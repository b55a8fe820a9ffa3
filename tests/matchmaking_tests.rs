mod common;

use chronobid::game::core::{Phase, RoomStatus};
use chronobid::messages::ServerMessage;
use common::*;
use futures_util::SinkExt;

#[tokio::test]
async fn quick_join_creates_a_room_when_none_exist() {
    let server = spawn_test_server().await;
    let mut ws = connect(&server).await;

    ws.send(quick_join_msg("alice")).await.unwrap();

    let state = recv_until(&mut ws, |m| matches!(m, ServerMessage::RoomState { .. })).await;
    let ServerMessage::RoomState { room } = state else { unreachable!() };
    assert_eq!(room.room_name, "Quick Match");
    assert_eq!(room.status, RoomStatus::Waiting);
    assert_eq!(room.players.len(), 1);
    assert_eq!(room.players[0].player_id, "alice");
}

#[tokio::test]
async fn second_quick_join_shares_the_room() {
    let server = spawn_test_server().await;

    let mut alice = connect(&server).await;
    alice.send(quick_join_msg("alice")).await.unwrap();
    let ServerMessage::RoomState { room: first } =
        recv_until(&mut alice, |m| matches!(m, ServerMessage::RoomState { .. })).await
    else {
        unreachable!()
    };

    let mut bob = connect(&server).await;
    bob.send(quick_join_msg("bob")).await.unwrap();
    let ServerMessage::RoomState { room: second } =
        recv_until(&mut bob, |m| matches!(m, ServerMessage::RoomState { .. })).await
    else {
        unreachable!()
    };

    assert_eq!(first.room_id, second.room_id);
    assert_eq!(second.players.len(), 2);

    // Exactly one room exists
    let list = recv_until(&mut bob, |m| matches!(m, ServerMessage::RoomList { .. })).await;
    let ServerMessage::RoomList { rooms } = list else { unreachable!() };
    assert_eq!(rooms.len(), 1);
}

#[tokio::test]
async fn quick_join_fills_a_room_and_starts_the_game() {
    let server = spawn_test_server_with_timing(Some(fast_timing())).await;

    let mut sockets = Vec::new();
    for name in ["p0", "p1", "p2", "p3"] {
        let mut ws = connect(&server).await;
        ws.send(quick_join_msg(name)).await.unwrap();
        recv_until(&mut ws, |m| matches!(m, ServerMessage::RoomState { .. })).await;
        sockets.push(ws);
    }

    // The default room seats four; the fourth join starts the countdown
    for ws in &mut sockets {
        recv_until(ws, |m| {
            matches!(m, ServerMessage::RoomState { room }
                if room.status == RoomStatus::InProgress && room.phase == Some(Phase::Countdown))
        })
        .await;
    }
}

#[tokio::test]
async fn fifth_quick_join_opens_a_second_room() {
    let server = spawn_test_server().await;

    // Keep the sockets alive; dropping one counts as leaving
    let mut sockets = Vec::new();
    for name in ["p0", "p1", "p2", "p3"] {
        let mut ws = connect(&server).await;
        ws.send(quick_join_msg(name)).await.unwrap();
        recv_until(&mut ws, |m| matches!(m, ServerMessage::RoomState { .. })).await;
        sockets.push(ws);
    }

    let mut fifth = connect(&server).await;
    fifth.send(quick_join_msg("p4")).await.unwrap();

    let state = recv_until(&mut fifth, |m| matches!(m, ServerMessage::RoomState { .. })).await;
    let ServerMessage::RoomState { room } = state else { unreachable!() };
    assert_eq!(room.players.len(), 1);
    assert_eq!(room.players[0].player_id, "p4");
    assert_eq!(room.status, RoomStatus::Waiting);
}
