use chronobid::RoundTiming;
use chronobid::messages::{ClientMessage, ServerMessage};
use futures_util::StreamExt;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct TestServer {
    base_url: String,
}

impl TestServer {
    pub fn ws_url(&self) -> String {
        format!("{}/ws", self.base_url)
    }

    pub fn http_url(&self, path: &str) -> String {
        format!(
            "http://{}{}",
            self.base_url.strip_prefix("ws://").unwrap(),
            path
        )
    }
}

pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with_timing(None).await
}

pub async fn spawn_test_server_with_timing(timing: Option<RoundTiming>) -> TestServer {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let app = chronobid::app_with_config(timing);
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("ws://{}", addr),
    }
}

/// Round timing shrunk so a whole round fits in a test.
pub fn fast_timing() -> RoundTiming {
    RoundTiming {
        countdown_tick: Duration::from_millis(20),
        result_delay: Duration::from_millis(40),
    }
}

pub async fn connect(server: &TestServer) -> WsStream {
    let (ws, _) = connect_async(&server.ws_url()).await.expect("Failed to connect");
    ws
}

pub fn create_room_msg(room_name: &str, player_id: &str, max_players: Option<usize>) -> Message {
    let json = serde_json::to_string(&ClientMessage::CreateRoom {
        room_name: room_name.to_string(),
        player_id: player_id.to_string(),
        max_players,
    })
    .unwrap();
    Message::Text(json.into())
}

pub fn join_room_msg(room_id: &str, player_id: &str) -> Message {
    let json = serde_json::to_string(&ClientMessage::JoinRoom {
        room_id: room_id.to_string(),
        player_id: player_id.to_string(),
    })
    .unwrap();
    Message::Text(json.into())
}

pub fn leave_room_msg(room_id: &str, player_id: &str) -> Message {
    let json = serde_json::to_string(&ClientMessage::LeaveRoom {
        room_id: room_id.to_string(),
        player_id: player_id.to_string(),
    })
    .unwrap();
    Message::Text(json.into())
}

pub fn place_bet_msg(room_id: &str, player_id: &str) -> Message {
    let json = serde_json::to_string(&ClientMessage::PlaceBet {
        room_id: room_id.to_string(),
        player_id: player_id.to_string(),
    })
    .unwrap();
    Message::Text(json.into())
}

pub fn quick_join_msg(player_id: &str) -> Message {
    let json = serde_json::to_string(&ClientMessage::QuickJoin {
        player_id: player_id.to_string(),
    })
    .unwrap();
    Message::Text(json.into())
}

pub async fn recv(ws: &mut WsStream) -> ServerMessage {
    let msg = ws.next().await.unwrap().unwrap();
    serde_json::from_str(msg.to_text().unwrap()).unwrap()
}

/// Read messages until one matches; countdown ticks make exact sequences
/// brittle.
pub async fn recv_until<F>(ws: &mut WsStream, pred: F) -> ServerMessage
where
    F: Fn(&ServerMessage) -> bool,
{
    for _ in 0..200 {
        let msg = recv(ws).await;
        if pred(&msg) {
            return msg;
        }
    }
    panic!("expected message not received");
}
