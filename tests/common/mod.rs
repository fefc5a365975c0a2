#![allow(dead_code)]

use fourinrow::game::HeartbeatConfig;
use fourinrow::messages::{ClientMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use sqlx::SqlitePool;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};

pub type WsStream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

pub struct TestServer {
    base_url: String,
    pub pool: SqlitePool,
}

impl TestServer {
    pub fn ws_url(&self, username: Option<&str>) -> String {
        match username {
            Some(name) => format!("{}/ws?username={}", self.base_url, name),
            None => format!("{}/ws", self.base_url),
        }
    }

    pub fn http_url(&self, path: &str) -> String {
        format!(
            "http://{}{}",
            self.base_url.strip_prefix("ws://").unwrap(),
            path
        )
    }
}

pub async fn memory_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:").await.unwrap();
    sqlx::migrate!().run(&pool).await.unwrap();
    pool
}

pub async fn spawn_test_server() -> TestServer {
    spawn_test_server_with_heartbeat(None).await
}

pub async fn spawn_test_server_with_heartbeat(heartbeat: Option<HeartbeatConfig>) -> TestServer {
    let pool = memory_pool().await;

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let app_pool = pool.clone();
    tokio::spawn(async move {
        let app = fourinrow::app_with_config(app_pool, heartbeat);
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        base_url: format!("ws://{}", addr),
        pool,
    }
}

pub async fn connect(server: &TestServer, username: &str) -> WsStream {
    let (ws, _) = connect_async(server.ws_url(Some(username)))
        .await
        .expect("Failed to connect");
    ws
}

pub fn move_msg(column: i64) -> Message {
    let json = serde_json::to_string(&ClientMessage::Move { column }).unwrap();
    Message::Text(json.into())
}

pub fn pong_msg() -> Message {
    let json = serde_json::to_string(&ClientMessage::Pong).unwrap();
    Message::Text(json.into())
}

/// Next server frame, skipping heartbeats
pub async fn recv(ws: &mut WsStream) -> ServerMessage {
    loop {
        let msg = tokio::time::timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("Timed out waiting for a frame")
            .unwrap()
            .unwrap();
        let parsed: ServerMessage = serde_json::from_str(msg.to_text().unwrap()).unwrap();
        if parsed != ServerMessage::Ping {
            return parsed;
        }
    }
}

/// Assert nothing but heartbeats arrives within `window`
pub async fn expect_silence(ws: &mut WsStream, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;
    loop {
        match tokio::time::timeout_at(deadline, ws.next()).await {
            Err(_) => return,
            Ok(Some(Ok(Message::Text(text)))) => {
                let parsed: ServerMessage = serde_json::from_str(&text).unwrap();
                assert_eq!(parsed, ServerMessage::Ping, "unexpected frame");
            }
            Ok(other) => panic!("unexpected event: {:?}", other),
        }
    }
}

/// Connect two players and consume their start and initial state frames.
/// `b` connects first and waits, so `a` arrives second and takes side A.
/// Returns (side A, side B, session id).
pub async fn start_game(server: &TestServer, a: &str, b: &str) -> (WsStream, WsStream, String) {
    let mut ws_b = connect(server, b).await;
    // Make sure B is waiting before A arrives
    tokio::time::sleep(Duration::from_millis(50)).await;
    let mut ws_a = connect(server, a).await;

    let mut session_id = String::new();
    for ws in [&mut ws_a, &mut ws_b] {
        assert!(matches!(recv(ws).await, ServerMessage::Start { .. }));
        let ServerMessage::State { session_id: id, .. } = recv(ws).await else {
            panic!("Expected State");
        };
        session_id = id;
    }

    (ws_a, ws_b, session_id)
}

pub async fn send(ws: &mut WsStream, msg: Message) {
    ws.send(msg).await.unwrap();
}
