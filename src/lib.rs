pub mod error;
pub mod game;
pub mod leaderboard;

pub use game::messages;

use axum::{
    Json, Router,
    extract::{Query, State, WebSocketUpgrade, ws::WebSocket},
    http::{HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use game::connection::{MAX_FRAME_SIZE, run_connection};
use game::participant::display_name_or_default;
use game::{Coordinator, CoordinatorHandle, HeartbeatConfig};
use leaderboard::Leaderboard;
use serde::Deserialize;
use sqlx::SqlitePool;
use tower_http::cors::CorsLayer;
use tracing::{error, warn};

async fn health() -> &'static str {
    "ok"
}

#[derive(Clone)]
pub struct AppState {
    pub coordinator: CoordinatorHandle,
    pub leaderboard: Leaderboard,
    pub heartbeat: HeartbeatConfig,
}

#[derive(Debug, Deserialize)]
pub struct ConnectParams {
    pub username: Option<String>,
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<ConnectParams>,
    State(state): State<AppState>,
) -> Response {
    let display_name = display_name_or_default(params.username.as_deref());
    ws.max_message_size(MAX_FRAME_SIZE)
        .max_frame_size(MAX_FRAME_SIZE)
        .on_failed_upgrade(|err| warn!(%err, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state, display_name))
}

async fn handle_socket(socket: WebSocket, state: AppState, display_name: String) {
    run_connection(socket, state.coordinator, display_name, state.heartbeat).await;
}

async fn leaderboard_handler(State(state): State<AppState>) -> Response {
    match state.leaderboard.standings().await {
        Ok(standings) => Json(standings).into_response(),
        Err(err) => {
            error!(%err, "Failed to load leaderboard");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Failed to load leaderboard" })),
            )
                .into_response()
        }
    }
}

/// CORS for the single browser origin allowed to call the HTTP routes
pub fn cors(origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);
    match origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(err) => {
            warn!(origin, %err, "Invalid CORS origin, cross-origin requests disabled");
            layer
        }
    }
}

pub fn app(pool: SqlitePool) -> Router {
    app_with_config(pool, None)
}

pub fn app_with_config(pool: SqlitePool, heartbeat: Option<HeartbeatConfig>) -> Router {
    let leaderboard = Leaderboard::new(pool);
    let state = AppState {
        coordinator: Coordinator::spawn(leaderboard.clone()),
        leaderboard,
        heartbeat: heartbeat.unwrap_or_default(),
    };

    Router::new()
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/leaderboard", get(leaderboard_handler))
        .with_state(state)
}
