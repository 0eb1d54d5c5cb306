// src/server/routes.rs

//! The HTTP surface of the relay: index page, WebSocket upgrade, host statistics,
//! device list, uploads and static files.

use super::uploads;
use crate::connection::ConnectionHandler;
use crate::core::HostwatchError;
use crate::core::metrics;
use crate::core::state::ServerState;
use crate::core::system_stats::SystemSnapshot;
use axum::{
    Router,
    extract::{ConnectInfo, State, WebSocketUpgrade},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tracing::{error, warn};

/// Builds the gateway router around the shared state.
///
/// The `/ws` route needs `ConnectInfo<SocketAddr>`, so the router must be served
/// with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn build_router(state: Arc<ServerState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);
    Router::new()
        .route("/", get(index_handler))
        .route("/ws", get(ws_handler))
        .route("/system_stats", get(system_stats_handler))
        .route("/lsusb", get(device_list_handler))
        .route("/upload_file", post(uploads::upload_file_handler))
        .route("/upload_json", post(uploads::upload_json_handler))
        .nest_service("/static", static_files)
        .with_state(state)
}

async fn index_handler(State(state): State<Arc<ServerState>>) -> Html<String> {
    Html(state.render_index())
}

/// Upgrades the request and hands the socket to its own connection task.
async fn ws_handler(
    ws: WebSocketUpgrade,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    State(state): State<Arc<ServerState>>,
) -> Response {
    metrics::CONNECTIONS_RECEIVED_TOTAL.inc();
    ws.on_upgrade(move |socket| ConnectionHandler::new(socket, addr, state).run())
}

async fn system_stats_handler() -> Result<String, HostwatchError> {
    let snapshot = tokio::task::spawn_blocking(SystemSnapshot::collect)
        .await?
        .inspect_err(|e| error!("Failed to collect system stats: {}", e))?;
    Ok(snapshot.to_string())
}

/// Runs the configured inventory command. Takes no input from the caller.
async fn device_list_handler(State(state): State<Arc<ServerState>>) -> Response {
    let output = state
        .session
        .runner()
        .run(&state.config.device_command)
        .await;
    if output.is_spawn_failure() {
        warn!(
            "Device list command '{}' could not be started.",
            state.config.device_command
        );
        (StatusCode::INTERNAL_SERVER_ERROR, output.into_text()).into_response()
    } else {
        output.into_text().into_response()
    }
}
