// src/connection/handler.rs

//! Defines the `ConnectionHandler` which manages the full lifecycle of a WebSocket client.

use super::ConnectionGuard;
use crate::core::registry::{Connection, ConnectionId, OutboundReceiver};
use crate::core::session::InboundFrame;
use crate::core::state::ServerState;
use axum::extract::ws::{Message, WebSocket};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

/// Manages the full lifecycle of a WebSocket client.
pub struct ConnectionHandler {
    socket: WebSocket,
    addr: SocketAddr,
    state: Arc<ServerState>,
    shutdown_rx: broadcast::Receiver<()>,
}

impl ConnectionHandler {
    /// Creates a new `ConnectionHandler`.
    pub fn new(socket: WebSocket, addr: SocketAddr, state: Arc<ServerState>) -> Self {
        let shutdown_rx = state.shutdown_tx.subscribe();
        Self {
            socket,
            addr,
            state,
            shutdown_rx,
        }
    }

    /// Registers the connection, then processes inbound frames one at a time
    /// until the peer goes away or the server shuts down.
    ///
    /// Frames are handled sequentially: a long-running command delays only this
    /// connection's later commands.
    pub async fn run(self) {
        let Self {
            socket,
            addr,
            state,
            mut shutdown_rx,
        } = self;

        let connection_id = state.next_connection_id();
        info!("new websocket connection {} from {}", connection_id, addr);

        let (connection, outbound_rx) = Connection::new(connection_id, addr);
        let (ws_tx, mut ws_rx) = socket.split();
        let writer = tokio::spawn(write_outbound(ws_tx, outbound_rx, connection_id));

        state.registry.add(connection);
        let guard = ConnectionGuard::new(state.registry.clone(), connection_id, addr);

        loop {
            tokio::select! {
                // Prioritize shutdown signals over other events.
                biased;
                _ = shutdown_rx.recv() => {
                    info!("Connection {} received shutdown signal.", connection_id);
                    break;
                }
                result = ws_rx.next() => {
                    let frame = match result {
                        Some(Ok(Message::Text(text))) => InboundFrame::Text(text.to_string()),
                        Some(Ok(Message::Binary(data))) => InboundFrame::Binary(data),
                        Some(Ok(Message::Close(close))) => {
                            let reason = close.map(|c| c.reason.to_string()).unwrap_or_default();
                            info!("websocket connection {} closed: {}", connection_id, reason);
                            break;
                        }
                        // Ping/pong are answered by the WebSocket layer itself.
                        Some(Ok(_)) => continue,
                        Some(Err(e)) => {
                            warn!("Connection error for {} ({}): {}", connection_id, addr, e);
                            break;
                        }
                        None => {
                            debug!("Connection {} from {} closed by peer.", connection_id, addr);
                            break;
                        }
                    };
                    state.session.on_message(connection_id, frame).await;
                }
            }
        }

        // Unregistering drops the last queue sender, so the writer drains and exits.
        drop(guard);
        if let Err(e) = writer.await {
            warn!("Writer task for connection {} failed: {}", connection_id, e);
        }
    }
}

/// Forwards queued broadcast payloads to the socket as text frames.
///
/// Stops at the first write error; later broadcasts to this connection then
/// fail with a `DeliveryError` until the read side notices the close.
async fn write_outbound(
    mut ws_tx: SplitSink<WebSocket, Message>,
    mut outbound_rx: OutboundReceiver,
    connection_id: ConnectionId,
) {
    while let Some(payload) = outbound_rx.recv().await {
        if let Err(e) = ws_tx.send(Message::Text(payload.as_ref().into())).await {
            debug!("WebSocket send to {} failed: {}", connection_id, e);
            return;
        }
    }
    if let Err(e) = ws_tx.close().await {
        debug!("WebSocket close for {} failed: {}", connection_id, e);
    }
}
