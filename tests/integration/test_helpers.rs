// tests/integration/test_helpers.rs

//! Test helpers and utilities for integration tests

use futures::{SinkExt, StreamExt};
use hostwatch::config::Config;
use hostwatch::core::state::ServerState;
use hostwatch::server;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

pub type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// A running server bound to an ephemeral localhost port.
pub struct TestServer {
    pub state: Arc<ServerState>,
    pub addr: SocketAddr,
    pub upload_dir: TempDir,
    handle: JoinHandle<std::io::Result<()>>,
}

impl TestServer {
    /// Starts a server with a configuration suited to tests.
    pub async fn start() -> Self {
        Self::with_config(Config::default()).await
    }

    /// Starts a server with custom configuration. The upload directory is
    /// always replaced with a fresh temporary directory.
    pub async fn with_config(mut config: Config) -> Self {
        // Initialize tracing (ignore error if already initialized)
        let _ = tracing_subscriber::registry()
            .with(EnvFilter::new("warn"))
            .with(tracing_subscriber::fmt::layer().with_test_writer())
            .try_init();

        let upload_dir = tempfile::tempdir().expect("Failed to create upload dir");
        config.host = "127.0.0.1".to_string();
        config.upload_dir = upload_dir.path().to_string_lossy().into_owned();

        let state = ServerState::initialize(config).expect("Failed to initialize server state");
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(server::serve(listener, state.clone()));

        Self {
            state,
            addr,
            upload_dir,
            handle,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Opens a WebSocket and waits until the server has registered it.
    pub async fn connect(&self) -> WsClient {
        let expected = self.state.registry.len() + 1;
        let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{}/ws", self.addr))
            .await
            .expect("WebSocket handshake failed");
        self.wait_for_connections(expected).await;
        ws
    }

    /// Polls the registry until it holds exactly `count` connections.
    pub async fn wait_for_connections(&self, count: usize) {
        let registry = self.state.registry.clone();
        tokio::time::timeout(RECV_TIMEOUT, async move {
            while registry.len() != count {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap_or_else(|_| {
            panic!(
                "registry never reached {} connections (has {})",
                count,
                self.state.registry.len()
            )
        });
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.state.shutdown_tx.send(());
        self.handle.abort();
    }
}

/// Sends a text frame.
pub async fn send_text(ws: &mut WsClient, text: &str) {
    ws.send(Message::text(text)).await.expect("send failed");
}

/// Waits for the next text frame, skipping control frames.
pub async fn recv_text(ws: &mut WsClient) -> String {
    tokio::time::timeout(RECV_TIMEOUT, async {
        loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => return text.as_str().to_owned(),
                Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => continue,
                other => panic!("Expected a text frame, got {:?}", other),
            }
        }
    })
    .await
    .expect("Timed out waiting for a text frame")
}

/// Asserts that no data frame arrives within `wait`.
pub async fn assert_silent(ws: &mut WsClient, wait: Duration) {
    if let Ok(frame) = tokio::time::timeout(wait, ws.next()).await {
        panic!("Expected no message, got {:?}", frame);
    }
}
