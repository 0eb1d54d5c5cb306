// src/core/state/core.rs

//! Defines the central `ServerState` struct, holding all shared server-wide state.

use crate::config::Config;
use crate::core::HostwatchError;
use crate::core::executor::{CommandRunner, ShellExecutor};
use crate::core::registry::{ConnectionId, ConnectionRegistry};
use crate::core::session::CommandSession;
use crate::core::system_stats;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::info;

/// The page served at `/` when no template is configured.
const DEFAULT_INDEX_TEMPLATE: &str = include_str!("../../../static/ws.html");

/// The placeholder replaced by the host name when the index page is rendered.
const SERVER_NAME_PLACEHOLDER: &str = "{{servername}}";

/// The central struct holding all shared, server-wide state.
/// This struct is wrapped in an `Arc` and passed to every route handler and
/// connection task.
pub struct ServerState {
    /// The server's configuration. Immutable after startup.
    pub config: Arc<Config>,
    /// Every WebSocket currently eligible for broadcasts.
    pub registry: Arc<ConnectionRegistry>,
    /// Runs commands and fans their output out through `registry`.
    pub session: CommandSession,
    /// Signals connection tasks and background tasks to stop.
    pub shutdown_tx: broadcast::Sender<()>,
    /// The raw index page template.
    index_template: String,
    /// Source of unique connection identities.
    next_connection_id: AtomicU64,
}

impl ServerState {
    /// Initializes the server state with a shell executor built from the configuration.
    pub fn initialize(config: Config) -> Result<Arc<Self>, HostwatchError> {
        let runner = Arc::new(ShellExecutor::new(config.shell.clone()));
        Self::with_runner(config, runner)
    }

    /// Initializes the server state around an arbitrary command runner.
    pub fn with_runner(
        config: Config,
        runner: Arc<dyn CommandRunner>,
    ) -> Result<Arc<Self>, HostwatchError> {
        let index_template = match &config.index_template {
            Some(path) => {
                info!("Loading index template from {}", path);
                fs::read_to_string(path)?
            }
            None => DEFAULT_INDEX_TEMPLATE.to_string(),
        };

        let registry = Arc::new(ConnectionRegistry::new());
        let session = CommandSession::new(registry.clone(), runner);
        let (shutdown_tx, _) = broadcast::channel(1);

        Ok(Arc::new(Self {
            config: Arc::new(config),
            registry,
            session,
            shutdown_tx,
            index_template,
            next_connection_id: AtomicU64::new(1),
        }))
    }

    /// Hands out a fresh connection identity.
    pub fn next_connection_id(&self) -> ConnectionId {
        self.next_connection_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Renders the index page for the current host.
    pub fn render_index(&self) -> String {
        self.index_template
            .replace(SERVER_NAME_PLACEHOLDER, &system_stats::host_name())
    }
}
