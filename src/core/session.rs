// src/core/session.rs

//! Turns inbound WebSocket messages into command runs whose output is shared with every client.

use crate::core::executor::CommandRunner;
use crate::core::metrics;
use crate::core::registry::{BroadcastReport, ConnectionId, ConnectionRegistry};
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

/// A message received from a client, reduced to what the relay cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    /// A command line to run.
    Text(String),
    /// Reserved; always ignored.
    Binary(Bytes),
}

/// Runs commands on behalf of clients and broadcasts the results.
///
/// The output of a command goes to every registered connection, not just the
/// sender: all clients share one terminal.
#[derive(Clone)]
pub struct CommandSession {
    registry: Arc<ConnectionRegistry>,
    runner: Arc<dyn CommandRunner>,
}

impl CommandSession {
    pub fn new(registry: Arc<ConnectionRegistry>, runner: Arc<dyn CommandRunner>) -> Self {
        Self { registry, runner }
    }

    pub fn runner(&self) -> &Arc<dyn CommandRunner> {
        &self.runner
    }

    /// Handles one inbound message from connection `from`.
    ///
    /// Binary frames are dropped and return `None`. Text frames run to completion
    /// before the registry is touched, so no shared state is held while the
    /// process runs.
    pub async fn on_message(
        &self,
        from: ConnectionId,
        frame: InboundFrame,
    ) -> Option<BroadcastReport> {
        let command = match frame {
            InboundFrame::Binary(data) => {
                debug!(
                    "Connection {}: ignoring binary frame of {} bytes.",
                    from,
                    data.len()
                );
                metrics::BINARY_FRAMES_DROPPED_TOTAL.inc();
                return None;
            }
            InboundFrame::Text(command) => command,
        };

        info!("Connection {}: running command {:?}", from, command);
        let output = self.runner.run(&command).await;
        Some(self.registry.broadcast(&output.text))
    }
}
