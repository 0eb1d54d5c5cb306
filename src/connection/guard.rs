// src/connection/guard.rs

//! Defines `ConnectionGuard`, an RAII guard for connection resource management.

use crate::core::registry::{ConnectionId, ConnectionRegistry};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::debug;

/// An RAII guard to ensure a connection is always unregistered when its
/// handler's scope is exited, however the read loop ended.
pub struct ConnectionGuard {
    /// The registry the connection was added to.
    pub(crate) registry: Arc<ConnectionRegistry>,
    /// The identity the connection was registered under.
    pub(crate) connection_id: ConnectionId,
    /// The network address of the client.
    pub(crate) addr: SocketAddr,
}

impl ConnectionGuard {
    /// Creates a new `ConnectionGuard`.
    pub(crate) fn new(
        registry: Arc<ConnectionRegistry>,
        connection_id: ConnectionId,
        addr: SocketAddr,
    ) -> Self {
        Self {
            registry,
            connection_id,
            addr,
        }
    }
}

impl Drop for ConnectionGuard {
    /// Removes the connection from the registry. Dropping the registry's handle
    /// closes the outbound queue, which lets the writer task finish.
    fn drop(&mut self) {
        debug!(
            "ConnectionGuard dropping, unregistering connection {} ({})",
            self.connection_id, self.addr
        );
        self.registry.remove(self.connection_id);
    }
}
