// src/core/registry.rs

//! The set of live WebSocket connections and the fan-out of command results to them.

use crate::core::errors::DeliveryError;
use crate::core::metrics;
use dashmap::DashMap;
use std::fmt;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Stable identity of one client connection.
pub type ConnectionId = u64;

/// A message waiting to be written to a client socket.
pub type OutboundMessage = Arc<str>;

/// The receiving half of a connection's outbound queue, drained by its writer task.
pub type OutboundReceiver = mpsc::UnboundedReceiver<OutboundMessage>;

/// A registry-side handle to one client's duplex channel.
///
/// The socket itself stays with the gateway. The handle only owns the sending
/// half of the queue feeding that socket's writer task, so a send after the
/// socket is gone fails cleanly instead of touching freed resources.
#[derive(Clone)]
pub struct Connection {
    id: ConnectionId,
    addr: SocketAddr,
    tx: mpsc::UnboundedSender<OutboundMessage>,
}

impl Connection {
    /// Creates a handle and the receiver its writer task should drain.
    pub fn new(id: ConnectionId, addr: SocketAddr) -> (Self, OutboundReceiver) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { id, addr, tx }, rx)
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queues one discrete text message for this connection.
    pub fn send(&self, payload: OutboundMessage) -> Result<(), DeliveryError> {
        self.tx.send(payload).map_err(|_| DeliveryError {
            connection_id: self.id,
            addr: self.addr.to_string(),
        })
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("addr", &self.addr)
            .finish()
    }
}

/// Outcome of a single broadcast.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Connections the payload was queued to.
    pub delivered: usize,
    /// Connections whose queue was already closed.
    pub failed: Vec<DeliveryError>,
}

impl BroadcastReport {
    pub fn attempted(&self) -> usize {
        self.delivered + self.failed.len()
    }
}

/// `ConnectionRegistry` tracks every open WebSocket and broadcasts payloads to them.
///
/// It uses `DashMap` so registrations on different shards never contend. Each
/// structural change and each shard visit during a broadcast is exclusive, so
/// a broadcast racing with `add`/`remove` sees every entry at most once and never
/// a half-updated map. Sends are non-blocking queue pushes, so a broadcast never
/// holds a shard for longer than it takes to enqueue.
#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Connection>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    /// Registers a connection for future broadcasts.
    ///
    /// A second `add` with the same identity replaces the earlier handle.
    pub fn add(&self, conn: Connection) {
        let id = conn.id();
        let addr = conn.addr();
        if self.connections.insert(id, conn).is_some() {
            warn!(
                "Connection {} ({}) was registered twice; replacing the earlier handle.",
                id, addr
            );
        } else {
            metrics::CONNECTED_CLIENTS.inc();
            debug!("Registered connection {} from {}", id, addr);
        }
    }

    /// Unregisters a connection. Removing an unknown identity is a no-op.
    pub fn remove(&self, id: ConnectionId) -> bool {
        match self.connections.remove(&id) {
            Some((_, conn)) => {
                metrics::CONNECTED_CLIENTS.dec();
                debug!("Unregistered connection {} from {}", id, conn.addr());
                true
            }
            None => {
                debug!("Connection {} was not registered upon removal.", id);
                false
            }
        }
    }

    /// Queues `payload` to every registered connection.
    ///
    /// A failed send is recorded in the report and logged; it neither stops the
    /// remaining deliveries nor unregisters the connection.
    pub fn broadcast(&self, payload: &str) -> BroadcastReport {
        let message: OutboundMessage = Arc::from(payload);
        let mut report = BroadcastReport::default();

        for entry in self.connections.iter() {
            match entry.value().send(message.clone()) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    warn!("{}", e);
                    report.failed.push(e);
                }
            }
        }

        metrics::BROADCAST_DELIVERIES_TOTAL.inc_by(report.delivered as f64);
        if !report.failed.is_empty() {
            metrics::BROADCAST_DELIVERY_FAILURES_TOTAL.inc_by(report.failed.len() as f64);
        }
        debug!(
            "Broadcast {} bytes to {} of {} connections.",
            payload.len(),
            report.delivered,
            report.attempted()
        );
        report
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Returns the identities currently registered, in no particular order.
    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.iter().map(|e| *e.key()).collect()
    }
}
