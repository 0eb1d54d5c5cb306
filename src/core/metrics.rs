// src/core/metrics.rs

//! Defines and registers Prometheus metrics for relay monitoring.
//!
//! This module uses `lazy_static` to ensure that metrics are registered only once
//! globally for the entire application lifecycle.

use lazy_static::lazy_static;
use prometheus::{
    Counter, Gauge, Histogram, TextEncoder, register_counter, register_gauge, register_histogram,
};

lazy_static! {
    // --- Server-wide Gauges ---
    /// The number of WebSocket clients currently registered for broadcasts.
    pub static ref CONNECTED_CLIENTS: Gauge =
        register_gauge!("hostwatch_connected_clients", "Number of currently connected WebSocket clients.").unwrap();


    // --- Server-wide Counters ---
    /// The total number of WebSocket connections accepted since startup.
    pub static ref CONNECTIONS_RECEIVED_TOTAL: Counter =
        register_counter!("hostwatch_connections_received_total", "Total number of WebSocket connections received.").unwrap();
    /// The total number of shell commands executed.
    pub static ref COMMANDS_EXECUTED_TOTAL: Counter =
        register_counter!("hostwatch_commands_executed_total", "Total number of shell commands executed.").unwrap();
    /// The total number of commands whose process could not be spawned.
    pub static ref COMMAND_SPAWN_FAILURES_TOTAL: Counter =
        register_counter!("hostwatch_command_spawn_failures_total", "Total number of commands that failed to spawn.").unwrap();
    /// The total number of binary frames dropped by the session handler.
    pub static ref BINARY_FRAMES_DROPPED_TOTAL: Counter =
        register_counter!("hostwatch_binary_frames_dropped_total", "Total number of binary WebSocket frames ignored.").unwrap();
    /// The total number of messages queued to clients by broadcasts.
    pub static ref BROADCAST_DELIVERIES_TOTAL: Counter =
        register_counter!("hostwatch_broadcast_deliveries_total", "Total number of broadcast messages queued to clients.").unwrap();
    /// The total number of per-connection broadcast failures.
    pub static ref BROADCAST_DELIVERY_FAILURES_TOTAL: Counter =
        register_counter!("hostwatch_broadcast_delivery_failures_total", "Total number of failed per-connection broadcast deliveries.").unwrap();


    // --- Histograms ---
    /// A histogram of external command run times.
    pub static ref COMMAND_DURATION_SECONDS: Histogram =
        register_histogram!("hostwatch_command_duration_seconds", "Wall-clock duration of shell commands in seconds.").unwrap();
}

/// Gathers all registered metrics and encodes them in the Prometheus text format.
pub fn gather_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder.encode_to_string(&metric_families).unwrap_or_default()
}
