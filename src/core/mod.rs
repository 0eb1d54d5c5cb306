// src/core/mod.rs

//! The central module containing the relay's core logic and data structures.

pub mod errors;
pub mod executor;
pub mod metrics;
pub mod registry;
pub mod session;
pub mod state;
pub mod system_stats;

pub use errors::{DeliveryError, HostwatchError};
pub use executor::{CommandOutput, CommandRunner, ShellExecutor};
pub use registry::{BroadcastReport, Connection, ConnectionId, ConnectionRegistry};
pub use session::{CommandSession, InboundFrame};
