// src/connection/mod.rs

//! Manages the lifecycle of a single client WebSocket: registration, the
//! inbound command loop, and the outbound writer.

// Declare the private sub-modules of the `connection` module.
mod guard;
mod handler;

// Publicly re-export the primary types from the sub-modules.
pub(crate) use guard::ConnectionGuard;
pub use handler::ConnectionHandler;
