// src/core/state/mod.rs

//! Defines the central `ServerState` struct shared by every route and connection task.

mod core;

pub use core::ServerState;
