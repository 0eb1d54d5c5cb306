// src/server/mod.rs

use crate::config::Config;
use anyhow::Result;

mod context;
mod initialization;
mod metrics_server;
mod routes;
mod serve_loop;
mod spawner;
mod uploads;

pub use routes::build_router;
pub use serve_loop::serve;

/// The main server startup function, orchestrating all setup phases.
pub async fn run(config: Config) -> Result<()> {
    // 1. Initialize server state and bind the listener.
    let mut server_context = initialization::setup(config).await?;

    // 2. Spawn all background tasks.
    spawner::spawn_all(&mut server_context);

    // 3. Serve HTTP and WebSocket traffic until shutdown.
    serve_loop::run(server_context).await
}
