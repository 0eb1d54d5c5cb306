// src/server/initialization.rs

//! Handles server initialization: state setup, directories, and binding the listener.

use super::context::ServerContext;
use crate::config::Config;
use crate::core::state::ServerState;
use anyhow::{Context, Result};
use std::path::Path;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Initializes all server components before starting the main loop.
pub async fn setup(config: Config) -> Result<ServerContext> {
    log_startup_info(&config);

    ensure_upload_dir(&config.upload_dir).await?;
    if !Path::new(&config.static_dir).is_dir() {
        warn!(
            "Static directory '{}' does not exist; /static will return 404.",
            config.static_dir
        );
    }

    let listen_addr = config.listen_addr();
    let state = ServerState::initialize(config)?;
    info!("Server state initialized.");

    let listener = TcpListener::bind(&listen_addr)
        .await
        .with_context(|| format!("Failed to bind to {listen_addr}"))?;
    info!("Hostwatch listening on http://{}", listener.local_addr()?);

    Ok(ServerContext {
        state,
        listener,
        background_tasks: JoinSet::new(),
    })
}

/// Creates the upload directory if it is missing.
async fn ensure_upload_dir(upload_dir: &str) -> Result<()> {
    let path = Path::new(upload_dir);
    if !path.exists() {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("Failed to create upload directory '{upload_dir}'"))?;
        info!("Created upload directory: {}", path.display());
    }
    Ok(())
}

fn log_startup_info(config: &Config) {
    match config.worker_threads {
        Some(n) => info!("Runtime configured with {} worker threads.", n),
        None => info!("Runtime using one worker thread per core."),
    }
    info!(
        "Commands run via '{}'; device list via '{}'.",
        config.shell, config.device_command
    );
    warn!("--------------------------------------------------------------------------------");
    warn!("SECURITY WARNING:");
    warn!(" - Every text message received on /ws is executed verbatim by the shell, and its");
    warn!("   output is sent to all connected clients. There is no authentication and no");
    warn!("   command filtering. Expose this server only on a trusted network.");
    warn!("--------------------------------------------------------------------------------");
}
