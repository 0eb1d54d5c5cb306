// src/server/serve_loop.rs

//! Contains the main server loop: serving requests and handling graceful shutdown.

use super::context::ServerContext;
use super::routes::build_router;
use crate::core::state::ServerState;
use anyhow::{Result, anyhow};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// Serves the gateway on `listener` until `state.shutdown_tx` fires.
pub async fn serve(listener: TcpListener, state: Arc<ServerState>) -> std::io::Result<()> {
    let mut shutdown_rx = state.shutdown_tx.subscribe();
    let app = build_router(state).into_make_service_with_connect_info::<SocketAddr>();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.recv().await.ok();
        })
        .await
}

/// The main server loop that serves traffic and handles graceful shutdown.
pub async fn run(mut ctx: ServerContext) -> Result<()> {
    let state = ctx.state.clone();
    let mut server_task = tokio::spawn(serve(ctx.listener, state.clone()));

    let shutdown_signal = wait_for_signal();
    tokio::pin!(shutdown_signal);

    loop {
        tokio::select! {
            biased;

            signal_name = &mut shutdown_signal => {
                info!("{} received, initiating graceful shutdown.", signal_name);
                break;
            }

            Some(res) = ctx.background_tasks.join_next() => {
                match res {
                    Ok(Ok(())) => warn!("A background task finished unexpectedly without an error."),
                    Ok(Err(e)) => { error!("CRITICAL: Background task failed: {}. Shutting down.", e); break; }
                    Err(e) => { error!("CRITICAL: Background task panicked: {e:?}. Shutting down."); break; }
                }
            },

            res = &mut server_task => {
                let _ = state.shutdown_tx.send(());
                return match res {
                    Ok(Ok(())) => Ok(()),
                    Ok(Err(e)) => Err(anyhow!("HTTP server failed: {}", e)),
                    Err(e) => Err(anyhow!("HTTP server task panicked: {:?}", e)),
                };
            }
        }
    }

    info!("Shutting down. Sending signal to all tasks.");
    if state.shutdown_tx.send(()).is_err() {
        error!("Failed to send shutdown signal. Some tasks may not terminate gracefully.");
    }

    match tokio::time::timeout(Duration::from_secs(10), &mut server_task).await {
        Ok(Ok(Ok(()))) => info!("HTTP server stopped."),
        Ok(Ok(Err(e))) => error!("HTTP server finished with error: {}", e),
        Ok(Err(e)) => error!("HTTP server task panicked: {e:?}"),
        Err(_) => {
            warn!("Timed out waiting for in-flight requests; aborting HTTP server.");
            server_task.abort();
        }
    }

    info!("Waiting for background tasks to finish...");
    if tokio::time::timeout(Duration::from_secs(10), async {
        while ctx.background_tasks.join_next().await.is_some() {}
    })
    .await
    .is_err()
    {
        warn!("Timed out waiting for background tasks to finish cleanly.");
    };
    info!("Server shutdown complete.");
    Ok(())
}

/// Resolves with the name of the first termination signal received.
#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let (mut sigint, mut sigterm) = match (
        signal(SignalKind::interrupt()),
        signal(SignalKind::terminate()),
    ) {
        (Ok(sigint), Ok(sigterm)) => (sigint, sigterm),
        (Err(e), _) | (_, Err(e)) => {
            error!("Failed to register signal handlers: {}. Falling back to Ctrl-C.", e);
            let _ = tokio::signal::ctrl_c().await;
            return "Ctrl-C";
        }
    };

    tokio::select! {
        _ = sigint.recv() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
    "Ctrl-C"
}
