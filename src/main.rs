// src/main.rs

//! The main entry point for the hostwatch server application.

use anyhow::{Context, Result, anyhow};
use hostwatch::config::Config;
use hostwatch::server;
use std::env;
use std::path::Path;
use tracing::{error, info};
use tracing_subscriber::{filter::EnvFilter, prelude::*};

/// The configuration file read when `--config` is not given.
const DEFAULT_CONFIG_PATH: &str = "hostwatch.toml";

fn main() -> Result<()> {
    // Define version information.
    const VERSION: &str = env!("CARGO_PKG_VERSION");

    // Collect command-line arguments to decide the execution mode.
    let args: Vec<String> = env::args().collect();

    // Handle the --version flag.
    if args.contains(&"--version".to_string()) {
        println!("hostwatch version {VERSION}");
        return Ok(());
    }

    // Load the configuration before the runtime exists: it decides the thread count.
    let config = match load_config(&args) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e:#}");
            std::process::exit(1);
        }
    };

    // Setup logging. Get the level from the env var or config.
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| config.log_level.clone());
    tracing_subscriber::registry()
        .with(EnvFilter::new(log_level))
        .with(
            tracing_subscriber::fmt::layer()
                .compact() // Use the compact, single-line format.
                .with_ansi(true), // Enable ANSI color codes for log levels.
        )
        .init();

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();
    if let Some(threads) = config.worker_threads {
        builder.worker_threads(threads);
    }
    let runtime = builder.build().context("Failed to build the Tokio runtime")?;

    info!("Starting hostwatch {}...", VERSION);
    if let Err(e) = runtime.block_on(server::run(config)) {
        error!("Server runtime error: {}", e);
        return Err(e);
    }
    Ok(())
}

/// Resolves the configuration from the config file and command-line overrides.
fn load_config(args: &[String]) -> Result<Config> {
    // The path can be provided via a --config flag; otherwise the default file
    // is used if present, and built-in defaults if not.
    let explicit_path = flag_value(args, "--config")?;
    let mut config = match explicit_path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load configuration from \"{path}\""))?,
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::from_file(DEFAULT_CONFIG_PATH)
            .with_context(|| {
                format!("Failed to load configuration from \"{DEFAULT_CONFIG_PATH}\"")
            })?,
        None => Config::default(),
    };

    // Override port if provided as a command-line argument.
    if let Some(port_str) = flag_value(args, "--port")? {
        config.port = port_str
            .parse::<u16>()
            .map_err(|_| anyhow!("Invalid port number: {port_str}"))?;
    }

    // Override the worker thread count.
    if let Some(threads_str) = flag_value(args, "--threads")? {
        let threads = threads_str
            .parse::<usize>()
            .map_err(|_| anyhow!("Invalid thread count: {threads_str}"))?;
        config.worker_threads = Some(threads);
    }

    config.validate()?;
    Ok(config)
}

/// Returns the value following `flag`, if the flag is present.
fn flag_value<'a>(args: &'a [String], flag: &str) -> Result<Option<&'a str>> {
    match args.iter().position(|arg| arg == flag) {
        Some(i) => args
            .get(i + 1)
            .map(|s| Some(s.as_str()))
            .ok_or_else(|| anyhow!("{flag} flag requires a value")),
        None => Ok(None),
    }
}
