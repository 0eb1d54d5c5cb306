// src/config.rs

//! Manages server configuration: loading, defaults, and validation.

use crate::core::executor::DEFAULT_SHELL;
use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

/// Configuration for the Prometheus metrics exporter.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MetricsConfig {
    /// If true, an HTTP server will be started to expose Prometheus metrics.
    #[serde(default)]
    pub enabled: bool,
    /// The port for the Prometheus metrics server.
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_metrics_port() -> u16 {
    18081
}

/// Represents the final, validated server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Number of runtime worker threads. `None` lets Tokio pick one per core.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_threads: Option<usize>,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// The shell used to interpret client commands, invoked as `<shell> -c <command>`.
    #[serde(default = "default_shell")]
    pub shell: String,
    /// The fixed inventory command served at `/lsusb`.
    #[serde(default = "default_device_command")]
    pub device_command: String,
    /// Directory receiving files posted to `/upload_file`.
    #[serde(default = "default_upload_dir")]
    pub upload_dir: String,
    /// Directory served under `/static`.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
    /// Optional HTML template for `/`. The built-in page is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_template: Option<String>,
    #[serde(default)]
    pub metrics: MetricsConfig,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    18080
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_shell() -> String {
    DEFAULT_SHELL.to_string()
}
fn default_device_command() -> String {
    "lsusb".to_string()
}
fn default_upload_dir() -> String {
    ".".to_string()
}
fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            worker_threads: None,
            log_level: default_log_level(),
            shell: default_shell(),
            device_command: default_device_command(),
            upload_dir: default_upload_dir(),
            static_dir: default_static_dir(),
            index_template: None,
            metrics: MetricsConfig::default(),
        }
    }
}

impl Config {
    /// Creates a new `Config` instance by reading and parsing a TOML file.
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file at '{path}'"))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Invalid configuration in '{path}'"))
    }

    /// Parses and validates a configuration from TOML text.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    /// The `host:port` string the gateway binds to.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Validates the configuration to ensure logical consistency.
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(anyhow!("port cannot be 0"));
        }
        if self.host.trim().is_empty() {
            return Err(anyhow!("host cannot be empty"));
        }
        if self.worker_threads == Some(0) {
            return Err(anyhow!("worker_threads cannot be 0"));
        }
        if self.shell.trim().is_empty() {
            return Err(anyhow!("shell cannot be empty"));
        }
        if self.device_command.trim().is_empty() {
            return Err(anyhow!("device_command cannot be empty"));
        }
        if self.upload_dir.trim().is_empty() {
            return Err(anyhow!("upload_dir cannot be empty"));
        }

        if self.host != "127.0.0.1" && self.host != "localhost" && self.host != "::1" {
            warn!(
                "Listening on {}: any client that can reach /ws can run arbitrary shell commands.",
                self.host
            );
        }

        if self.metrics.enabled {
            if self.metrics.port == 0 {
                return Err(anyhow!("metrics.port cannot be 0"));
            }
            if self.metrics.port == self.port {
                return Err(anyhow!(
                    "metrics.port cannot be the same as the main server port"
                ));
            }
        }
        Ok(())
    }
}
