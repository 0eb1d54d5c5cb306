// src/core/executor.rs

//! Runs client-supplied command lines through the system shell and captures their output.
//!
//! # Security
//!
//! The command text arrives verbatim from any connected WebSocket client and is
//! handed to the shell without validation, sanitization or allow-listing. Anyone
//! who can reach the `/ws` endpoint can run arbitrary commands with the server's
//! privileges. Deploy only behind a trusted network boundary.

use crate::core::metrics;
use async_trait::async_trait;
use std::fmt;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::Instant;
use tracing::{debug, error, warn};

/// The text delivered in place of output when the process could not be started.
pub const SPAWN_FAILURE_TEXT: &str = "Error executing command.";

/// Output is drained from the pipe in chunks of this many bytes.
const READ_CHUNK_SIZE: usize = 128;

#[cfg(not(windows))]
pub const DEFAULT_SHELL: &str = "/bin/sh";
#[cfg(windows)]
pub const DEFAULT_SHELL: &str = "cmd";

#[cfg(not(windows))]
const SHELL_COMMAND_FLAG: &str = "-c";
#[cfg(windows)]
const SHELL_COMMAND_FLAG: &str = "/C";

/// How a command run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecStatus {
    /// The process ran to completion. `exit_code` is `None` when it was killed by a signal.
    Completed { exit_code: Option<i32> },
    /// The process could not be started at all.
    SpawnFailed { reason: String },
}

/// The captured result of one command run.
///
/// Only `text` is ever shown to clients; `status` exists for logging and for
/// callers that want to tell a spawn failure apart from a command that happened
/// to print the sentinel text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Standard output and standard error, merged in the order they were written.
    pub text: String,
    pub status: ExecStatus,
}

impl CommandOutput {
    pub fn completed(text: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            text: text.into(),
            status: ExecStatus::Completed { exit_code },
        }
    }

    pub fn spawn_failed(reason: impl Into<String>) -> Self {
        Self {
            text: SPAWN_FAILURE_TEXT.to_string(),
            status: ExecStatus::SpawnFailed {
                reason: reason.into(),
            },
        }
    }

    pub fn is_spawn_failure(&self) -> bool {
        matches!(self.status, ExecStatus::SpawnFailed { .. })
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

impl fmt::Display for CommandOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Something that can turn a command line into captured output.
///
/// Implementations must never fail: every problem is folded into the returned
/// `CommandOutput`.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str) -> CommandOutput;
}

/// Runs commands via `<shell> -c <command>` on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    shell: PathBuf,
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}

impl ShellExecutor {
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// Runs `command` to completion on the current thread.
    ///
    /// Blocks for the full lifetime of the child process. There is no timeout and
    /// no cap on the amount of output collected.
    pub fn run_blocking(&self, command: &str) -> CommandOutput {
        let started = Instant::now();
        metrics::COMMANDS_EXECUTED_TOTAL.inc();

        let output = match self.capture(command) {
            Ok((text, exit_code)) => {
                debug!(
                    "Command {:?} exited with {:?} ({} bytes of output)",
                    command,
                    exit_code,
                    text.len()
                );
                CommandOutput::completed(text, exit_code)
            }
            Err(e) => {
                warn!(
                    "Failed to spawn command {:?} via {}: {}",
                    command,
                    self.shell().display(),
                    e
                );
                metrics::COMMAND_SPAWN_FAILURES_TOTAL.inc();
                CommandOutput::spawn_failed(e.to_string())
            }
        };

        metrics::COMMAND_DURATION_SECONDS.observe(started.elapsed().as_secs_f64());
        output
    }

    /// Spawns the shell with stdout and stderr sharing one pipe, then drains it.
    ///
    /// An `Err` means the process never started. Read failures after a successful
    /// spawn keep whatever was captured so far.
    fn capture(&self, command: &str) -> io::Result<(String, Option<i32>)> {
        let (mut reader, writer) = io::pipe()?;

        let mut child = {
            let mut cmd = Command::new(&self.shell);
            cmd.arg(SHELL_COMMAND_FLAG)
                .arg(command)
                .stdin(Stdio::null())
                .stdout(writer.try_clone()?)
                .stderr(writer);
            cmd.spawn()?
            // `cmd` owns the parent's copies of the write end; dropping it here
            // lets the reader see end-of-stream once the child exits.
        };

        let mut captured = Vec::new();
        let mut chunk = [0u8; READ_CHUNK_SIZE];
        loop {
            match reader.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => captured.extend_from_slice(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!("Reading output of {:?} failed: {}", command, e);
                    break;
                }
            }
        }

        let exit_code = match child.wait() {
            Ok(status) => status.code(),
            Err(e) => {
                warn!("Failed to reap child for {:?}: {}", command, e);
                None
            }
        };

        Ok((String::from_utf8_lossy(&captured).into_owned(), exit_code))
    }
}

#[async_trait]
impl CommandRunner for ShellExecutor {
    async fn run(&self, command: &str) -> CommandOutput {
        let executor = self.clone();
        let command = command.to_owned();
        match tokio::task::spawn_blocking(move || executor.run_blocking(&command)).await {
            Ok(output) => output,
            Err(e) => {
                error!("Command worker thread failed: {}", e);
                CommandOutput::spawn_failed(e.to_string())
            }
        }
    }
}
