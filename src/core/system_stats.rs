// src/core/system_stats.rs

//! Point-in-time host statistics: uptime, memory and load averages.

use crate::core::errors::HostwatchError;
use std::fmt;
use sysinfo::System;

/// Load averages over the last 1, 5 and 15 minutes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct LoadAverages {
    pub one: f64,
    pub five: f64,
    pub fifteen: f64,
}

/// A single read of the host's kernel statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemSnapshot {
    pub uptime_secs: u64,
    pub total_memory: u64,
    pub free_memory: u64,
    /// Always `total_memory - free_memory`.
    pub used_memory: u64,
    pub load: LoadAverages,
}

impl SystemSnapshot {
    /// Reads the host statistics once.
    ///
    /// Fails on platforms `sysinfo` cannot query, or when the kernel reports no
    /// memory at all.
    pub fn collect() -> Result<Self, HostwatchError> {
        if !sysinfo::IS_SUPPORTED_SYSTEM {
            return Err(HostwatchError::SystemQuery(format!(
                "host statistics are not available on {}",
                std::env::consts::OS
            )));
        }

        let mut sys = System::new();
        sys.refresh_memory();
        let total_memory = sys.total_memory();
        if total_memory == 0 {
            return Err(HostwatchError::SystemQuery(
                "kernel reported zero total memory".to_string(),
            ));
        }

        let load = System::load_average();
        Ok(Self::from_parts(
            System::uptime(),
            total_memory,
            sys.free_memory(),
            LoadAverages {
                one: load.one,
                five: load.five,
                fifteen: load.fifteen,
            },
        ))
    }

    /// Builds a snapshot from raw readings, deriving `used_memory`.
    pub fn from_parts(
        uptime_secs: u64,
        total_memory: u64,
        free_memory: u64,
        load: LoadAverages,
    ) -> Self {
        Self {
            uptime_secs,
            total_memory,
            free_memory,
            used_memory: total_memory.saturating_sub(free_memory),
            load,
        }
    }
}

impl fmt::Display for SystemSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Uptime: {}s", self.uptime_secs)?;
        writeln!(f, "Total RAM: {} bytes", self.total_memory)?;
        writeln!(f, "Used RAM: {} bytes", self.used_memory)?;
        writeln!(f, "CPU Load (1 min): {:.2}", self.load.one)?;
        writeln!(f, "CPU Load (5 min): {:.2}", self.load.five)?;
        writeln!(f, "CPU Load (15 min): {:.2}", self.load.fifteen)
    }
}

/// The host's name, or `"unknown"` when it cannot be determined.
pub fn host_name() -> String {
    System::host_name().unwrap_or_else(|| "unknown".to_string())
}
