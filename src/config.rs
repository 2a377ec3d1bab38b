// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};
use tracing::info;

/// Process-wide settings, read once at startup.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// Address to listen on
    pub bind: String,
    pub port: u16,
    /// Snapshot file restored at startup and written periodically / on shutdown
    pub snapshot_path: String,
    /// Whether the periodic snapshot task runs
    pub snapshot_enabled: bool,
    /// Snapshot period (seconds)
    pub snapshot_interval_secs: u64,
    /// Period of the active expiry sweep (seconds)
    pub purge_interval_secs: u64,
    /// Default log filter, overridden by RUST_LOG
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 6380,
            snapshot_path: "dump.cinder".to_string(),
            snapshot_enabled: true,
            snapshot_interval_secs: 60,
            purge_interval_secs: 1,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// Reads and deserializes the JSON config at `path`.
/// A missing file is created with the default settings.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path_ref = path.as_ref();

    if !path_ref.exists() {
        let default_cfg = Config::default();
        let default_json = serde_json::to_string_pretty(&default_cfg)?;
        fs::write(path_ref, default_json)
            .with_context(|| format!("Failed to write default config {:?}", path_ref))?;
        info!(path = ?path_ref, "default config created");
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(path_ref)
        .with_context(|| format!("Failed to read config file {:?}", path_ref))?;
    let cfg: Config = serde_json::from_str(&data)
        .with_context(|| format!("Failed to parse config file {:?}", path_ref))?;
    Ok(cfg)
}
