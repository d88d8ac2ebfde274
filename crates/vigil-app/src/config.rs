//! Settings loading.
//!
//! Layered lookup: an explicit path wins, then `./vigil.toml` in the
//! working directory, then the user config dir. A missing file means
//! defaults; a malformed file is an error — silently ignoring a typo'd
//! config is worse than failing the run.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use vigil_core::prelude::*;
use vigil_core::{MAX_APP_LOG_LINES, MAX_CONSOLE_ENTRIES, MAX_NETWORK_EVENTS};

/// Config file name looked up in the working directory and config dir.
pub const CONFIG_FILE_NAME: &str = "vigil.toml";

/// Retention caps for the capture panels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureCaps {
    pub app_log_lines: usize,
    pub console_entries: usize,
    pub network_events: usize,
}

impl Default for CaptureCaps {
    fn default() -> Self {
        Self {
            app_log_lines: MAX_APP_LOG_LINES,
            console_entries: MAX_CONSOLE_ENTRIES,
            network_events: MAX_NETWORK_EVENTS,
        }
    }
}

/// Health snapshot polling behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollSettings {
    /// Seconds between dashboard snapshot polls.
    pub interval_secs: u64,
    /// Transient-failure retries per poll.
    pub max_retries: u32,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            max_retries: 3,
        }
    }
}

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Debug-bridge WebSocket endpoint (e.g. `ws://127.0.0.1:9229/bridge`).
    pub bridge_endpoint: Option<String>,
    /// Backend API base URL (e.g. `http://127.0.0.1:8080`).
    pub backend_base_url: Option<String>,
    pub caps: CaptureCaps,
    pub poll: PollSettings,
}

impl Settings {
    /// Load settings using the layered lookup.
    ///
    /// # Errors
    ///
    /// - [`Error::ConfigNotFound`] when `explicit` is given but missing.
    /// - [`Error::ConfigInvalid`] when a found file fails to parse.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            if !path.exists() {
                return Err(Error::ConfigNotFound {
                    path: path.to_path_buf(),
                });
            }
            return Self::from_path(path);
        }

        for candidate in Self::default_locations() {
            if candidate.exists() {
                return Self::from_path(&candidate);
            }
        }
        Ok(Self::default())
    }

    /// Parse settings from a specific file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        toml::from_str(&raw)
            .map_err(|e| Error::config_invalid(format!("{}: {e}", path.display())))
    }

    /// Candidate config locations in precedence order.
    fn default_locations() -> Vec<PathBuf> {
        let mut locations = vec![PathBuf::from(CONFIG_FILE_NAME)];
        if let Some(config_dir) = dirs::config_dir() {
            locations.push(config_dir.join("vigil").join(CONFIG_FILE_NAME));
        }
        locations
    }
}
