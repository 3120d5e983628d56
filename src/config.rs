//! Configuration for textplay.
//!
//! This module provides:
//! - TOML configuration file loading from `~/.textplay/config.toml`
//! - Interpreter timing knobs (read budget, poll interval, write delays)
//! - The `DFROTZ_PATH` environment override
//!
//! # Configuration File
//!
//! ```toml
//! # Interpreter executable (DFROTZ_PATH wins over this)
//! dfrotz = "/usr/local/bin/dfrotz"
//!
//! # Where bare game names are looked up
//! games_dir = "games"
//!
//! # Working directory of the interpreter; save slots live in `saves/` below it
//! save_root = "."
//!
//! # Save to the autosave slot before an explicit quit
//! autosave_on_quit = false
//!
//! [timing]
//! timeout_ms = 1000
//! poll_interval_ms = 100
//! command_delay_ms = 100
//! quit_delay_ms = 200
//! ```
//!
//! The timing values depend on how fast the interpreter is on a given
//! machine. A slow interpreter needs a longer `command_delay_ms`, or
//! follow-up commands will see the previous command's output.

use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default interpreter executable, looked up on `PATH`
pub const DEFAULT_DFROTZ: &str = "dfrotz";

/// Environment variable overriding the interpreter path
pub const DFROTZ_ENV: &str = "DFROTZ_PATH";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Interpreter executable
    pub dfrotz: String,
    /// Directory searched for bare game names
    pub games_dir: PathBuf,
    /// Interpreter working directory, parent of `saves/`
    pub save_root: PathBuf,
    /// Save to the autosave slot before an explicit quit
    pub autosave_on_quit: bool,
    /// Protocol timing
    pub timing: Timing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dfrotz: DEFAULT_DFROTZ.to_string(),
            games_dir: PathBuf::from("games"),
            save_root: PathBuf::from("."),
            autosave_on_quit: false,
            timing: Timing::default(),
        }
    }
}

/// Timing of the read/write protocol, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Overall budget of one `read_until` call
    pub timeout_ms: u64,
    /// Bounded wait of one `read_chunk` poll
    pub poll_interval_ms: u64,
    /// Pause after every successful write
    pub command_delay_ms: u64,
    /// Pause between "quit" and its confirmation
    pub quit_delay_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            timeout_ms: 1000,
            poll_interval_ms: 100,
            command_delay_ms: 100,
            quit_delay_ms: 200,
        }
    }
}

impl Timing {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn command_delay(&self) -> Duration {
        Duration::from_millis(self.command_delay_ms)
    }

    pub fn quit_delay(&self) -> Duration {
        Duration::from_millis(self.quit_delay_ms)
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Self {
        let mut config = Self::get_config_path()
            .filter(|path| path.exists())
            .and_then(|path| fs::read_to_string(path).ok())
            .and_then(|content| match Self::from_toml_str(&content) {
                Ok(config) => Some(config),
                Err(e) => {
                    tracing::warn!("Ignoring malformed config file: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        config.apply_env();
        config
    }

    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Apply `DFROTZ_PATH` if set and non-empty
    pub fn apply_env(&mut self) {
        if let Some(path) = std::env::var_os(DFROTZ_ENV) {
            if !path.is_empty() {
                self.dfrotz = path.to_string_lossy().into_owned();
            }
        }
    }

    /// Directory holding the config file and the log
    pub fn data_dir() -> Option<PathBuf> {
        home_dir().map(|home| home.join(".textplay"))
    }

    /// Get config file path
    fn get_config_path() -> Option<PathBuf> {
        Self::data_dir().map(|dir| dir.join("config.toml"))
    }
}

// Get home directory
fn home_dir() -> Option<PathBuf> {
    std::env::var_os("USERPROFILE")
        .or_else(|| std::env::var_os("HOME"))
        .map(PathBuf::from)
}
