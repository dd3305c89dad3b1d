//! Configuration management for keel.
//!
//! Handles loading configuration from a TOML file and environment variables.

use crate::error::{KeelError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that enables debug output when set to `1` or `true`.
pub const DEBUG_ENV: &str = "KEEL_DEBUG";

/// Main configuration structure for keel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// Print full error chains and raise the default log level.
    #[serde(default)]
    pub debug: bool,

    /// Command run when no arguments are given.
    #[serde(default = "default_command")]
    pub default_command: String,

    /// Client-specific message files layered over the built-in messages.
    #[serde(default)]
    pub message_files: Vec<PathBuf>,
}

fn default_command() -> String {
    "help".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            debug: false,
            default_command: default_command(),
            message_files: Vec::new(),
        }
    }
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("keel")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| KeelError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        let mut config: Self = toml::from_str(content).map_err(|e| {
            KeelError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })?;

        // Relative message files are relative to the config file.
        if let Some(dir) = path.parent() {
            for file in &mut config.message_files {
                if file.is_relative() {
                    let joined = dir.join(&*file);
                    *file = joined;
                }
            }
        }

        if config.default_command.trim().is_empty() {
            return Err(KeelError::config(format!(
                "Configuration error in {}:\n  default_command must not be empty",
                path.display()
            )));
        }

        Ok(config)
    }

    /// Applies environment variables (`KEEL_DEBUG`) on top of the file values.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var(DEBUG_ENV) {
            if let Some(debug) = parse_flag(&value) {
                self.debug = debug;
            }
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" | "" => Some(false),
        _ => None,
    }
}
