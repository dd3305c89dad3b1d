//! User-facing message catalogue.
//!
//! Messages are looked up by key. Built-in defaults can be overridden by
//! client-specific JSON files, each a flat object of `"key": "text"` pairs.
//! Later files take precedence over earlier ones.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{KeelError, Result};

/// Shown when the first argument names no registered command.
pub const COMMAND_NOT_FOUND: &str = "commandNotFound";
/// Appended to [`COMMAND_NOT_FOUND`] when similar commands exist.
pub const DID_YOU_MEAN: &str = "didYouMean";
/// Shown when the run is interrupted.
pub const CANCELLED: &str = "cancelled";
/// Heading of the command list in help output.
pub const AVAILABLE_COMMANDS: &str = "availableCommands";

const DEFAULT_MESSAGES: &[(&str, &str)] = &[
    (
        COMMAND_NOT_FOUND,
        "Unknown command '{}'. Run '{} help' for a list of available commands.",
    ),
    (DID_YOU_MEAN, "Did you mean: {}?"),
    (CANCELLED, "Operation cancelled."),
    (AVAILABLE_COMMANDS, "Available commands:"),
];

/// Keyed message lookup with `{}` placeholder substitution.
#[derive(Debug, Clone)]
pub struct MessagesService {
    paths_to_message_json_files: Vec<PathBuf>,
    messages: HashMap<String, String>,
}

impl Default for MessagesService {
    fn default() -> Self {
        Self {
            paths_to_message_json_files: Vec::new(),
            messages: default_messages(),
        }
    }
}

fn default_messages() -> HashMap<String, String> {
    DEFAULT_MESSAGES
        .iter()
        .map(|(key, text)| (key.to_string(), text.to_string()))
        .collect()
}

impl MessagesService {
    /// Creates a catalogue with the built-in defaults and the given message
    /// files layered on top.
    pub fn from_files(paths: &[PathBuf]) -> Result<Self> {
        let mut service = Self::default();
        service.set_paths_to_message_json_files(paths.to_vec())?;
        Ok(service)
    }

    /// Returns the message files currently layered over the defaults.
    pub fn paths_to_message_json_files(&self) -> &[PathBuf] {
        &self.paths_to_message_json_files
    }

    /// Replaces the message files and reloads the catalogue.
    pub fn set_paths_to_message_json_files(&mut self, paths: Vec<PathBuf>) -> Result<()> {
        let mut messages = default_messages();
        for path in &paths {
            let overrides = load_message_file(path)?;
            debug!(path = %path.display(), count = overrides.len(), "loaded message file");
            messages.extend(overrides);
        }
        self.messages = messages;
        self.paths_to_message_json_files = paths;
        Ok(())
    }

    /// Returns the message for `key` with each `{}` replaced by the next arg.
    ///
    /// Unknown keys return the key itself so a missing translation is visible
    /// rather than silent.
    pub fn get(&self, key: &str, args: &[&str]) -> String {
        let Some(template) = self.messages.get(key) else {
            return key.to_string();
        };

        let mut out = String::with_capacity(template.len());
        let mut args = args.iter();
        let mut rest = template.as_str();
        while let Some(pos) = rest.find("{}") {
            out.push_str(&rest[..pos]);
            match args.next() {
                Some(arg) => out.push_str(arg),
                None => out.push_str("{}"),
            }
            rest = &rest[pos + 2..];
        }
        out.push_str(rest);
        out
    }
}

fn load_message_file(path: &Path) -> Result<HashMap<String, String>> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        KeelError::messages(format!(
            "Failed to read message file {}: {e}",
            path.display()
        ))
    })?;
    serde_json::from_str(&content).map_err(|e| {
        KeelError::messages(format!(
            "Invalid message file {}:\n  {e}",
            path.display()
        ))
    })
}
