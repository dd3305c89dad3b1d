//! Commands and their dispatch.
//!
//! A command is a service implementing [`Command`], registered under the
//! derived name `<camelCaseName>Command` and tagged with
//! [`Capability::Command`] so that completion and help can list commands
//! without building them.

pub mod dispatcher;
pub mod help;
pub mod version;

pub use dispatcher::{CommandDispatcher, DispatchMode, ProcessArgs};
pub use help::HelpCommand;
pub use version::VersionCommand;

use std::future::Future;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;

use crate::constants::COMMAND_SUFFIX;
use crate::container::{Capability, Container, Registration, Resolver};
use crate::error::{KeelError, Result};

/// Process exit status produced by a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(u8);

impl ExitStatus {
    /// The command succeeded.
    pub const SUCCESS: Self = Self(0);
    /// The command failed.
    pub const FAILURE: Self = Self(1);
    /// The run was interrupted (128 + SIGINT).
    pub const CANCELLED: Self = Self(130);

    /// Creates a status from a raw exit code.
    pub fn new(code: u8) -> Self {
        Self(code)
    }

    /// Returns the raw exit code.
    pub fn code(self) -> u8 {
        self.0
    }

    /// Returns true for a zero exit code.
    pub fn is_success(self) -> bool {
        self.0 == 0
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}

/// A command the dispatcher can execute.
#[async_trait]
pub trait Command: Send + Sync {
    /// Runs the command with the arguments that followed its name.
    async fn execute(&self, args: &[String]) -> anyhow::Result<ExitStatus>;
}

/// Returns the service name for a command name.
///
/// `build` becomes `buildCommand`, `list-services` becomes `listServicesCommand`.
pub fn command_service_name(command: &str) -> String {
    let mut service = String::with_capacity(command.len() + COMMAND_SUFFIX.len());
    for (i, segment) in command.split(['-', '_']).enumerate() {
        if i == 0 {
            service.push_str(segment);
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            service.extend(first.to_uppercase());
            service.push_str(chars.as_str());
        }
    }
    service.push_str(COMMAND_SUFFIX);
    service
}

/// Returns the command name for a command service name, if it has the suffix.
pub fn command_name_from_service(service: &str) -> Option<String> {
    let stem = service.strip_suffix(COMMAND_SUFFIX)?;
    if stem.is_empty() {
        return None;
    }
    let mut command = String::with_capacity(stem.len() + 4);
    for c in stem.chars() {
        if c.is_uppercase() {
            command.push('-');
            command.extend(c.to_lowercase());
        } else {
            command.push(c);
        }
    }
    Some(command)
}

fn command_name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[a-z][a-z0-9]*(-[a-z][a-z0-9]*)*$").expect("command name pattern is valid")
    })
}

/// Returns true if `command` survives the round trip through its service
/// name, i.e. it is lowercase words joined by `-`.
pub fn is_valid_command_name(command: &str) -> bool {
    command_name_pattern().is_match(command)
}

/// Registers a command and declares its capability.
///
/// Names must be lowercase words joined by `-` (`build`, `list-services`);
/// anything else is rejected with [`KeelError::InvalidCommandName`].
pub fn register_command<F, Fut>(
    container: &Container,
    command: &str,
    description: impl Into<String>,
    factory: F,
) -> Result<()>
where
    F: Fn(Resolver) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Arc<dyn Command>>> + Send + 'static,
{
    if !is_valid_command_name(command) {
        return Err(KeelError::InvalidCommandName {
            name: command.to_string(),
        });
    }
    container.add(
        Registration::builder(command_service_name(command), factory)
            .capability(Capability::Command)
            .description(description)
            .build(),
    )
}
