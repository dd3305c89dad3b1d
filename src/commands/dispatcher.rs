//! Command dispatch and completion.
//!
//! The dispatcher turns the process arguments into either one command
//! execution or a list of completion candidates. The mode is decided once,
//! from the first argument, and never changes.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, info};

use super::{command_name_from_service, command_service_name, Command, ExitStatus};
use crate::constants::{APP_NAME, COMPLETION_SENTINEL};
use crate::container::{Capability, Container};
use crate::error::{KeelError, Result};
use crate::messages::{MessagesService, COMMAND_NOT_FOUND, DID_YOU_MEAN};
use crate::output::Output;
use crate::providers;

/// The arguments of the current run, without the program name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessArgs(pub Vec<String>);

/// Whether a run executes a command or only reports completion candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Execute the named command.
    Normal,
    /// Print completion candidates; execute nothing.
    Completion,
}

impl DispatchMode {
    /// Derives the mode from the first argument.
    pub fn from_args(args: &[String]) -> Self {
        match args.first() {
            Some(first) if first == COMPLETION_SENTINEL => Self::Completion,
            _ => Self::Normal,
        }
    }
}

/// Routes process arguments to a command or to completion.
pub struct CommandDispatcher {
    container: Arc<Container>,
    args: Vec<String>,
    mode: DispatchMode,
    default_command: String,
    messages: Arc<MessagesService>,
    output: Arc<Output>,
}

impl CommandDispatcher {
    /// Creates a dispatcher over `args`.
    ///
    /// The dispatcher keeps the container alive until the container is
    /// disposed, which drops every instance including this one.
    pub fn new(
        container: Arc<Container>,
        args: Vec<String>,
        default_command: impl Into<String>,
        messages: Arc<MessagesService>,
        output: Arc<Output>,
    ) -> Self {
        let mode = DispatchMode::from_args(&args);
        Self {
            container,
            args,
            mode,
            default_command: default_command.into(),
            messages,
            output,
        }
    }

    /// Returns the mode selected for this run.
    pub fn mode(&self) -> DispatchMode {
        self.mode
    }

    /// Resolves and executes the command named by the first argument.
    ///
    /// With no arguments the configured default command runs. The command's
    /// status and errors are returned unchanged, apart from wrapping errors
    /// with the command name.
    pub async fn dispatch_command(&self) -> Result<ExitStatus> {
        let (name, args) = match self.args.split_first() {
            Some((name, rest)) => (name.as_str(), rest),
            None => (self.default_command.as_str(), &[][..]),
        };

        let service = command_service_name(name);
        let commands = self.container.names_with(Capability::Command)?;
        if !commands.contains(&service) {
            return Err(self.command_not_found(name, &commands));
        }

        let command = self.container.resolve::<dyn Command>(&service).await?;
        info!(command = %name, args = args.len(), "executing command");
        let status = command
            .execute(args)
            .await
            .map_err(|source| KeelError::CommandFailed {
                name: name.to_string(),
                source,
            })?;
        debug!(command = %name, code = status.code(), "command finished");
        Ok(status)
    }

    /// Prints completion candidates for the words after `completion`.
    ///
    /// Commands are listed from registration metadata only; none is built
    /// or executed.
    pub async fn complete_command(&self) -> Result<ExitStatus> {
        let words = self.args.get(1..).unwrap_or_default();
        let candidates = self.completion_candidates(words).await?;
        debug!(words = words.len(), candidates = candidates.len(), "completion");
        for candidate in &candidates {
            self.output.line(candidate);
        }
        Ok(ExitStatus::SUCCESS)
    }

    /// Returns the sorted candidates for the partially typed `words`.
    ///
    /// The last word is the one being completed. While it is also the first
    /// word, command names are offered; provider hints are always offered.
    pub async fn completion_candidates(&self, words: &[String]) -> Result<Vec<String>> {
        let partial = words.last().map(String::as_str).unwrap_or("");
        let mut candidates = BTreeSet::new();

        if words.len() <= 1 {
            candidates.extend(
                self.command_names()?
                    .into_iter()
                    .filter(|name| name.starts_with(partial)),
            );
        }

        candidates.extend(
            providers::completion_hints(&self.container, words)
                .await?
                .into_iter()
                .filter(|hint| hint.starts_with(partial)),
        );

        Ok(candidates.into_iter().collect())
    }

    fn command_names(&self) -> Result<Vec<String>> {
        Ok(self
            .container
            .names_with(Capability::Command)?
            .iter()
            .filter_map(|service| command_name_from_service(service))
            .collect())
    }

    fn command_not_found(&self, name: &str, services: &[String]) -> KeelError {
        let known: Vec<String> = services
            .iter()
            .filter_map(|service| command_name_from_service(service))
            .collect();
        let suggestions = suggest(name, &known);

        self.output
            .error_line(self.messages.get(COMMAND_NOT_FOUND, &[name, APP_NAME]));
        if !suggestions.is_empty() {
            self.output
                .error_line(self.messages.get(DID_YOU_MEAN, &[suggestions.join(", ").as_str()]));
        }

        KeelError::CommandNotFound {
            name: name.to_string(),
            suggestions,
        }
    }
}

/// Returns known names that start with `name` or are within two edits of it.
fn suggest(name: &str, known: &[String]) -> Vec<String> {
    let mut suggestions: Vec<String> = known
        .iter()
        .filter(|candidate| {
            (!name.is_empty() && candidate.starts_with(name))
                || strsim::levenshtein(name, candidate) <= 2
        })
        .cloned()
        .collect();
    suggestions.sort();
    suggestions
}
