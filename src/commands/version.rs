//! The built-in `version` command.

use std::sync::Arc;

use async_trait::async_trait;

use super::{Command, ExitStatus};
use crate::constants::{APP_NAME, VERSION};
use crate::output::Output;

/// Prints the tool name and version.
pub struct VersionCommand {
    output: Arc<Output>,
}

impl VersionCommand {
    /// Creates the command.
    pub fn new(output: Arc<Output>) -> Self {
        Self { output }
    }
}

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, _args: &[String]) -> anyhow::Result<ExitStatus> {
        self.output.line(format!("{APP_NAME} {VERSION}"));
        Ok(ExitStatus::SUCCESS)
    }
}
