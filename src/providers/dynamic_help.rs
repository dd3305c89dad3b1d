//! Built-in help provider.

use async_trait::async_trait;
use serde_json::json;

use super::{HelpOptions, HelpProvider, LocalVariables};
use crate::constants::{APP_NAME, COMPLETION_SENTINEL, VERSION};

/// Applies to every run and exposes the tool's constants to help templates.
#[derive(Debug, Clone)]
pub struct DynamicHelpProvider {
    default_command: String,
}

impl DynamicHelpProvider {
    /// Creates the provider for a tool whose default command is `default_command`.
    pub fn new(default_command: impl Into<String>) -> Self {
        Self {
            default_command: default_command.into(),
        }
    }
}

#[async_trait]
impl HelpProvider for DynamicHelpProvider {
    async fn is_project_type(&self, _args: &[String]) -> bool {
        true
    }

    async fn get_local_variables(&self, options: &HelpOptions) -> anyhow::Result<LocalVariables> {
        let mut variables = LocalVariables::new();
        variables.insert(
            "constants".to_string(),
            json!({
                "APP_NAME": APP_NAME,
                "VERSION": VERSION,
                "COMPLETION_SENTINEL": COMPLETION_SENTINEL,
                "DEFAULT_COMMAND": self.default_command,
            }),
        );
        variables.insert("isHtml".to_string(), json!(options.is_html));
        Ok(variables)
    }

    async fn completion_hints(&self, words: &[String]) -> Vec<String> {
        match words.first().map(String::as_str) {
            Some("help") if words.len() > 1 => vec!["--html".to_string()],
            _ => Vec::new(),
        }
    }
}
