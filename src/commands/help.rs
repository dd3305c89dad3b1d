//! The built-in `help` command.
//!
//! Help pages are rendered from templates whose `{{path}}` placeholders are
//! filled from the selected help provider's local variables. The command
//! list comes from registration metadata, so no command is built to show it.

use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::{Captures, Regex};

use super::{command_name_from_service, command_service_name, Command, ExitStatus};
use crate::container::{Capability, Container, ServiceInfo};
use crate::messages::{MessagesService, AVAILABLE_COMMANDS};
use crate::output::Output;
use crate::providers::{self, HelpOptions, LocalVariables};

/// Page header shared by every help page.
pub const HEADER_TEMPLATE: &str = "{{constants.APP_NAME}} {{constants.VERSION}}";

/// Usage block shown on the overview page.
pub const USAGE_TEMPLATE: &str = "Usage:
  {{constants.APP_NAME}} <command> [args...]
  {{constants.APP_NAME}} {{constants.COMPLETION_SENTINEL}} [words...]

Running {{constants.APP_NAME}} without a command runs '{{constants.DEFAULT_COMMAND}}'.";

/// Usage line shown on a single command's page.
pub const COMMAND_USAGE_TEMPLATE: &str = "Usage: {{constants.APP_NAME}} {{command}} [args...]";

const HTML_FLAG: &str = "--html";

/// Prints an overview of registered commands, or the page for one command.
///
/// `help [--html] [COMMAND]`
pub struct HelpCommand {
    container: Arc<Container>,
    messages: Arc<MessagesService>,
    output: Arc<Output>,
}

impl HelpCommand {
    /// Creates the command.
    pub fn new(
        container: Arc<Container>,
        messages: Arc<MessagesService>,
        output: Arc<Output>,
    ) -> Self {
        Self {
            container,
            messages,
            output,
        }
    }

    fn render_overview(&self, commands: &[ServiceInfo], vars: &LocalVariables, is_html: bool) -> String {
        let header = render_template(HEADER_TEMPLATE, vars);
        let usage = render_template(USAGE_TEMPLATE, vars);
        let heading = self.messages.get(AVAILABLE_COMMANDS, &[]);
        let rows: Vec<(String, String)> = commands
            .iter()
            .filter_map(|info| {
                let name = command_name_from_service(&info.name)?;
                Some((name, info.description.clone().unwrap_or_default()))
            })
            .collect();

        if is_html {
            let mut page = format!(
                "<h1>{}</h1>\n<pre>{}</pre>\n<h2>{}</h2>\n<dl>\n",
                escape_html(&header),
                escape_html(&usage),
                escape_html(&heading)
            );
            for (name, description) in &rows {
                page.push_str(&format!(
                    "  <dt>{}</dt><dd>{}</dd>\n",
                    escape_html(name),
                    escape_html(description)
                ));
            }
            page.push_str("</dl>");
            return page;
        }

        let width = rows.iter().map(|(name, _)| name.len()).max().unwrap_or(0);
        let mut page = format!("{header}\n\n{usage}\n\n{heading}\n");
        for (name, description) in &rows {
            page.push_str(&format!("  {name:<width$}  {description}\n"));
        }
        page.trim_end().to_string()
    }

    fn render_command(&self, command: &str, info: &ServiceInfo, vars: &LocalVariables, is_html: bool) -> String {
        let mut vars = vars.clone();
        vars.insert("command".to_string(), serde_json::Value::from(command));
        let header = render_template(HEADER_TEMPLATE, &vars);
        let usage = render_template(COMMAND_USAGE_TEMPLATE, &vars);
        let description = info.description.as_deref().unwrap_or("");

        if is_html {
            format!(
                "<h1>{}</h1>\n<pre>{}</pre>\n<p>{}</p>",
                escape_html(&header),
                escape_html(&usage),
                escape_html(description)
            )
        } else {
            format!("{header}\n\n{usage}\n\n  {description}")
        }
    }
}

#[async_trait]
impl Command for HelpCommand {
    async fn execute(&self, args: &[String]) -> anyhow::Result<ExitStatus> {
        let is_html = args.iter().any(|arg| arg == HTML_FLAG);
        let topic = args.iter().find(|arg| !arg.starts_with('-'));

        let options = HelpOptions {
            is_html,
            args: args.to_vec(),
        };
        let vars = providers::describe(&self.container, &options)
            .await?
            .map(|descriptor| descriptor.local_variables)
            .unwrap_or_default();
        let commands = self.container.services_with(Capability::Command)?;

        let page = match topic {
            Some(topic) => {
                let service = command_service_name(topic);
                let Some(info) = commands.iter().find(|info| info.name == service) else {
                    anyhow::bail!("No help available for unknown command '{topic}'");
                };
                self.render_command(topic, info, &vars, is_html)
            }
            None => self.render_overview(&commands, &vars, is_html),
        };

        self.output.line(page);
        Ok(ExitStatus::SUCCESS)
    }
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\{\{\s*([A-Za-z0-9_.]+)\s*\}\}").expect("placeholder pattern is valid")
    })
}

/// Replaces `{{a.b.c}}` placeholders with values looked up in `vars`.
///
/// Strings are inserted verbatim, other JSON values in their JSON form.
/// Placeholders with no matching variable are left untouched.
pub fn render_template(template: &str, vars: &LocalVariables) -> String {
    placeholder()
        .replace_all(template, |caps: &Captures<'_>| {
            let path = &caps[1];
            match lookup(vars, path) {
                Some(serde_json::Value::String(s)) => s.clone(),
                Some(value) => value.to_string(),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

fn lookup<'a>(vars: &'a LocalVariables, path: &str) -> Option<&'a serde_json::Value> {
    let mut segments = path.split('.');
    let mut value = vars.get(segments.next()?)?;
    for segment in segments {
        value = value.get(segment)?;
    }
    Some(value)
}

fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
