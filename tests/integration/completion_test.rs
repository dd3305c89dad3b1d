//! Completion mode tests.

use std::sync::Arc;

use async_trait::async_trait;
use keel::commands::ExitStatus;
use keel::providers::{register_help_provider, HelpOptions, HelpProvider, LocalVariables};
use pretty_assertions::assert_eq;

use super::common::{bootstrap, register_probe, run};

fn lines(text: &str) -> Vec<&str> {
    text.lines().collect()
}

#[tokio::test]
async fn test_completion_lists_commands_without_running_them() {
    let (container, output) = bootstrap(&["completion"]);
    let build = register_probe(&container, "build", ExitStatus::FAILURE);
    let bundle = register_probe(&container, "bundle", ExitStatus::FAILURE);

    let status = run(&container, &output).await;

    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(
        lines(&output.captured().stdout),
        vec!["build", "bundle", "help", "version"]
    );
    assert_eq!(build.builds(), 0);
    assert_eq!(bundle.builds(), 0);
    assert_eq!(build.runs() + bundle.runs(), 0);
}

#[tokio::test]
async fn test_completion_filters_by_prefix() {
    let (container, output) = bootstrap(&["completion", "bu"]);
    register_probe(&container, "build", ExitStatus::SUCCESS);
    register_probe(&container, "bundle", ExitStatus::SUCCESS);
    register_probe(&container, "test", ExitStatus::SUCCESS);

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    assert_eq!(lines(&output.captured().stdout), vec!["build", "bundle"]);
}

#[tokio::test]
async fn test_completion_of_help_arguments() {
    let (container, output) = bootstrap(&["completion", "help", "--"]);

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    assert_eq!(lines(&output.captured().stdout), vec!["--html"]);
}

#[tokio::test]
async fn test_completion_with_no_match_prints_nothing() {
    let (container, output) = bootstrap(&["completion", "zzz"]);

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    assert_eq!(output.captured().stdout, "");
    assert_eq!(output.captured().stderr, "");
}

struct TargetHints;

#[async_trait]
impl HelpProvider for TargetHints {
    async fn is_project_type(&self, _args: &[String]) -> bool {
        true
    }

    async fn get_local_variables(&self, _options: &HelpOptions) -> anyhow::Result<LocalVariables> {
        Ok(LocalVariables::new())
    }

    async fn completion_hints(&self, words: &[String]) -> Vec<String> {
        if words.first().map(String::as_str) == Some("build") {
            vec!["debug".to_string(), "release".to_string()]
        } else {
            Vec::new()
        }
    }
}

#[tokio::test]
async fn test_provider_hints_extend_candidates() {
    let (container, output) = bootstrap(&["completion", "build", "re"]);
    register_probe(&container, "build", ExitStatus::SUCCESS);
    register_help_provider(&container, "targetHints", |_| async {
        Ok(Arc::new(TargetHints) as Arc<dyn HelpProvider>)
    })
    .unwrap();

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    assert_eq!(lines(&output.captured().stdout), vec!["release"]);
}
