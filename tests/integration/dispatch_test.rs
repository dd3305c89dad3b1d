//! Dispatch tests: command selection, default command, exit statuses.

use keel::commands::ExitStatus;
use keel::config::Config;
use pretty_assertions::assert_eq;

use super::common::{args, bootstrap, bootstrap_with, register_probe, run};

#[tokio::test]
async fn test_named_command_runs_once_with_remaining_args() {
    let (container, output) = bootstrap(&["build", "--release", "-j", "4"]);
    let build = register_probe(&container, "build", ExitStatus::SUCCESS);
    let test = register_probe(&container, "test", ExitStatus::SUCCESS);

    let status = run(&container, &output).await;

    assert_eq!(status, ExitStatus::SUCCESS);
    assert_eq!(build.runs(), 1);
    assert_eq!(build.seen(), vec![args(&["--release", "-j", "4"])]);
    assert_eq!(test.builds(), 0);
    assert!(output.captured().stderr.is_empty());
}

#[tokio::test]
async fn test_multi_word_command_name() {
    let (container, output) = bootstrap(&["list-services"]);
    let list = register_probe(&container, "list-services", ExitStatus::SUCCESS);

    assert!(container.contains("listServicesCommand"));
    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    assert_eq!(list.runs(), 1);
}

#[tokio::test]
async fn test_command_status_is_the_exit_status() {
    let (container, output) = bootstrap(&["lint"]);
    register_probe(&container, "lint", ExitStatus::new(3));

    assert_eq!(run(&container, &output).await, ExitStatus::new(3));
}

#[tokio::test]
async fn test_no_args_runs_default_command() {
    let config = Config {
        default_command: "build".to_string(),
        ..Config::default()
    };
    let (container, output) = bootstrap_with(config, &[]);
    let build = register_probe(&container, "build", ExitStatus::SUCCESS);

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    assert_eq!(build.runs(), 1);
    assert_eq!(build.seen(), vec![Vec::<String>::new()]);
}

#[tokio::test]
async fn test_no_args_shows_help_by_default() {
    let (container, output) = bootstrap(&[]);

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    let stdout = output.captured().stdout;
    assert!(stdout.contains("Available commands:"));
    assert!(stdout.contains("version"));
}

#[tokio::test]
async fn test_unknown_command_fails_with_suggestion() {
    let (container, output) = bootstrap(&["biuld"]);
    let build = register_probe(&container, "build", ExitStatus::SUCCESS);

    let status = run(&container, &output).await;

    assert_eq!(status, ExitStatus::FAILURE);
    assert_eq!(build.builds(), 0);
    let stderr = output.captured().stderr;
    assert!(stderr.contains("Unknown command 'biuld'"));
    assert!(stderr.contains("Did you mean: build?"));
    assert!(output.captured().stdout.is_empty());
}

#[tokio::test]
async fn test_unknown_command_without_suggestions() {
    let (container, output) = bootstrap(&["frobnicate"]);

    assert_ne!(run(&container, &output).await, ExitStatus::SUCCESS);
    let stderr = output.captured().stderr;
    assert!(stderr.contains("Unknown command 'frobnicate'"));
    assert!(!stderr.contains("Did you mean"));
}

#[tokio::test]
async fn test_non_command_service_is_not_dispatchable() {
    // `config` is registered, but not as a command.
    let (container, output) = bootstrap(&["config"]);

    assert_eq!(run(&container, &output).await, ExitStatus::FAILURE);
    assert!(output.captured().stderr.contains("Unknown command 'config'"));
}

#[tokio::test]
async fn test_command_error_is_reported_with_command_name() {
    use async_trait::async_trait;
    use keel::commands::{register_command, Command};
    use std::sync::Arc;

    struct Failing;

    #[async_trait]
    impl Command for Failing {
        async fn execute(&self, _args: &[String]) -> anyhow::Result<ExitStatus> {
            anyhow::bail!("disk full")
        }
    }

    let (container, output) = bootstrap(&["deploy"]);
    register_command(&container, "deploy", "Deploy", |_| async {
        Ok(Arc::new(Failing) as Arc<dyn Command>)
    })
    .unwrap();

    assert_eq!(run(&container, &output).await, ExitStatus::FAILURE);
    let stderr = output.captured().stderr;
    assert!(stderr.contains("deploy"), "stderr: {stderr}");
    assert!(stderr.contains("disk full"), "stderr: {stderr}");
}

#[tokio::test]
async fn test_help_for_registered_command() {
    let (container, output) = bootstrap(&["help", "build"]);
    register_probe(&container, "build", ExitStatus::SUCCESS);

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    let stdout = output.captured().stdout;
    assert!(stdout.contains("Usage: keel build [args...]"));
    assert!(stdout.contains("Run build"));
}
