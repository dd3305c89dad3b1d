//! Help provider selection tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use keel::commands::ExitStatus;
use keel::container::Container;
use keel::providers::{self, register_help_provider, HelpOptions, HelpProvider, LocalVariables};
use serde_json::json;

use super::common::{bootstrap, run};

/// Applies when the arguments mention `marker`.
struct ProjectProvider {
    marker: &'static str,
    app_name: &'static str,
}

#[async_trait]
impl HelpProvider for ProjectProvider {
    async fn is_project_type(&self, args: &[String]) -> bool {
        args.iter().any(|arg| arg == self.marker)
    }

    async fn get_local_variables(&self, _options: &HelpOptions) -> anyhow::Result<LocalVariables> {
        Ok(LocalVariables::from([(
            "constants".to_string(),
            json!({"APP_NAME": self.app_name, "VERSION": "0.0.0"}),
        )]))
    }
}

fn register_project(
    container: &Container,
    name: &str,
    marker: &'static str,
    app_name: &'static str,
) -> Arc<AtomicUsize> {
    let builds = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&builds);
    register_help_provider(container, name, move |_| {
        let counter = Arc::clone(&counter);
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(ProjectProvider { marker, app_name }) as Arc<dyn HelpProvider>)
        }
    })
    .unwrap();
    builds
}

fn options(args: &[&str]) -> HelpOptions {
    HelpOptions {
        is_html: false,
        args: args.iter().map(|a| a.to_string()).collect(),
    }
}

#[tokio::test]
async fn test_first_applicable_provider_wins() {
    let container = Container::new();
    register_project(&container, "cargoProvider", "cargo", "cargo-tool");
    register_project(&container, "npmProvider", "cargo", "npm-tool");

    let descriptor = providers::describe(&container, &options(&["cargo"]))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(descriptor.provider_name, "cargoProvider");
    assert_eq!(descriptor.capability_name, "dynamicHelpProvider");
    assert_eq!(descriptor.local_variables["constants"]["APP_NAME"], json!("cargo-tool"));
}

#[tokio::test]
async fn test_later_providers_not_built_after_match() {
    let container = Container::new();
    let first = register_project(&container, "first", "x", "first");
    let second = register_project(&container, "second", "x", "second");

    providers::select_provider(&container, &["x".to_string()])
        .await
        .unwrap();

    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_no_applicable_provider() {
    let container = Container::new();
    register_project(&container, "cargoProvider", "cargo", "cargo-tool");

    let descriptor = providers::describe(&container, &options(&["npm"])).await.unwrap();
    assert!(descriptor.is_none());
}

#[tokio::test]
async fn test_builtin_provider_is_selected_first_in_full_run() {
    // The built-in provider is registered during bootstrap, before any plugin.
    let (container, output) = bootstrap(&["help", "--html"]);
    let plugin = register_project(&container, "pluginProvider", "--html", "plugin-tool");

    assert_eq!(run(&container, &output).await, ExitStatus::SUCCESS);
    let stdout = output.captured().stdout;
    assert!(stdout.starts_with("<h1>keel "));
    assert!(!stdout.contains("plugin-tool"));
    assert_eq!(plugin.load(Ordering::SeqCst), 0);
}
