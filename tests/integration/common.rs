//! Shared helpers for integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keel::app;
use keel::commands::{register_command, Command, ExitStatus};
use keel::config::Config;
use keel::container::Container;
use keel::output::Output;

/// Converts string literals into owned arguments.
pub fn args(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// A command that counts its runs and records the arguments it saw.
pub struct Probe {
    runs: Arc<AtomicUsize>,
    seen: Arc<Mutex<Vec<Vec<String>>>>,
    status: ExitStatus,
}

#[async_trait]
impl Command for Probe {
    async fn execute(&self, args: &[String]) -> anyhow::Result<ExitStatus> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        self.seen.lock().unwrap().push(args.to_vec());
        Ok(self.status)
    }
}

/// Observes a registered [`Probe`].
#[derive(Clone, Default)]
pub struct ProbeHandle {
    /// Number of times the command executed.
    pub runs: Arc<AtomicUsize>,
    /// Number of times the command was constructed.
    pub builds: Arc<AtomicUsize>,
    /// Arguments of each execution.
    pub seen: Arc<Mutex<Vec<Vec<String>>>>,
}

impl ProbeHandle {
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn builds(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    pub fn seen(&self) -> Vec<Vec<String>> {
        self.seen.lock().unwrap().clone()
    }
}

/// Registers a probe command under `name` returning `status`.
pub fn register_probe(container: &Container, name: &str, status: ExitStatus) -> ProbeHandle {
    let handle = ProbeHandle::default();
    let factory_handle = handle.clone();
    register_command(container, name, format!("Run {name}"), move |_| {
        let handle = factory_handle.clone();
        async move {
            handle.builds.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Probe {
                runs: handle.runs,
                seen: handle.seen,
                status,
            }) as Arc<dyn Command>)
        }
    })
    .unwrap();
    handle
}

/// A bootstrapped container over `words` plus the output it writes to.
pub fn bootstrap(words: &[&str]) -> (Arc<Container>, Arc<Output>) {
    bootstrap_with(Config::default(), words)
}

/// Like [`bootstrap`] with an explicit config.
pub fn bootstrap_with(config: Config, words: &[&str]) -> (Arc<Container>, Arc<Output>) {
    let output = Arc::new(Output::buffered());
    let container = app::build_container(config, args(words), Arc::clone(&output)).unwrap();
    (container, output)
}

/// Runs one dispatch without any cancellation source.
pub async fn run(container: &Arc<Container>, output: &Arc<Output>) -> ExitStatus {
    app::run_until(
        Arc::clone(container),
        Arc::clone(output),
        std::future::pending(),
    )
    .await
}
