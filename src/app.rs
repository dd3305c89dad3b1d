//! Process bootstrap for keel.
//!
//! Builds and populates the container, resolves the cross-cutting services,
//! runs exactly one dispatch path, and disposes the container before the
//! exit status is returned. Every failure ends here as a message and a
//! non-zero status.

use std::any::Any;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info};

use crate::cli::Cli;
use crate::commands::{
    register_command, Command, CommandDispatcher, DispatchMode, ExitStatus, HelpCommand,
    ProcessArgs, VersionCommand,
};
use crate::config::Config;
use crate::constants::services;
use crate::container::{Container, Resolver};
use crate::error::{KeelError, Result};
use crate::logging;
use crate::messages::{MessagesService, CANCELLED};
use crate::output::Output;
use crate::providers::{register_help_provider, DynamicHelpProvider, HelpProvider};
use crate::reporter::ErrorReporter;

/// Loads the configuration selected by the command line.
///
/// Precedence: `--debug` over `KEEL_DEBUG` over the config file.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config_path();
    let mut config = Config::load_from_file(&path)?;
    config.apply_env_overrides();
    if cli.debug {
        config.debug = true;
    }
    info!(path = %path.display(), debug = config.debug, "loaded config");
    Ok(config)
}

/// Creates a container with every built-in service registered.
///
/// Nothing is resolved here; callers may register further services (plugins,
/// extra commands, providers) before running.
pub fn build_container(config: Config, args: Vec<String>, output: Arc<Output>) -> Result<Arc<Container>> {
    let container = Container::new();
    let default_command = config.default_command.clone();

    container.register_instance(services::CONFIG, Arc::new(config))?;
    container.register_instance(services::OUTPUT, output)?;
    container.register_instance(services::PROCESS_ARGS, Arc::new(ProcessArgs(args)))?;

    container.register(services::ERRORS, |resolver: Resolver| async move {
        let config = resolver.resolve::<Config>(services::CONFIG).await?;
        Ok::<_, anyhow::Error>(Arc::new(ErrorReporter::new(config.debug)))
    })?;

    container.register(services::MESSAGES, |resolver: Resolver| async move {
        let config = resolver.resolve::<Config>(services::CONFIG).await?;
        Ok::<_, anyhow::Error>(Arc::new(MessagesService::from_files(&config.message_files)?))
    })?;

    container.register(services::COMMAND_DISPATCHER, |resolver: Resolver| async move {
        let config = resolver.resolve::<Config>(services::CONFIG).await?;
        let args = resolver.resolve::<ProcessArgs>(services::PROCESS_ARGS).await?;
        let messages = resolver.resolve::<MessagesService>(services::MESSAGES).await?;
        let output = resolver.resolve::<Output>(services::OUTPUT).await?;
        Ok::<_, anyhow::Error>(Arc::new(CommandDispatcher::new(
            Arc::clone(resolver.container()),
            args.0.clone(),
            config.default_command.clone(),
            messages,
            output,
        )))
    })?;

    register_help_provider(&container, services::DYNAMIC_HELP_PROVIDER, move |_| {
        let default_command = default_command.clone();
        async move { Ok(Arc::new(DynamicHelpProvider::new(default_command)) as Arc<dyn HelpProvider>) }
    })?;

    register_command(
        &container,
        "help",
        "Show an overview of commands, or help for one command",
        |resolver: Resolver| async move {
            let messages = resolver.resolve::<MessagesService>(services::MESSAGES).await?;
            let output = resolver.resolve::<Output>(services::OUTPUT).await?;
            Ok::<_, anyhow::Error>(Arc::new(HelpCommand::new(Arc::clone(resolver.container()), messages, output))
                as Arc<dyn Command>)
        },
    )?;

    register_command(
        &container,
        "version",
        "Print the version",
        |resolver: Resolver| async move {
            let output = resolver.resolve::<Output>(services::OUTPUT).await?;
            Ok::<_, anyhow::Error>(Arc::new(VersionCommand::new(output)) as Arc<dyn Command>)
        },
    )?;

    Ok(container)
}

/// How a dispatch ended.
enum Outcome {
    Finished(Result<ExitStatus>),
    Cancelled,
    Panicked(String),
}

async fn dispatch(container: Arc<Container>) -> Result<ExitStatus> {
    let dispatcher = container
        .resolve::<CommandDispatcher>(services::COMMAND_DISPATCHER)
        .await?;
    match dispatcher.mode() {
        DispatchMode::Completion => dispatcher.complete_command().await,
        DispatchMode::Normal => dispatcher.dispatch_command().await,
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        return (*message).to_string();
    }
    if let Some(message) = payload.downcast_ref::<String>() {
        return message.clone();
    }
    "command panicked".to_string()
}

/// Runs one dispatch on a populated container, then disposes it.
///
/// If `shutdown` completes first the dispatch is aborted and the run ends
/// with [`ExitStatus::CANCELLED`]. The container is disposed in every case,
/// strictly after the dispatch has stopped.
pub async fn run_until<S>(container: Arc<Container>, output: Arc<Output>, shutdown: S) -> ExitStatus
where
    S: Future<Output = ()>,
{
    let prepared = async {
        let reporter = container.resolve::<ErrorReporter>(services::ERRORS).await?;
        let messages = container
            .resolve::<MessagesService>(services::MESSAGES)
            .await?;
        Ok::<_, KeelError>((reporter, messages))
    }
    .await;

    let (reporter, messages) = match prepared {
        Ok(services) => services,
        Err(e) => {
            container.dispose().await;
            ErrorReporter::default().report(&output, &e.into());
            return ExitStatus::FAILURE;
        }
    };

    let mut task = tokio::spawn(dispatch(Arc::clone(&container)));
    tokio::pin!(shutdown);

    let outcome = tokio::select! {
        joined = &mut task => match joined {
            Ok(result) => Outcome::Finished(result),
            Err(e) if e.is_panic() => Outcome::Panicked(panic_message(e.into_panic())),
            Err(_) => Outcome::Cancelled,
        },
        () = &mut shutdown => {
            task.abort();
            // Wait for the task to stop before anything is released.
            let _ = (&mut task).await;
            Outcome::Cancelled
        }
    };

    container.dispose().await;

    match outcome {
        Outcome::Finished(Ok(status)) => {
            debug!(code = status.code(), "run finished");
            status
        }
        // Already reported to the user by the dispatcher.
        Outcome::Finished(Err(KeelError::CommandNotFound { .. })) => ExitStatus::FAILURE,
        Outcome::Finished(Err(e)) => {
            debug!(category = e.category(), programmer_error = e.is_programmer_error(), "run failed");
            reporter.report(&output, &e.into());
            ExitStatus::FAILURE
        }
        Outcome::Cancelled => {
            output.error_line(messages.get(CANCELLED, &[]));
            ExitStatus::CANCELLED
        }
        Outcome::Panicked(message) => {
            let err = KeelError::internal(format!("dispatch panicked: {message}"));
            reporter.report(&output, &err.into());
            ExitStatus::FAILURE
        }
    }
}

/// Runs one dispatch, cancelling on Ctrl-C.
pub async fn run(container: Arc<Container>, output: Arc<Output>) -> ExitStatus {
    run_until(container, output, async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available: never cancel.
            std::future::pending::<()>().await;
        }
    })
    .await
}

/// Entry point used by the binary.
pub async fn run_cli(cli: Cli) -> ExitStatus {
    let output = Arc::new(Output::console());

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            logging::init_stderr_logging(cli.debug);
            ErrorReporter::new(cli.debug).report(&output, &e.into());
            return ExitStatus::FAILURE;
        }
    };
    logging::init_stderr_logging(config.debug);
    let debug = config.debug;

    let container = match build_container(config, cli.args, Arc::clone(&output)) {
        Ok(container) => container,
        Err(e) => {
            ErrorReporter::new(debug).report(&output, &e.into());
            return ExitStatus::FAILURE;
        }
    };

    run(container, output).await
}
