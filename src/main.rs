//! Keel - an extensible command-line tool built around a service container.

use std::process::ExitCode;

use keel::app;
use keel::cli::Cli;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();
    app::run_cli(cli).await.into()
}
