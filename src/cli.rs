//! Command-line argument parsing for keel.
//!
//! Only global options are parsed here. Everything from the first positional
//! argument on is passed to the dispatcher untouched.

use clap::Parser;
use std::path::PathBuf;

/// Extensible command-line tool.
#[derive(Parser, Debug)]
#[command(name = "keel")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(long, value_name = "PATH", env = "KEEL_CONFIG")]
    pub config: Option<PathBuf>,

    /// Print full error chains and enable debug logging
    #[arg(long)]
    pub debug: bool,

    /// Command and its arguments, or `completion` followed by the words typed so far
    #[arg(
        value_name = "ARGS",
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    pub args: Vec<String>,
}

impl Cli {
    /// Parses command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Returns the config file path to use.
    ///
    /// Uses the --config argument if provided, otherwise the default path.
    pub fn config_path(&self) -> PathBuf {
        self.config
            .clone()
            .unwrap_or_else(crate::config::Config::default_path)
    }
}
