//! Output sink shared by commands and the dispatcher.
//!
//! Writes to the process's stdout/stderr, or into memory so tests can assert
//! on what a command printed.

use std::io::{self, Write};
use std::sync::Mutex;

/// Text captured by a buffered [`Output`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    /// Everything written with [`Output::line`].
    pub stdout: String,
    /// Everything written with [`Output::error_line`].
    pub stderr: String,
}

#[derive(Debug)]
enum Target {
    Console,
    Buffer(Mutex<Captured>),
}

/// Line-oriented output for user-facing text.
#[derive(Debug)]
pub struct Output {
    target: Target,
}

impl Output {
    /// Creates an output that writes to the process's stdout and stderr.
    pub fn console() -> Self {
        Self {
            target: Target::Console,
        }
    }

    /// Creates an output that records everything in memory.
    pub fn buffered() -> Self {
        Self {
            target: Target::Buffer(Mutex::new(Captured::default())),
        }
    }

    /// Writes a line to standard output.
    pub fn line(&self, text: impl AsRef<str>) {
        match &self.target {
            // A closed pipe (e.g. `keel completion | head -1`) is not an error worth reporting.
            Target::Console => {
                let _ = writeln!(io::stdout().lock(), "{}", text.as_ref());
            }
            Target::Buffer(captured) => {
                if let Ok(mut captured) = captured.lock() {
                    captured.stdout.push_str(text.as_ref());
                    captured.stdout.push('\n');
                }
            }
        }
    }

    /// Writes a line to standard error.
    pub fn error_line(&self, text: impl AsRef<str>) {
        match &self.target {
            Target::Console => {
                let _ = writeln!(io::stderr().lock(), "{}", text.as_ref());
            }
            Target::Buffer(captured) => {
                if let Ok(mut captured) = captured.lock() {
                    captured.stderr.push_str(text.as_ref());
                    captured.stderr.push('\n');
                }
            }
        }
    }

    /// Returns the captured text. Console outputs capture nothing.
    pub fn captured(&self) -> Captured {
        match &self.target {
            Target::Console => Captured::default(),
            Target::Buffer(captured) => captured
                .lock()
                .map(|captured| captured.clone())
                .unwrap_or_default(),
        }
    }
}
