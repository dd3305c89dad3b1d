//! Rendering of top-level failures for the user.

use crate::output::Output;

/// Formats errors that reach the top of a run.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter {
    /// Include the full cause chain and backtrace instead of a single line.
    pub print_call_stack: bool,
}

impl ErrorReporter {
    /// Creates a reporter.
    pub fn new(print_call_stack: bool) -> Self {
        Self { print_call_stack }
    }

    /// Renders `err` as user-facing text.
    pub fn render(&self, err: &anyhow::Error) -> String {
        if self.print_call_stack {
            format!("{err:?}")
        } else {
            format!("{err:#}")
        }
    }

    /// Renders `err` and writes it to the error stream of `output`.
    pub fn report(&self, output: &Output, err: &anyhow::Error) {
        output.error_line(self.render(err));
    }
}
