//! Error types for keel.
//!
//! Container errors are programmer errors and abort the current operation with
//! the offending name and resolution chain. Command errors are user-facing and
//! carry the failing command's own error as their source.

use std::fmt;

use thiserror::Error;

/// The chain of service names being resolved, outermost first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolutionChain(pub Vec<String>);

impl ResolutionChain {
    /// Returns the names in the chain.
    pub fn names(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ResolutionChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        f.write_str(&self.0.join(" -> "))
    }
}

impl From<Vec<String>> for ResolutionChain {
    fn from(names: Vec<String>) -> Self {
        Self(names)
    }
}

/// Main error type for keel operations.
#[derive(Error, Debug)]
pub enum KeelError {
    /// A name was resolved that was never registered.
    #[error("Unknown service '{name}' (resolution chain: {chain})")]
    UnknownService { name: String, chain: ResolutionChain },

    /// A name was registered twice.
    #[error("Service '{name}' is already registered")]
    DuplicateRegistration { name: String },

    /// A service transitively depends on itself.
    #[error("Cyclic dependency detected: {chain}")]
    CyclicDependency { chain: ResolutionChain },

    /// The container was used after `dispose()`.
    #[error("Cannot {operation} '{name}': container has been disposed")]
    ContainerDisposed {
        operation: &'static str,
        name: String,
    },

    /// A service was resolved as a different type than it was registered with.
    #[error("Service '{name}' is not of the requested type {expected}")]
    ServiceTypeMismatch {
        name: String,
        expected: &'static str,
    },

    /// A factory failed while constructing a service.
    #[error("Failed to construct service '{name}' (resolution chain: {chain})")]
    ServiceConstruction {
        name: String,
        chain: ResolutionChain,
        #[source]
        source: anyhow::Error,
    },

    /// A command name that is not lowercase words joined by '-'.
    #[error("Invalid command name '{name}': use lowercase words separated by '-'")]
    InvalidCommandName { name: String },

    /// No command is registered under the given name.
    #[error("Unknown command '{name}'")]
    CommandNotFound {
        name: String,
        suggestions: Vec<String>,
    },

    /// A command ran and returned an error.
    #[error("Command '{name}' failed")]
    CommandFailed {
        name: String,
        #[source]
        source: anyhow::Error,
    },

    /// Configuration errors (unreadable or invalid config file).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Message file errors (unreadable or malformed JSON).
    #[error("Messages error: {0}")]
    Messages(String),

    /// Internal application errors (poisoned locks, panicked tasks, etc.)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl KeelError {
    /// Creates a configuration error with the given message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Creates a messages error with the given message.
    pub fn messages(msg: impl Into<String>) -> Self {
        Self::Messages(msg.into())
    }

    /// Creates an internal error with the given message.
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Creates a disposed-container error for the given operation.
    pub fn disposed(operation: &'static str, name: impl Into<String>) -> Self {
        Self::ContainerDisposed {
            operation,
            name: name.into(),
        }
    }

    /// Returns true for errors caused by misuse of the container.
    ///
    /// These are never retried.
    pub fn is_programmer_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownService { .. }
                | Self::DuplicateRegistration { .. }
                | Self::CyclicDependency { .. }
                | Self::ContainerDisposed { .. }
                | Self::ServiceTypeMismatch { .. }
                | Self::InvalidCommandName { .. }
        )
    }

    /// Returns the error category as a string for display purposes.
    pub fn category(&self) -> &'static str {
        match self {
            Self::UnknownService { .. }
            | Self::DuplicateRegistration { .. }
            | Self::CyclicDependency { .. }
            | Self::ContainerDisposed { .. }
            | Self::ServiceTypeMismatch { .. }
            | Self::ServiceConstruction { .. } => "Container Error",
            Self::InvalidCommandName { .. }
            | Self::CommandNotFound { .. }
            | Self::CommandFailed { .. } => "Command Error",
            Self::Config(_) => "Configuration Error",
            Self::Messages(_) => "Messages Error",
            Self::Internal(_) => "Internal Error",
        }
    }
}

/// Result type alias using KeelError.
pub type Result<T> = std::result::Result<T, KeelError>;
