//! Names shared between the bootstrap, the dispatcher and providers.

/// Binary name shown in help and messages.
pub const APP_NAME: &str = "keel";

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// First argument that switches a run into completion mode.
pub const COMPLETION_SENTINEL: &str = "completion";

/// Suffix appended to a command name to form its service name.
pub const COMMAND_SUFFIX: &str = "Command";

/// Well-known service names registered by the bootstrap.
pub mod services {
    /// [`crate::config::Config`]
    pub const CONFIG: &str = "config";
    /// [`crate::reporter::ErrorReporter`]
    pub const ERRORS: &str = "errors";
    /// [`crate::messages::MessagesService`]
    pub const MESSAGES: &str = "messagesService";
    /// [`crate::output::Output`]
    pub const OUTPUT: &str = "output";
    /// [`crate::commands::ProcessArgs`]
    pub const PROCESS_ARGS: &str = "processArgs";
    /// [`crate::commands::CommandDispatcher`]
    pub const COMMAND_DISPATCHER: &str = "commandDispatcher";
    /// [`crate::providers::DynamicHelpProvider`]
    pub const DYNAMIC_HELP_PROVIDER: &str = "dynamicHelpProvider";
}
