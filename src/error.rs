//! Error types for the runner and the orchestrator.

use std::io;

/// Errors raised while launching or reading a command.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// The executable could not be found on `PATH`.
    #[error("Command not found\n\nCommand is: {command}")]
    CommandNotFound {
        /// The command text that was attempted.
        command: String,
    },

    /// The command line could not be split into words (e.g. an unclosed quote).
    #[error("Cannot parse command `{command}`: {source}")]
    Tokenize {
        /// The command text that failed to split.
        command: String,
        /// The underlying parse error.
        #[source]
        source: shell_words::ParseError,
    },

    /// Any other OS-level failure while launching or talking to the process.
    #[error("Failed to launch `{command}`: {source}")]
    Launch {
        /// The command text being launched.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The worker thread went away without delivering an end-of-stream marker.
    #[error("Command worker stopped before reporting completion")]
    WorkerLost,
}

impl RunError {
    /// Returns `true` for errors the user should see as a dialog rather than
    /// as a fatal failure.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        matches!(self, Self::CommandNotFound { .. } | Self::Tokenize { .. })
    }
}

/// Errors raised by the command orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    /// No command text remained after prompting and templating.
    #[error("No command provided.")]
    EmptyCommand,

    /// The command needs a selection argument and none was available.
    #[error("This command requires a parameter.")]
    MissingArgument,

    /// The user cancelled one of the prompts.
    #[error("Prompt cancelled")]
    PromptCancelled,

    /// The runner failed.
    #[error(transparent)]
    Run(#[from] RunError),

    /// Replay metadata on a surface could not be decoded.
    #[error("Invalid replay data on surface: {0}")]
    Metadata(#[from] serde_json::Error),

    /// `refresh` was invoked on a surface that carries no replay record.
    #[error("Surface has no command to refresh")]
    NotRefreshable,

    /// Settings could not be loaded.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The run task panicked or was aborted.
    #[error("Command task failed: {0}")]
    Task(String),
}

impl CommandError {
    /// Returns `true` when the user has already been told about this error
    /// through the host, or chose to cancel.
    #[must_use]
    pub fn is_reported(&self) -> bool {
        match self {
            Self::EmptyCommand | Self::MissingArgument | Self::PromptCancelled => true,
            Self::Run(err) => err.is_user_facing(),
            _ => false,
        }
    }
}

/// Errors raised while loading settings.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        /// Path of the settings file.
        path: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The settings file is not valid YAML for [`crate::config::Settings`].
    #[error("Failed to parse settings file {path}: {source}")]
    Parse {
        /// Path of the settings file.
        path: String,
        /// The underlying YAML error.
        #[source]
        source: serde_yaml::Error,
    },

    /// An environment override held a value of the wrong type.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidOverride {
        /// Environment variable name.
        key: String,
        /// The offending value.
        value: String,
    },
}
