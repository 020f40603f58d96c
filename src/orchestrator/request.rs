//! What a caller asks the orchestrator to run.

use std::path::PathBuf;

use crate::output::Destination;

/// Where the selection of the originating surface goes, if anywhere.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RegionSource {
    /// The selection is ignored.
    #[default]
    None,
    /// The selection is appended to each command as an argument.
    Arg,
    /// The selection is written to each command's standard input.
    Stdin,
}

/// A user-invoked run: command template(s) plus presentation options.
#[derive(Debug, Clone)]
pub struct CommandRequest {
    /// Command templates; blank means "prompt for a command".
    pub commands: Vec<String>,
    /// Message for the command prompt; the configured default when `None`.
    pub prompt: Option<String>,
    /// How the selection is passed to the command.
    pub region: RegionSource,
    /// Refuse to run when the selection is blank.
    pub arg_required: bool,
    /// Where output goes.
    pub destination: Destination,
    /// Title for a new output buffer.
    pub title: Option<String>,
    /// Syntax name for the output surface.
    pub syntax: Option<String>,
    /// Refresh the originating surface once the run completes. Skipped when
    /// the run failed to launch or the origin carries no replay record.
    pub refresh: bool,
    /// Wait for the run to finish before returning.
    pub wait_for_completion: bool,
    /// Working directory override.
    pub root_dir: Option<PathBuf>,
    /// Run through the shell instead of splitting into argv.
    pub shell: bool,
    /// Text prepended (with a space) to every command.
    pub command_prefix: Option<String>,
    /// Keep the end of the output surface visible while appending.
    pub scroll_to_end: bool,
}

impl CommandRequest {
    /// A request running a single command template.
    pub fn new(command: impl Into<String>) -> Self {
        Self::batch([command])
    }

    /// A request running several command templates in order.
    pub fn batch<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            prompt: None,
            region: RegionSource::None,
            arg_required: false,
            destination: Destination::NewBuffer,
            title: None,
            syntax: None,
            refresh: false,
            wait_for_completion: false,
            root_dir: None,
            shell: false,
            command_prefix: None,
            scroll_to_end: true,
        }
    }

    /// Sets the output destination.
    #[must_use]
    pub fn destination(mut self, destination: Destination) -> Self {
        self.destination = destination;
        self
    }

    /// Sets how the selection is passed along.
    #[must_use]
    pub fn region(mut self, region: RegionSource, required: bool) -> Self {
        self.region = region;
        self.arg_required = required;
        self
    }

    /// Waits for completion before returning.
    #[must_use]
    pub fn wait(mut self) -> Self {
        self.wait_for_completion = true;
        self
    }

    /// Runs through the shell.
    #[must_use]
    pub fn shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Overrides the working directory.
    #[must_use]
    pub fn root_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.root_dir = dir;
        self
    }

    /// Sets the title of a new output buffer.
    #[must_use]
    pub fn title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    /// Sets the syntax name of the output surface.
    #[must_use]
    pub fn syntax(mut self, syntax: Option<String>) -> Self {
        self.syntax = syntax;
        self
    }

    /// Refreshes the originating surface after a successful completion.
    #[must_use]
    pub fn refresh(mut self, refresh: bool) -> Self {
        self.refresh = refresh;
        self
    }

    /// Sets the prompt shown when no command text is given.
    #[must_use]
    pub fn prompt(mut self, prompt: Option<String>) -> Self {
        self.prompt = prompt;
        self
    }

    /// Prepends `prefix` to every command.
    #[must_use]
    pub fn command_prefix(mut self, prefix: Option<String>) -> Self {
        self.command_prefix = prefix;
        self
    }

    /// Whether every command template is blank.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.commands.iter().all(|command| command.trim().is_empty())
    }
}
