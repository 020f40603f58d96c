//! The immutable description of one invocation.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// One or more fully substituted command lines plus their execution options.
///
/// Built with the consuming `with_*` methods and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSpec {
    commands: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    working_dir: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    stdin: Option<String>,
    #[serde(default)]
    shell: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    bootstrap_file: Option<PathBuf>,
}

impl CommandSpec {
    /// Creates a spec running `commands` in order.
    pub fn new<I, S>(commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
            working_dir: None,
            stdin: None,
            shell: false,
            bootstrap_file: None,
        }
    }

    /// Sets the directory the commands run in.
    #[must_use]
    pub fn with_working_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.working_dir = dir;
        self
    }

    /// Sets the payload written to each command's standard input.
    #[must_use]
    pub fn with_stdin(mut self, payload: Option<String>) -> Self {
        self.stdin = payload;
        self
    }

    /// Requests shell interpretation of the command lines.
    #[must_use]
    pub fn with_shell(mut self, shell: bool) -> Self {
        self.shell = shell;
        self
    }

    /// Sets a file sourced by the shell before each command.
    #[must_use]
    pub fn with_bootstrap_file(mut self, file: Option<PathBuf>) -> Self {
        self.bootstrap_file = file;
        self
    }

    /// The command lines, in execution order.
    #[must_use]
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    /// The working directory, if one was set.
    #[must_use]
    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }

    /// The standard-input payload, if any.
    #[must_use]
    pub fn stdin(&self) -> Option<&str> {
        self.stdin.as_deref()
    }

    /// The file sourced before each command in shell mode.
    #[must_use]
    pub fn bootstrap_file(&self) -> Option<&Path> {
        self.bootstrap_file.as_deref()
    }

    /// Whether the commands go through a shell. A bootstrap file implies one.
    #[must_use]
    pub fn uses_shell(&self) -> bool {
        self.shell || self.bootstrap_file.is_some()
    }

    /// The command lines joined for display and logging.
    #[must_use]
    pub fn display(&self) -> String {
        self.commands.join(" ; ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_file_forces_shell_mode() {
        let spec = CommandSpec::new(["ll"]);
        assert!(!spec.uses_shell());

        let spec = spec.with_bootstrap_file(Some(PathBuf::from("/home/me/.aliases")));
        assert!(spec.uses_shell());
    }

    #[test]
    fn optional_fields_are_omitted_from_json() {
        let spec = CommandSpec::new(["ls -la"]).with_working_dir(Some(PathBuf::from("/srv")));
        let json = serde_json::to_value(&spec).unwrap();

        assert_eq!(json, serde_json::json!({"commands": ["ls -la"], "working_dir": "/srv", "shell": false}));
    }
}
