//! Plugin settings.
//!
//! Settings are read once, from an optional YAML file plus `SHELLCMD_*`
//! environment overrides (a `.env` file in the current directory is honoured),
//! and then handed to the orchestrator at construction.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Environment variable naming a settings file to load.
pub const CONFIG_ENV: &str = "SHELLCMD_CONFIG";

const ENV_PREFIX: &str = "SHELLCMD_";

/// Read-only settings consumed by the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Progress indicator heartbeat in milliseconds.
    pub progress_display_heartbeat: u64,
    /// Whether a command with no output still writes a message.
    pub show_success_but_no_output_message: bool,
    /// The message written when a command produced no output.
    pub success_but_no_output_message: String,
    /// Shell file sourced before every command; forces shell mode when set.
    pub shell_configuration_file: Option<PathBuf>,
    /// Working directory used when no override or replay record applies.
    pub working_dir: Option<PathBuf>,
    /// Prompt shown when a command is invoked without command text.
    pub default_prompt: String,
    /// Title given to new output buffers.
    pub default_title: String,
    /// Name of the shared output panel.
    pub panel_name: String,
    /// Metadata key marking output surfaces and prefixing their replay data.
    pub data_key: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            progress_display_heartbeat: 100,
            show_success_but_no_output_message: true,
            success_but_no_output_message: "Shell command succeeded with no output".into(),
            shell_configuration_file: None,
            working_dir: None,
            default_prompt: "Shell Command".into(),
            default_title: "*Shell Command Output*".into(),
            panel_name: "ShellCommand".into(),
            data_key: "ShellCommand".into(),
        }
    }
}

impl Settings {
    /// Loads settings from `path` (or `$SHELLCMD_CONFIG`), then applies
    /// `SHELLCMD_*` environment overrides.
    ///
    /// A missing `path` with no `$SHELLCMD_CONFIG` yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or an
    /// override holds a malformed value.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        // Missing .env is the common case.
        let _ = dotenvy::dotenv();

        let from_env = env::var_os(CONFIG_ENV).map(PathBuf::from);
        let mut settings = match path.map(Path::to_path_buf).or(from_env) {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };
        settings.apply_overrides(env::vars())?;
        Ok(settings)
    }

    /// Parses a YAML settings file. Missing keys take their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.display().to_string(), source })?;
        serde_yaml::from_str(&content)
            .map_err(|source| ConfigError::Parse { path: path.display().to_string(), source })
    }

    /// Applies `SHELLCMD_<KEY>` overrides from the given variables.
    ///
    /// Unknown `SHELLCMD_*` variables are ignored.
    ///
    /// # Errors
    ///
    /// Returns an error if a numeric or boolean override cannot be parsed.
    pub fn apply_overrides<I>(&mut self, vars: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "PROGRESS_DISPLAY_HEARTBEAT" => {
                    self.progress_display_heartbeat = value
                        .parse()
                        .map_err(|_| ConfigError::InvalidOverride { key: key.clone(), value })?;
                }
                "SHOW_SUCCESS_BUT_NO_OUTPUT_MESSAGE" => {
                    self.show_success_but_no_output_message = parse_bool(&value)
                        .ok_or_else(|| ConfigError::InvalidOverride { key: key.clone(), value })?;
                }
                "SUCCESS_BUT_NO_OUTPUT_MESSAGE" => self.success_but_no_output_message = value,
                "SHELL_CONFIGURATION_FILE" => {
                    self.shell_configuration_file =
                        (!value.is_empty()).then(|| PathBuf::from(value));
                }
                "WORKING_DIR" => self.working_dir = (!value.is_empty()).then(|| PathBuf::from(value)),
                _ => {}
            }
        }
        Ok(())
    }

    /// The heartbeat as a [`Duration`], never shorter than one millisecond.
    #[must_use]
    pub fn heartbeat(&self) -> Duration {
        Duration::from_millis(self.progress_display_heartbeat.max(1))
    }

    /// Metadata key holding the replay record of an output surface.
    #[must_use]
    pub fn replay_key(&self) -> String {
        format!("{}_data", self.data_key)
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect()
    }

    #[test]
    fn defaults_match_plugin_behaviour() {
        let settings = Settings::default();
        assert_eq!(settings.heartbeat(), Duration::from_millis(100));
        assert!(settings.show_success_but_no_output_message);
        assert_eq!(settings.success_but_no_output_message, "Shell command succeeded with no output");
        assert_eq!(settings.replay_key(), "ShellCommand_data");
    }

    #[test]
    fn partial_yaml_keeps_defaults_for_missing_keys() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(
            &path,
            "progress_display_heartbeat: 250\nshell_configuration_file: /home/me/.bashrc\n",
        )
        .unwrap();

        let settings = Settings::from_file(&path).unwrap();
        assert_eq!(settings.progress_display_heartbeat, 250);
        assert_eq!(settings.shell_configuration_file, Some(PathBuf::from("/home/me/.bashrc")));
        assert_eq!(settings.default_title, "*Shell Command Output*");
    }

    #[test]
    fn malformed_yaml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yaml");
        std::fs::write(&path, "progress_display_heartbeat: [not, a, number]\n").unwrap();

        assert!(matches!(Settings::from_file(&path), Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_apply() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(vars(&[
                ("SHELLCMD_PROGRESS_DISPLAY_HEARTBEAT", "40"),
                ("SHELLCMD_SHOW_SUCCESS_BUT_NO_OUTPUT_MESSAGE", "off"),
                ("SHELLCMD_SUCCESS_BUT_NO_OUTPUT_MESSAGE", "done"),
                ("SHELLCMD_WORKING_DIR", "/srv"),
                ("PATH", "/usr/bin"),
            ]))
            .unwrap();

        assert_eq!(settings.progress_display_heartbeat, 40);
        assert!(!settings.show_success_but_no_output_message);
        assert_eq!(settings.success_but_no_output_message, "done");
        assert_eq!(settings.working_dir, Some(PathBuf::from("/srv")));
    }

    #[test]
    fn bad_override_is_rejected() {
        let mut settings = Settings::default();
        let result =
            settings.apply_overrides(vars(&[("SHELLCMD_PROGRESS_DISPLAY_HEARTBEAT", "fast")]));
        assert!(matches!(result, Err(ConfigError::InvalidOverride { .. })));
    }

    #[test]
    fn zero_heartbeat_is_clamped() {
        let settings = Settings { progress_display_heartbeat: 0, ..Settings::default() };
        assert_eq!(settings.heartbeat(), Duration::from_millis(1));
    }
}
