//! Workspace described by command-line flags.

use std::env;
use std::path::PathBuf;

use crate::ports::Workspace;

/// Environment variable pointing at a packages directory.
pub const PACKAGES_ENV: &str = "SHELLCMD_PACKAGES";

/// Workspace assembled from `--file`, `--folder` and `--project`.
///
/// With no folders given, the current directory stands in as the only open
/// folder.
#[derive(Debug, Clone, Default)]
pub struct TerminalWorkspace {
    active_file: Option<PathBuf>,
    folders: Vec<PathBuf>,
    project_file: Option<PathBuf>,
}

impl TerminalWorkspace {
    /// Builds a workspace from flag values.
    #[must_use]
    pub fn new(
        active_file: Option<PathBuf>,
        folders: Vec<PathBuf>,
        project_file: Option<PathBuf>,
    ) -> Self {
        Self { active_file, folders, project_file }
    }
}

impl Workspace for TerminalWorkspace {
    fn active_file_path(&self) -> Option<PathBuf> {
        self.active_file.clone()
    }

    fn workspace_folders(&self) -> Vec<PathBuf> {
        if self.folders.is_empty() {
            env::current_dir().into_iter().collect()
        } else {
            self.folders.clone()
        }
    }

    fn project_file_path(&self) -> Option<PathBuf> {
        self.project_file.clone()
    }

    fn packages_path(&self) -> Option<PathBuf> {
        env::var_os(PACKAGES_ENV).filter(|value| !value.is_empty()).map(PathBuf::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_folders_are_kept_in_order() {
        let workspace =
            TerminalWorkspace::new(None, vec![PathBuf::from("/b"), PathBuf::from("/a")], None);
        assert_eq!(workspace.workspace_folders(), vec![PathBuf::from("/b"), PathBuf::from("/a")]);
    }

    #[test]
    fn current_directory_stands_in_for_missing_folders() {
        let workspace = TerminalWorkspace::default();
        assert_eq!(workspace.workspace_folders(), vec![env::current_dir().unwrap()]);
    }
}
