//! Fixed workspace context.

use std::path::PathBuf;

use crate::ports::Workspace;

/// A [`Workspace`] whose answers are set up front.
#[derive(Debug, Clone, Default)]
pub struct StaticWorkspace {
    /// The active file, if any.
    pub active_file: Option<PathBuf>,
    /// Open folders, in window order.
    pub folders: Vec<PathBuf>,
    /// The project file, if any.
    pub project_file: Option<PathBuf>,
    /// The packages directory, if any.
    pub packages: Option<PathBuf>,
}

impl StaticWorkspace {
    /// A workspace with nothing open.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Sets the active file.
    #[must_use]
    pub fn with_active_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.active_file = Some(path.into());
        self
    }

    /// Adds an open folder.
    #[must_use]
    pub fn with_folder(mut self, path: impl Into<PathBuf>) -> Self {
        self.folders.push(path.into());
        self
    }

    /// Sets the project file.
    #[must_use]
    pub fn with_project_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.project_file = Some(path.into());
        self
    }
}

impl Workspace for StaticWorkspace {
    fn active_file_path(&self) -> Option<PathBuf> {
        self.active_file.clone()
    }

    fn workspace_folders(&self) -> Vec<PathBuf> {
        self.folders.clone()
    }

    fn project_file_path(&self) -> Option<PathBuf> {
        self.project_file.clone()
    }

    fn packages_path(&self) -> Option<PathBuf> {
        self.packages.clone()
    }
}
