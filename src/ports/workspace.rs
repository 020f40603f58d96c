//! Workspace context port.

use std::path::PathBuf;

/// Read-only view of the editor's current workspace.
///
/// Queried fresh on every invocation; implementations must not cache
/// answers across calls.
pub trait Workspace: Send + Sync {
    /// Path of the file shown in the active view, if it is saved on disk.
    fn active_file_path(&self) -> Option<PathBuf>;

    /// Folders open in the current window, in window order.
    fn workspace_folders(&self) -> Vec<PathBuf>;

    /// Path of the project file of the current window, if any.
    fn project_file_path(&self) -> Option<PathBuf>;

    /// Directory where the editor keeps its packages.
    fn packages_path(&self) -> Option<PathBuf>;
}
