//! Choosing the directory a command runs in.

use std::path::{Path, PathBuf};

use crate::ports::Workspace;

/// Picks the working directory for a run.
///
/// An explicit override, the origin's replay record and the configured
/// setting win in that order. Otherwise the candidates are the project
/// file's directory and the open folders: with an active file, the deepest
/// candidate containing the file's directory wins, falling back to the
/// file's directory itself; without one, the first candidate wins.
#[must_use]
pub fn resolve_working_dir(
    explicit: Option<&Path>,
    replay: Option<&Path>,
    configured: Option<&Path>,
    workspace: &dyn Workspace,
) -> Option<PathBuf> {
    if let Some(dir) = explicit.or(replay).or(configured) {
        return Some(dir.to_path_buf());
    }

    let mut candidates: Vec<PathBuf> = Vec::new();
    if let Some(dir) = workspace.project_file_path().as_deref().map(absolute).and_then(parent) {
        candidates.push(dir);
    }
    candidates.extend(workspace.workspace_folders().iter().map(|folder| absolute(folder)));

    let Some(file_dir) = workspace.active_file_path().as_deref().map(absolute).and_then(parent)
    else {
        return candidates.into_iter().next();
    };

    candidates
        .into_iter()
        .filter(|candidate| file_dir.starts_with(candidate))
        .max_by_key(|candidate| candidate.components().count())
        .or(Some(file_dir))
}

fn absolute(path: &Path) -> PathBuf {
    std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf())
}

fn parent(path: PathBuf) -> Option<PathBuf> {
    path.parent().map(Path::to_path_buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::StaticWorkspace;
    use pretty_assertions::assert_eq;

    #[test]
    fn first_folder_without_active_file() {
        let workspace = StaticWorkspace::empty().with_folder("/proj");
        assert_eq!(resolve_working_dir(None, None, None, &workspace), Some(PathBuf::from("/proj")));
    }

    #[test]
    fn nothing_known_means_no_directory() {
        assert_eq!(resolve_working_dir(None, None, None, &StaticWorkspace::empty()), None);
    }

    #[test]
    fn explicit_override_beats_everything() {
        let workspace = StaticWorkspace::empty().with_folder("/proj").with_active_file("/proj/a.rs");
        let dir = resolve_working_dir(
            Some(Path::new("/override")),
            Some(Path::new("/replayed")),
            Some(Path::new("/configured")),
            &workspace,
        );
        assert_eq!(dir, Some(PathBuf::from("/override")));
    }

    #[test]
    fn replay_record_beats_configured_setting() {
        let dir = resolve_working_dir(
            None,
            Some(Path::new("/replayed")),
            Some(Path::new("/configured")),
            &StaticWorkspace::empty(),
        );
        assert_eq!(dir, Some(PathBuf::from("/replayed")));
    }

    #[test]
    fn deepest_ancestor_folder_of_active_file_wins() {
        let workspace = StaticWorkspace::empty()
            .with_folder("/other")
            .with_folder("/work")
            .with_folder("/work/app")
            .with_active_file("/work/app/src/main.rs");

        assert_eq!(
            resolve_working_dir(None, None, None, &workspace),
            Some(PathBuf::from("/work/app"))
        );
    }

    #[test]
    fn ancestor_match_is_per_component() {
        let workspace = StaticWorkspace::empty()
            .with_folder("/work/app")
            .with_active_file("/work/application/main.rs");

        assert_eq!(
            resolve_working_dir(None, None, None, &workspace),
            Some(PathBuf::from("/work/application"))
        );
    }

    #[test]
    fn project_directory_is_a_candidate() {
        let workspace = StaticWorkspace::empty()
            .with_project_file("/work/site/site.sublime-project")
            .with_folder("/elsewhere");

        assert_eq!(
            resolve_working_dir(None, None, None, &workspace),
            Some(PathBuf::from("/work/site"))
        );
    }
}
