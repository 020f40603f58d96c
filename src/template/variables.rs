//! Variables available to templates, derived from the workspace.

use std::collections::BTreeMap;
use std::path::Path;

use crate::ports::Workspace;

/// Well-known variable names, in the order `shellcmd vars` lists them.
pub const NAMES: &[&str] = &[
    "file",
    "file_path",
    "file_name",
    "file_extension",
    "file_base_name",
    "packages",
    "project",
    "project_path",
    "project_name",
    "project_extension",
    "project_base_name",
    "project_folders",
];

/// Name → value table, rebuilt for every invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableTable {
    values: BTreeMap<String, String>,
}

impl VariableTable {
    /// Computes the table from the current workspace.
    #[must_use]
    pub fn from_workspace(workspace: &dyn Workspace) -> Self {
        let mut table = Self::default();
        table.insert_path("file", workspace.active_file_path().as_deref());
        table.insert_path("project", workspace.project_file_path().as_deref());
        table.values.insert(
            "packages".into(),
            workspace.packages_path().map(|p| p.display().to_string()).unwrap_or_default(),
        );
        let folders: Vec<String> =
            workspace.workspace_folders().iter().map(|f| f.display().to_string()).collect();
        table.values.insert("project_folders".into(), folders.join(" "));
        table
    }

    /// Looks up a variable. Empty values count as undefined.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str).filter(|value| !value.is_empty())
    }

    /// Sets a variable, replacing any previous value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    /// Iterates over `(name, value)` pairs, empty values included.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Adds `<prefix>`, `<prefix>_path`, `_name`, `_extension` and `_base_name`.
    fn insert_path(&mut self, prefix: &str, path: Option<&Path>) {
        let parts = PathParts::of(path);
        self.values.insert(prefix.to_string(), parts.full);
        self.values.insert(format!("{prefix}_path"), parts.dir);
        self.values.insert(format!("{prefix}_name"), parts.name);
        self.values.insert(format!("{prefix}_extension"), parts.extension);
        self.values.insert(format!("{prefix}_base_name"), parts.base_name);
    }
}

/// `/a/b/Chapter1.txt` → dir `/a/b`, name `Chapter1.txt`, extension `.txt`,
/// base name `Chapter1`.
#[derive(Debug, Default, PartialEq, Eq)]
struct PathParts {
    full: String,
    dir: String,
    name: String,
    extension: String,
    base_name: String,
}

impl PathParts {
    fn of(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };
        let lossy = |p: Option<&std::ffi::OsStr>| {
            p.map(|s| s.to_string_lossy().into_owned()).unwrap_or_default()
        };
        Self {
            full: path.display().to_string(),
            dir: path.parent().map(|p| p.display().to_string()).unwrap_or_default(),
            name: lossy(path.file_name()),
            extension: path
                .extension()
                .map(|ext| format!(".{}", ext.to_string_lossy()))
                .unwrap_or_default(),
            base_name: lossy(path.file_stem()),
        }
    }
}
