//! Presentation host port: the editor-side display primitives.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

/// Boxed future returned by [`PresentationHost::prompt_input`].
///
/// Resolves to `Some(answer)` when the user confirms and `None` when the
/// prompt is cancelled.
pub type PromptFuture<'a> = Pin<Box<dyn Future<Output = Option<String>> + Send + 'a>>;

/// Opaque handle to a display surface (a buffer or an output panel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(pub u64);

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface#{}", self.0)
    }
}

/// Display primitives exposed by the editor.
///
/// Every method is called from the cooperative loop only; implementations
/// never see calls from the process worker threads.
pub trait PresentationHost: Send + Sync {
    /// Creates a new buffer with the given title and returns its handle.
    fn new_surface(&self, title: &str) -> SurfaceId;

    /// Returns the named output panel, creating it if needed, and shows it.
    fn panel(&self, name: &str) -> SurfaceId;

    /// Inserts `text` at character offset `pos`.
    fn insert(&self, surface: SurfaceId, pos: usize, text: &str);

    /// Replaces the current selection with `text`, or inserts at the cursor
    /// when the selection is empty.
    fn replace_selection(&self, surface: SurfaceId, text: &str);

    /// Returns the content length of the surface in characters.
    fn size(&self, surface: SurfaceId) -> usize;

    /// Erases the entire content of the surface.
    fn clear(&self, surface: SurfaceId);

    /// Marks the surface read-only (or writable).
    fn set_read_only(&self, surface: SurfaceId, read_only: bool);

    /// Returns whether the surface is currently read-only.
    fn is_read_only(&self, surface: SurfaceId) -> bool;

    /// Marks the surface as scratch (never prompts to save).
    fn set_scratch(&self, surface: SurfaceId, scratch: bool);

    /// Applies a syntax by name. Resolution of the name is the host's concern.
    fn set_syntax(&self, surface: SurfaceId, syntax: &str);

    /// Stores a metadata value on the surface.
    fn set_metadata(&self, surface: SurfaceId, key: &str, value: serde_json::Value);

    /// Reads a metadata value from the surface.
    fn metadata(&self, surface: SurfaceId, key: &str) -> Option<serde_json::Value>;

    /// Scrolls the surface so its end is visible.
    fn show_end(&self, surface: SurfaceId);

    /// Returns the selected text of the surface, one entry per selection
    /// region, with empty regions expanded to the word under the cursor.
    fn selection_text(&self, surface: SurfaceId) -> Vec<String>;

    /// Writes `text` into the status slot `tag` of the surface. An empty
    /// string clears the slot.
    fn set_status(&self, surface: SurfaceId, tag: &str, text: &str);

    /// Asks the user for a line of input, pre-filled with `default`.
    fn prompt_input<'a>(&'a self, message: &'a str, default: &'a str) -> PromptFuture<'a>;

    /// Shows a modal error dialog.
    fn error_message(&self, text: &str);

    /// Shows a transient message in the editor's status bar.
    fn status_message(&self, text: &str);
}
