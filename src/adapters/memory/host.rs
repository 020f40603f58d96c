//! In-memory presentation host.
//!
//! Keeps every surface as a plain string plus flags, answers prompts from a
//! scripted queue, and records dialogs and status updates so tests can
//! inspect exactly what the pipeline did to the editor.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::ports::{PresentationHost, PromptFuture, SurfaceId};

/// A copy of one surface's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SurfaceSnapshot {
    /// Title (or panel name).
    pub title: String,
    /// Current content.
    pub text: String,
    /// Whether the surface is read-only.
    pub read_only: bool,
    /// Whether the surface is a scratch buffer.
    pub scratch: bool,
    /// Whether the surface is an output panel.
    pub panel: bool,
    /// Syntax name applied to it, if any.
    pub syntax: Option<String>,
    /// Whether the last write scrolled it to the end.
    pub scrolled_to_end: bool,
    /// Writes that were dropped because the surface was read-only.
    pub rejected_writes: usize,
    /// How many times the content was cleared.
    pub clears: usize,
}

#[derive(Debug, Default)]
struct Surface {
    snapshot: SurfaceSnapshot,
    selection: (usize, usize),
    metadata: HashMap<String, serde_json::Value>,
    status: HashMap<String, Vec<String>>,
}

#[derive(Debug, Default)]
struct State {
    surfaces: Vec<Surface>,
    panels: HashMap<String, SurfaceId>,
    answers: VecDeque<Option<String>>,
    prompts: Vec<(String, String)>,
    errors: Vec<String>,
    messages: Vec<String>,
}

impl State {
    fn surface(&mut self, id: SurfaceId) -> &mut Surface {
        let index = usize::try_from(id.0).expect("surface id fits in usize");
        self.surfaces.get_mut(index).unwrap_or_else(|| panic!("unknown {id}"))
    }

    fn create(&mut self, title: &str, panel: bool) -> SurfaceId {
        let id = SurfaceId(self.surfaces.len() as u64);
        self.surfaces.push(Surface {
            snapshot: SurfaceSnapshot { title: title.to_string(), panel, ..SurfaceSnapshot::default() },
            ..Surface::default()
        });
        id
    }
}

/// Headless [`PresentationHost`] backed by in-memory buffers.
#[derive(Debug, Default)]
pub struct MemoryHost {
    state: Mutex<State>,
}

impl MemoryHost {
    /// Creates an empty host with no scripted prompt answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues answers for upcoming prompts; `None` cancels that prompt.
    ///
    /// Prompts beyond the queued answers are cancelled.
    pub fn push_answers<I>(&self, answers: I)
    where
        I: IntoIterator<Item = Option<String>>,
    {
        self.lock().answers.extend(answers);
    }

    /// Replaces the content of a surface, ignoring its read-only flag.
    pub fn set_text(&self, surface: SurfaceId, text: &str) {
        let mut state = self.lock();
        let entry = state.surface(surface);
        entry.snapshot.text = text.to_string();
        let len = text.chars().count();
        entry.selection = (len, len);
    }

    /// Selects the character range `start..end` of a surface.
    pub fn select(&self, surface: SurfaceId, start: usize, end: usize) {
        self.lock().surface(surface).selection = (start.min(end), start.max(end));
    }

    /// A copy of the surface's current state.
    #[must_use]
    pub fn snapshot(&self, surface: SurfaceId) -> SurfaceSnapshot {
        self.lock().surface(surface).snapshot.clone()
    }

    /// Number of surfaces created so far, panels included.
    #[must_use]
    pub fn surface_count(&self) -> usize {
        self.lock().surfaces.len()
    }

    /// The current text of a status slot, `None` when empty.
    #[must_use]
    pub fn status(&self, surface: SurfaceId, tag: &str) -> Option<String> {
        self.lock()
            .surface(surface)
            .status
            .get(tag)
            .and_then(|history| history.last())
            .filter(|text| !text.is_empty())
            .cloned()
    }

    /// Every value written to a status slot, in order, clears included.
    #[must_use]
    pub fn status_history(&self, surface: SurfaceId, tag: &str) -> Vec<String> {
        self.lock().surface(surface).status.get(tag).cloned().unwrap_or_default()
    }

    /// Prompts shown so far, as `(message, default)` pairs.
    #[must_use]
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.lock().prompts.clone()
    }

    /// Error dialogs shown so far.
    #[must_use]
    pub fn errors(&self) -> Vec<String> {
        self.lock().errors.clone()
    }

    /// Status-bar messages shown so far.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().messages.clone()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn byte_index(text: &str, chars: usize) -> usize {
    text.char_indices().nth(chars).map_or(text.len(), |(index, _)| index)
}

fn word_around(text: &str, cursor: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    let cursor = cursor.min(chars.len());
    let is_word = |c: &char| !c.is_whitespace() && !"():".contains(*c);
    let start = chars[..cursor].iter().rposition(|c| !is_word(c)).map_or(0, |i| i + 1);
    let end = chars[cursor..].iter().position(|c| !is_word(c)).map_or(chars.len(), |i| cursor + i);
    chars[start..end].iter().collect()
}

impl PresentationHost for MemoryHost {
    fn new_surface(&self, title: &str) -> SurfaceId {
        self.lock().create(title, false)
    }

    fn panel(&self, name: &str) -> SurfaceId {
        let mut state = self.lock();
        if let Some(id) = state.panels.get(name) {
            return *id;
        }
        let id = state.create(name, true);
        state.panels.insert(name.to_string(), id);
        id
    }

    fn insert(&self, surface: SurfaceId, pos: usize, text: &str) {
        let mut state = self.lock();
        let entry = state.surface(surface);
        if entry.snapshot.read_only {
            entry.snapshot.rejected_writes += 1;
            return;
        }
        let index = byte_index(&entry.snapshot.text, pos);
        entry.snapshot.text.insert_str(index, text);
        entry.snapshot.scrolled_to_end = false;
    }

    fn replace_selection(&self, surface: SurfaceId, text: &str) {
        let mut state = self.lock();
        let entry = state.surface(surface);
        if entry.snapshot.read_only {
            entry.snapshot.rejected_writes += 1;
            return;
        }
        let (start, end) = entry.selection;
        let from = byte_index(&entry.snapshot.text, start);
        let to = byte_index(&entry.snapshot.text, end);
        entry.snapshot.text.replace_range(from..to, text);
        let cursor = start + text.chars().count();
        entry.selection = (cursor, cursor);
    }

    fn size(&self, surface: SurfaceId) -> usize {
        self.lock().surface(surface).snapshot.text.chars().count()
    }

    fn clear(&self, surface: SurfaceId) {
        let mut state = self.lock();
        let entry = state.surface(surface);
        if entry.snapshot.read_only {
            entry.snapshot.rejected_writes += 1;
            return;
        }
        entry.snapshot.text.clear();
        entry.snapshot.clears += 1;
        entry.selection = (0, 0);
    }

    fn set_read_only(&self, surface: SurfaceId, read_only: bool) {
        self.lock().surface(surface).snapshot.read_only = read_only;
    }

    fn is_read_only(&self, surface: SurfaceId) -> bool {
        self.lock().surface(surface).snapshot.read_only
    }

    fn set_scratch(&self, surface: SurfaceId, scratch: bool) {
        self.lock().surface(surface).snapshot.scratch = scratch;
    }

    fn set_syntax(&self, surface: SurfaceId, syntax: &str) {
        self.lock().surface(surface).snapshot.syntax = Some(syntax.to_string());
    }

    fn set_metadata(&self, surface: SurfaceId, key: &str, value: serde_json::Value) {
        self.lock().surface(surface).metadata.insert(key.to_string(), value);
    }

    fn metadata(&self, surface: SurfaceId, key: &str) -> Option<serde_json::Value> {
        self.lock().surface(surface).metadata.get(key).cloned()
    }

    fn show_end(&self, surface: SurfaceId) {
        self.lock().surface(surface).snapshot.scrolled_to_end = true;
    }

    fn selection_text(&self, surface: SurfaceId) -> Vec<String> {
        let mut state = self.lock();
        let entry = state.surface(surface);
        let (start, end) = entry.selection;
        if start == end {
            return vec![word_around(&entry.snapshot.text, start)];
        }
        vec![entry.snapshot.text.chars().skip(start).take(end - start).collect()]
    }

    fn set_status(&self, surface: SurfaceId, tag: &str, text: &str) {
        self.lock()
            .surface(surface)
            .status
            .entry(tag.to_string())
            .or_default()
            .push(text.to_string());
    }

    fn prompt_input<'a>(&'a self, message: &'a str, default: &'a str) -> PromptFuture<'a> {
        let answer = {
            let mut state = self.lock();
            state.prompts.push((message.to_string(), default.to_string()));
            state.answers.pop_front().flatten()
        };
        Box::pin(std::future::ready(answer))
    }

    fn error_message(&self, text: &str) {
        self.lock().errors.push(text.to_string());
    }

    fn status_message(&self, text: &str) {
        self.lock().messages.push(text.to_string());
    }
}
