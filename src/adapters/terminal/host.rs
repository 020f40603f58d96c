//! Presentation host backed by the process's own terminal.
//!
//! Output surfaces are echoed to stdout as text is inserted; the terminal
//! cannot take text back, so `clear` only resets the tracked content.
//! Status slots render on stderr when it is a terminal. Prompts read a line
//! from stdin.

use std::collections::HashMap;
use std::io::{self, BufRead, IsTerminal, Write};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::ports::{PresentationHost, PromptFuture, SurfaceId};

#[derive(Debug, Default)]
struct Surface {
    title: String,
    text: String,
    selection: Option<String>,
    read_only: bool,
    echo: bool,
    metadata: HashMap<String, serde_json::Value>,
}

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    surfaces: HashMap<SurfaceId, Surface>,
    panels: HashMap<String, SurfaceId>,
    status_shown: bool,
}

impl State {
    fn create(&mut self, title: &str, echo: bool) -> SurfaceId {
        let id = SurfaceId(self.next_id);
        self.next_id += 1;
        self.surfaces.insert(id, Surface { title: title.to_string(), echo, ..Surface::default() });
        id
    }
}

/// Live host writing output surfaces to stdout.
#[derive(Debug)]
pub struct TerminalHost {
    state: Mutex<State>,
    status_on_stderr: bool,
}

impl TerminalHost {
    /// Creates a host; status animation is enabled only on an interactive stderr.
    #[must_use]
    pub fn new() -> Self {
        Self { state: Mutex::new(State::default()), status_on_stderr: io::stderr().is_terminal() }
    }

    /// Registers the surface commands are invoked from.
    ///
    /// `selection` is what the command sees as the selected text. The
    /// origin's own content is never echoed.
    pub fn origin(&self, title: &str, selection: Option<String>) -> SurfaceId {
        let mut state = self.lock();
        let id = state.create(title, false);
        if let Some(surface) = state.surfaces.get_mut(&id) {
            surface.selection = selection;
        }
        id
    }

    /// Text written to `surface` so far.
    #[must_use]
    pub fn text(&self, surface: SurfaceId) -> String {
        self.lock().surfaces.get(&surface).map(|s| s.text.clone()).unwrap_or_default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn with_surface<R>(&self, surface: SurfaceId, f: impl FnOnce(&mut Surface) -> R) -> Option<R> {
        self.lock().surfaces.get_mut(&surface).map(f)
    }

    fn echo(&self, text: &str) {
        self.clear_status_line();
        let mut stdout = io::stdout().lock();
        // A closed stdout (e.g. `| head`) is not worth failing the run over.
        let _ = stdout.write_all(text.as_bytes()).and_then(|()| stdout.flush());
    }

    fn clear_status_line(&self) {
        let mut state = self.lock();
        if state.status_shown {
            state.status_shown = false;
            eprint!("\r\x1b[K");
        }
    }
}

impl Default for TerminalHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PresentationHost for TerminalHost {
    fn new_surface(&self, title: &str) -> SurfaceId {
        let id = self.lock().create(title, true);
        debug!(%id, title, "opened terminal surface");
        id
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

    fn insert(&self, surface: SurfaceId, _pos: usize, text: &str) {
        let echo = self.with_surface(surface, |s| {
            if s.read_only {
                return false;
            }
            s.text.push_str(text);
            s.echo
        });
        if echo == Some(true) {
            self.echo(text);
        }
    }

    fn replace_selection(&self, surface: SurfaceId, text: &str) {
        let written = self.with_surface(surface, |s| {
            if s.read_only {
                return false;
            }
            s.selection = None;
            s.text.push_str(text);
            true
        });
        if written == Some(true) {
            self.echo(text);
        }
    }

    fn size(&self, surface: SurfaceId) -> usize {
        self.with_surface(surface, |s| s.text.chars().count()).unwrap_or(0)
    }

    fn clear(&self, surface: SurfaceId) {
        self.with_surface(surface, |s| {
            if !s.read_only {
                s.text.clear();
            }
        });
    }

    fn set_read_only(&self, surface: SurfaceId, read_only: bool) {
        self.with_surface(surface, |s| s.read_only = read_only);
    }

    fn is_read_only(&self, surface: SurfaceId) -> bool {
        self.with_surface(surface, |s| s.read_only).unwrap_or(false)
    }

    fn set_scratch(&self, _surface: SurfaceId, _scratch: bool) {}

    fn set_syntax(&self, surface: SurfaceId, syntax: &str) {
        debug!(%surface, syntax, "syntax highlighting is not available in a terminal");
    }

    fn set_metadata(&self, surface: SurfaceId, key: &str, value: serde_json::Value) {
        self.with_surface(surface, |s| s.metadata.insert(key.to_string(), value));
    }

    fn metadata(&self, surface: SurfaceId, key: &str) -> Option<serde_json::Value> {
        self.with_surface(surface, |s| s.metadata.get(key).cloned()).flatten()
    }

    fn show_end(&self, _surface: SurfaceId) {}

    fn selection_text(&self, surface: SurfaceId) -> Vec<String> {
        self.with_surface(surface, |s| s.selection.clone().into_iter().collect())
            .unwrap_or_default()
    }

    fn set_status(&self, surface: SurfaceId, _tag: &str, text: &str) {
        if !self.status_on_stderr {
            return;
        }
        let title = self.with_surface(surface, |s| s.title.clone()).unwrap_or_default();
        let mut state = self.lock();
        if text.is_empty() {
            if state.status_shown {
                state.status_shown = false;
                eprint!("\r\x1b[K");
            }
        } else {
            state.status_shown = true;
            eprint!("\r\x1b[K{title}: {text}");
        }
    }

    fn prompt_input<'a>(&'a self, message: &'a str, default: &'a str) -> PromptFuture<'a> {
        self.clear_status_line();
        let message = message.to_string();
        let default = default.to_string();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || read_answer(&message, &default))
                .await
                .ok()
                .flatten()
        })
    }

    fn error_message(&self, text: &str) {
        self.clear_status_line();
        eprintln!("{text}");
    }

    fn status_message(&self, text: &str) {
        self.clear_status_line();
        eprintln!("{text}");
    }
}

/// Reads one answer from stdin; `None` on end of input.
fn read_answer(message: &str, default: &str) -> Option<String> {
    if default.is_empty() {
        eprint!("{message}: ");
    } else {
        eprint!("{message} [{default}]: ");
    }
    let _ = io::stderr().flush();

    let mut line = String::new();
    match io::stdin().lock().read_line(&mut line) {
        Ok(0) | Err(_) => None,
        Ok(_) => {
            let answer = line.trim_end_matches(['\r', '\n']);
            Some(if answer.is_empty() { default.to_string() } else { answer.to_string() })
        }
    }
}
