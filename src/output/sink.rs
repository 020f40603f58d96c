//! Output surfaces and the replay record stored on them.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Settings;
use crate::ports::{PresentationHost, SurfaceId};
use crate::shell::CommandSpec;

/// Where a run's output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// The shared output panel.
    Panel,
    /// A fresh scratch buffer.
    #[default]
    NewBuffer,
    /// The originating buffer, replacing its selection.
    Cursor,
}

/// How text is inserted into the sink's surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SinkTarget {
    /// Insert at the end of the content.
    Append,
    /// Replace the selection, or insert at the cursor if nothing is selected.
    OverwriteAtCursor,
}

/// Everything needed to re-run an invocation into the same surface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayRecord {
    /// The fully substituted command that produced the surface's content.
    pub command: CommandSpec,
    /// The directory the command ran in.
    pub working_dir: Option<PathBuf>,
    /// When the record was written.
    pub recorded_at: DateTime<Utc>,
}

impl ReplayRecord {
    /// Creates a record stamped with the current time.
    #[must_use]
    pub fn new(command: CommandSpec, working_dir: Option<PathBuf>) -> Self {
        Self { command, working_dir, recorded_at: Utc::now() }
    }

    /// Reads the record stored on `surface`, if there is one.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored value is not a valid record.
    pub fn load(
        host: &dyn PresentationHost,
        settings: &Settings,
        surface: SurfaceId,
    ) -> Result<Option<Self>, serde_json::Error> {
        let is_output = host
            .metadata(surface, &settings.data_key)
            .and_then(|flag| flag.as_bool())
            .unwrap_or(false);
        if !is_output {
            return Ok(None);
        }
        host.metadata(surface, &settings.replay_key()).map(serde_json::from_value).transpose()
    }

    fn store(
        &self,
        host: &dyn PresentationHost,
        settings: &Settings,
        surface: SurfaceId,
    ) -> Result<(), serde_json::Error> {
        let value = serde_json::to_value(self)?;
        host.set_metadata(surface, &settings.data_key, serde_json::Value::Bool(true));
        host.set_metadata(surface, &settings.replay_key(), value);
        Ok(())
    }
}

/// Presentation options for a newly created sink.
#[derive(Debug, Clone, Default)]
pub struct SinkOptions {
    /// Where the output goes.
    pub destination: Destination,
    /// Title for a new buffer; the configured default when `None`.
    pub title: Option<String>,
    /// Syntax name applied to the surface.
    pub syntax: Option<String>,
}

/// A display surface receiving one run's output.
pub struct OutputSink {
    host: Arc<dyn PresentationHost>,
    surface: SurfaceId,
    target: SinkTarget,
}

impl OutputSink {
    /// Creates the surface described by `options` and records `record` on it.
    ///
    /// The shared panel is emptied before it is handed out.
    /// For [`Destination::Cursor`] the originating surface is used as is and
    /// no record is stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    pub fn create(
        host: Arc<dyn PresentationHost>,
        settings: &Settings,
        options: &SinkOptions,
        origin: SurfaceId,
        record: &ReplayRecord,
    ) -> Result<Self, serde_json::Error> {
        let surface = match options.destination {
            Destination::Cursor => {
                return Ok(Self { host, surface: origin, target: SinkTarget::OverwriteAtCursor });
            }
            Destination::Panel => {
                let panel = host.panel(&settings.panel_name);
                host.set_read_only(panel, false);
                host.clear(panel);
                panel
            }
            Destination::NewBuffer => {
                host.new_surface(options.title.as_deref().unwrap_or(&settings.default_title))
            }
        };

        host.set_scratch(surface, true);
        host.set_read_only(surface, true);
        if let Some(syntax) = &options.syntax {
            host.set_syntax(surface, syntax);
        }
        record.store(host.as_ref(), settings, surface)?;
        debug!(%surface, destination = ?options.destination, "created output surface");

        Ok(Self { host, surface, target: SinkTarget::Append })
    }

    /// Clears an existing output surface in place and records `record` on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be serialized.
    pub fn reuse(
        host: Arc<dyn PresentationHost>,
        settings: &Settings,
        surface: SurfaceId,
        record: &ReplayRecord,
    ) -> Result<Self, serde_json::Error> {
        let read_only = host.is_read_only(surface);
        host.set_read_only(surface, false);
        host.clear(surface);
        host.set_read_only(surface, read_only);
        record.store(host.as_ref(), settings, surface)?;

        Ok(Self { host, surface, target: SinkTarget::Append })
    }

    /// Writes `text` into the surface, restoring its read-only state afterwards.
    pub fn append(&self, text: &str, scroll_to_end: bool) {
        let read_only = self.host.is_read_only(self.surface);
        self.host.set_read_only(self.surface, false);
        match self.target {
            SinkTarget::Append => {
                let end = self.host.size(self.surface);
                self.host.insert(self.surface, end, text);
            }
            SinkTarget::OverwriteAtCursor => self.host.replace_selection(self.surface, text),
        }
        self.host.set_read_only(self.surface, read_only);
        if scroll_to_end {
            self.host.show_end(self.surface);
        }
    }

    /// The surface this sink writes into.
    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::MemoryHost;
    use pretty_assertions::assert_eq;

    fn record() -> ReplayRecord {
        ReplayRecord::new(CommandSpec::new(["ls"]), Some(PathBuf::from("/proj")))
    }

    #[test]
    fn new_buffer_is_scratch_read_only_and_titled() {
        let host = Arc::new(MemoryHost::new());
        let origin = host.new_surface("main.rs");
        let settings = Settings::default();

        let sink =
            OutputSink::create(host.clone(), &settings, &SinkOptions::default(), origin, &record())
                .unwrap();

        let surface = host.snapshot(sink.surface());
        assert_eq!(surface.title, "*Shell Command Output*");
        assert!(surface.scratch);
        assert!(surface.read_only);
    }

    #[test]
    fn append_restores_read_only_and_adds_at_end() {
        let host = Arc::new(MemoryHost::new());
        let origin = host.new_surface("main.rs");
        let settings = Settings::default();
        let sink =
            OutputSink::create(host.clone(), &settings, &SinkOptions::default(), origin, &record())
                .unwrap();

        sink.append("one\n", false);
        sink.append("two\n", true);

        let surface = host.snapshot(sink.surface());
        assert_eq!(surface.text, "one\ntwo\n");
        assert!(surface.read_only);
        assert!(surface.scrolled_to_end);
    }

    #[test]
    fn record_round_trips_through_metadata() {
        let host = Arc::new(MemoryHost::new());
        let origin = host.new_surface("main.rs");
        let settings = Settings::default();
        let options = SinkOptions { destination: Destination::Panel, ..SinkOptions::default() };
        let stored = record();

        let sink = OutputSink::create(host.clone(), &settings, &options, origin, &stored).unwrap();

        let loaded = ReplayRecord::load(host.as_ref(), &settings, sink.surface()).unwrap();
        assert_eq!(loaded, Some(stored));
        assert_eq!(ReplayRecord::load(host.as_ref(), &settings, origin).unwrap(), None);
    }

    #[test]
    fn panel_is_shared_and_emptied_per_run() {
        let host = Arc::new(MemoryHost::new());
        let origin = host.new_surface("main.rs");
        let settings = Settings::default();
        let options = SinkOptions { destination: Destination::Panel, ..SinkOptions::default() };

        let first = OutputSink::create(host.clone(), &settings, &options, origin, &record()).unwrap();
        first.append("first run\n", false);
        let second =
            OutputSink::create(host.clone(), &settings, &options, origin, &record()).unwrap();

        assert_eq!(first.surface(), second.surface());
        assert_eq!(host.snapshot(second.surface()).text, "");
        assert!(host.snapshot(second.surface()).panel);
    }

    #[test]
    fn cursor_destination_overwrites_selection_of_origin() {
        let host = Arc::new(MemoryHost::new());
        let origin = host.new_surface("notes.txt");
        host.set_text(origin, "sort me please");
        host.select(origin, 0, 7);
        let settings = Settings::default();
        let options = SinkOptions { destination: Destination::Cursor, ..SinkOptions::default() };

        let sink = OutputSink::create(host.clone(), &settings, &options, origin, &record()).unwrap();
        sink.append("sorted", false);

        assert_eq!(sink.surface(), origin);
        assert_eq!(host.snapshot(origin).text, "sorted please");
        assert_eq!(ReplayRecord::load(host.as_ref(), &settings, origin).unwrap(), None);
    }

    #[test]
    fn reuse_clears_in_place() {
        let host = Arc::new(MemoryHost::new());
        let origin = host.new_surface("main.rs");
        let settings = Settings::default();
        let first =
            OutputSink::create(host.clone(), &settings, &SinkOptions::default(), origin, &record())
                .unwrap();
        first.append("stale output\n", false);

        let second =
            OutputSink::reuse(host.clone(), &settings, first.surface(), &record()).unwrap();

        assert_eq!(second.surface(), first.surface());
        assert_eq!(host.snapshot(second.surface()).text, "");
        assert!(host.snapshot(second.surface()).read_only);
        assert_eq!(host.surface_count(), 2);
    }
}
