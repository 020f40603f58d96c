//! Per-run bookkeeping.

use std::fmt;

use tokio::sync::OwnedMutexGuard;

use crate::output::{OutputSink, ProgressIndicator};

/// Where a run is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Nothing started yet.
    Idle,
    /// Waiting on the user for placeholder values.
    Prompting,
    /// The command batch is executing.
    Running,
    /// The end marker arrived; wrapping up.
    Finalizing,
    /// The run is over.
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Prompting => "prompting",
            Self::Running => "running",
            Self::Finalizing => "finalizing",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Mutable state owned by one run's driver task.
pub(crate) struct RunState {
    phase: Phase,
    finished: bool,
    output_written: bool,
    pub(crate) sink: Option<OutputSink>,
    pub(crate) progress: Option<ProgressIndicator>,
    pub(crate) surface_guard: Option<OwnedMutexGuard<()>>,
}

impl RunState {
    pub(crate) fn new(progress: Option<ProgressIndicator>) -> Self {
        Self {
            phase: Phase::Idle,
            finished: false,
            output_written: false,
            sink: None,
            progress,
            surface_guard: None,
        }
    }

    pub(crate) fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn enter(&mut self, phase: Phase) {
        tracing::trace!(from = %self.phase, to = %phase, "run phase");
        self.phase = phase;
    }

    /// Once set, never cleared.
    pub(crate) fn finish(&mut self) {
        self.finished = true;
    }

    pub(crate) fn is_finished(&self) -> bool {
        self.finished
    }

    pub(crate) fn mark_written(&mut self) {
        self.output_written = true;
    }

    pub(crate) fn output_written(&self) -> bool {
        self.output_written
    }

    /// Whether this run holds the write lock of its output surface.
    pub(crate) fn holds_surface(&self) -> bool {
        self.surface_guard.is_some()
    }

    pub(crate) fn stop_progress(&mut self) {
        if let Some(progress) = self.progress.as_mut() {
            progress.stop();
        }
    }
}
