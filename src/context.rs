//! Service context bundling the port trait objects and settings.

use std::sync::Arc;

use crate::adapters::memory::{MemoryHost, StaticWorkspace};
use crate::adapters::terminal::{TerminalHost, TerminalWorkspace};
use crate::config::Settings;
use crate::orchestrator::CommandOrchestrator;
use crate::ports::{PresentationHost, Workspace};

/// Everything an orchestrator is built from.
///
/// Constructors wire up different adapter implementations (terminal,
/// in-memory).
pub struct ServiceContext {
    /// Display surfaces, prompts and messages.
    pub host: Arc<dyn PresentationHost>,
    /// Editor workspace context used for working directories and variables.
    pub workspace: Arc<dyn Workspace>,
    /// Settings injected into the orchestrator.
    pub settings: Settings,
}

impl ServiceContext {
    /// Creates a context driving the real terminal.
    #[must_use]
    pub fn terminal(host: Arc<TerminalHost>, workspace: TerminalWorkspace, settings: Settings) -> Self {
        Self { host, workspace: Arc::new(workspace), settings }
    }

    /// Creates a headless context over an in-memory host.
    #[must_use]
    pub fn headless(host: Arc<MemoryHost>, workspace: StaticWorkspace, settings: Settings) -> Self {
        Self { host, workspace: Arc::new(workspace), settings }
    }

    /// Builds the orchestrator for this context.
    #[must_use]
    pub fn orchestrator(self) -> Arc<CommandOrchestrator> {
        Arc::new(CommandOrchestrator::new(self.host, self.workspace, self.settings))
    }
}
