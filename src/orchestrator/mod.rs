//! Drives a request from command text to output on a surface.
//!
//! A run moves through `Idle → Prompting? → Running → Finalizing → Done`.
//! Everything that touches the host happens on the async side; the blocking
//! process I/O lives on the runner's worker thread and arrives here as
//! [`Chunk`]s.

pub mod history;
pub mod request;
pub mod state;
pub mod working_dir;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{Mutex as SurfaceLock, OwnedMutexGuard};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub use history::CommandHistory;
pub use request::{CommandRequest, RegionSource};
pub use state::Phase;
pub use working_dir::resolve_working_dir;

use crate::config::Settings;
use crate::error::{CommandError, RunError};
use crate::output::{Destination, OutputSink, ProgressIndicator, ReplayRecord, SinkOptions};
use crate::ports::{PresentationHost, SurfaceId, Workspace};
use crate::shell::{Chunk, CommandSpec, RunStream, RunSummary, ShellRunner};
use crate::template::{TemplateResolver, VariableTable};
use state::RunState;

/// Status slot used by the progress indicator.
pub const PROGRESS_TAG: &str = "shellcmd";

const PROGRESS_LABEL_WIDTH: usize = 40;

/// How a finished run went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
    /// The surface that received output, if one was created.
    pub surface: Option<SurfaceId>,
    /// Exit codes of the batch.
    pub summary: RunSummary,
    /// The literal commands that ran.
    pub command: CommandSpec,
}

/// A run in progress.
#[derive(Debug)]
pub struct RunHandle {
    id: Uuid,
    join: JoinHandle<Result<RunOutcome, CommandError>>,
}

impl RunHandle {
    /// Identifier shared with the runner's worker thread.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Whether the run has completed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }

    /// Waits for the run to complete.
    ///
    /// # Errors
    ///
    /// Returns the run's error, or [`CommandError::Task`] if the driver task
    /// panicked.
    pub async fn wait(self) -> Result<RunOutcome, CommandError> {
        self.join.await.map_err(|err| CommandError::Task(err.to_string()))?
    }
}

/// What [`CommandOrchestrator::run_command`] handed back.
#[derive(Debug)]
pub enum Dispatch {
    /// The run continues in the background.
    Started(RunHandle),
    /// The caller asked to wait; the run is over.
    Completed(RunOutcome),
}

#[derive(Default)]
struct Selection {
    arg: Option<String>,
    stdin: Option<String>,
}

struct Job {
    record: ReplayRecord,
    options: SinkOptions,
    origin: SurfaceId,
    refresh_origin: bool,
    scroll_to_end: bool,
}

/// Entry point for running commands against a presentation host.
pub struct CommandOrchestrator {
    host: Arc<dyn PresentationHost>,
    workspace: Arc<dyn Workspace>,
    settings: Settings,
    runner: ShellRunner,
    history: Mutex<CommandHistory>,
    surface_locks: Mutex<HashMap<SurfaceId, Arc<SurfaceLock<()>>>>,
}

impl CommandOrchestrator {
    /// Creates an orchestrator over the given ports.
    pub fn new(
        host: Arc<dyn PresentationHost>,
        workspace: Arc<dyn Workspace>,
        settings: Settings,
    ) -> Self {
        Self {
            host,
            workspace,
            settings,
            runner: ShellRunner::new(),
            history: Mutex::new(CommandHistory::new()),
            surface_locks: Mutex::new(HashMap::new()),
        }
    }

    /// A copy of the commands typed at the command prompt so far.
    #[must_use]
    pub fn history(&self) -> CommandHistory {
        self.history_lock().clone()
    }

    /// Runs `request` on behalf of the surface `origin`.
    ///
    /// Dialog-worthy failures (missing argument, empty command, command not
    /// found) are shown through the host before being returned.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::PromptCancelled`] if the user dismissed a
    /// prompt, in which case nothing was launched. When waiting for
    /// completion, the run's own failure is returned as well.
    pub async fn run_command(
        self: &Arc<Self>,
        request: CommandRequest,
        origin: SurfaceId,
    ) -> Result<Dispatch, CommandError> {
        let wait = request.wait_for_completion;
        let handle = match self.launch(request, origin).await {
            Ok(handle) => handle,
            Err(err) => {
                self.report(&err);
                return Err(err);
            }
        };
        if wait {
            handle.wait().await.map(Dispatch::Completed)
        } else {
            Ok(Dispatch::Started(handle))
        }
    }

    /// Re-runs the command recorded on `surface`, replacing its content.
    ///
    /// Waits for any run currently writing to `surface` to finish first.
    ///
    /// # Errors
    ///
    /// Returns [`CommandError::NotRefreshable`] if the surface carries no
    /// replay record; the host's status bar says so too.
    pub async fn refresh(self: &Arc<Self>, surface: SurfaceId) -> Result<RunHandle, CommandError> {
        let guard = self.claim(surface).await;
        let Some(stored) = ReplayRecord::load(self.host.as_ref(), &self.settings, surface)? else {
            self.host.status_message(&CommandError::NotRefreshable.to_string());
            return Err(CommandError::NotRefreshable);
        };
        info!(%surface, command = %stored.command.display(), "refreshing surface");

        let record = ReplayRecord::new(stored.command, stored.working_dir);
        let sink = OutputSink::reuse(Arc::clone(&self.host), &self.settings, surface, &record)?;
        let mut state = RunState::new(None);
        state.sink = Some(sink);
        state.surface_guard = Some(guard);

        let job = Job {
            record,
            options: SinkOptions::default(),
            origin: surface,
            refresh_origin: false,
            scroll_to_end: true,
        };
        self.start(job, state)
    }

    async fn launch(
        self: &Arc<Self>,
        request: CommandRequest,
        origin: SurfaceId,
    ) -> Result<RunHandle, CommandError> {
        let mut state = RunState::new(None);
        let selection = self.selection(&request, origin)?;
        let templates = self.command_text(&request).await?;

        let resolver = TemplateResolver::new(VariableTable::from_workspace(self.workspace.as_ref()));
        if !resolver.plan(&templates).asks().is_empty() {
            state.enter(Phase::Prompting);
        }
        let resolved: Vec<String> = resolver
            .resolve(&templates, self.host.as_ref())
            .await?
            .into_iter()
            .filter(|command| !command.trim().is_empty())
            .collect();
        if resolved.is_empty() {
            return Err(CommandError::EmptyCommand);
        }
        let commands =
            decorate(resolved, selection.arg.as_deref(), request.command_prefix.as_deref());

        let replayed = ReplayRecord::load(self.host.as_ref(), &self.settings, origin)?;
        let working_dir = resolve_working_dir(
            request.root_dir.as_deref(),
            replayed.as_ref().and_then(|record| record.working_dir.as_deref()),
            self.settings.working_dir.as_deref(),
            self.workspace.as_ref(),
        );
        let spec = CommandSpec::new(commands)
            .with_working_dir(working_dir.clone())
            .with_stdin(selection.stdin)
            .with_shell(request.shell)
            .with_bootstrap_file(self.settings.shell_configuration_file.clone());

        let job = Job {
            record: ReplayRecord::new(spec, working_dir),
            options: SinkOptions {
                destination: request.destination,
                title: request.title,
                syntax: request.syntax,
            },
            origin,
            refresh_origin: request.refresh,
            scroll_to_end: request.scroll_to_end,
        };
        self.start(job, state)
    }

    /// Reads the origin's selection as the request's argument or stdin.
    fn selection(
        &self,
        request: &CommandRequest,
        origin: SurfaceId,
    ) -> Result<Selection, CommandError> {
        let separator = match request.region {
            RegionSource::None => return Ok(Selection::default()),
            RegionSource::Arg => " ",
            RegionSource::Stdin => "\n",
        };
        let text = self.host.selection_text(origin).join(separator);
        if text.trim().is_empty() {
            return if request.arg_required {
                Err(CommandError::MissingArgument)
            } else {
                Ok(Selection::default())
            };
        }
        Ok(match request.region {
            RegionSource::Arg => Selection { arg: Some(text.trim().to_string()), stdin: None },
            _ => Selection { arg: None, stdin: Some(text) },
        })
    }

    /// The request's templates, or a single one typed at the command prompt.
    async fn command_text(&self, request: &CommandRequest) -> Result<Vec<String>, CommandError> {
        if !request.is_blank() {
            return Ok(request.commands.clone());
        }
        let message = request.prompt.as_deref().unwrap_or(&self.settings.default_prompt);
        let entered =
            self.host.prompt_input(message, "").await.ok_or(CommandError::PromptCancelled)?;
        self.history_lock().insert(entered.clone());
        Ok(vec![entered])
    }

    fn start(self: &Arc<Self>, job: Job, mut state: RunState) -> Result<RunHandle, CommandError> {
        let stream = self.runner.spawn(job.record.command.clone())?;
        let id = stream.id();
        info!(
            run = %id,
            command = %job.record.command.display(),
            dir = ?job.record.working_dir,
            "command started"
        );

        let mut progress = ProgressIndicator::new(
            Arc::clone(&self.host),
            job.origin,
            PROGRESS_TAG,
            progress_label(&job.record.command),
        );
        progress.start();
        state.progress = Some(progress);
        state.enter(Phase::Running);

        let this = Arc::clone(self);
        let join = tokio::spawn(async move { this.drive(job, stream, state).await });
        Ok(RunHandle { id, join })
    }

    async fn drive(
        self: Arc<Self>,
        job: Job,
        mut stream: RunStream,
        mut state: RunState,
    ) -> Result<RunOutcome, CommandError> {
        let heartbeat = self.settings.heartbeat();
        let mut ticker = time::interval_at(Instant::now() + heartbeat, heartbeat);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        let result = loop {
            tokio::select! {
                biased;
                chunk = stream.next() => match chunk {
                    Some(Chunk::Text(text)) => self.accept(&job, &mut state, &text).await?,
                    Some(Chunk::End(result)) => break result,
                    None => break Err(RunError::WorkerLost),
                },
                _ = ticker.tick(), if !state.is_finished() => {
                    if let Some(progress) = state.progress.as_mut() {
                        progress.tick();
                    }
                }
            }
        };
        debug!(run = %stream.id(), phase = %state.phase(), "output complete");

        state.finish();
        state.enter(Phase::Finalizing);
        let outcome = self.finalize(&job, &mut state, result).await;
        state.stop_progress();
        state.enter(Phase::Done);
        drop(state);

        if outcome.is_ok() && job.refresh_origin {
            self.refresh_after(job.origin);
        }
        outcome
    }

    async fn accept(
        &self,
        job: &Job,
        state: &mut RunState,
        text: &str,
    ) -> Result<(), CommandError> {
        if text.trim().is_empty() && !state.output_written() {
            debug!(len = text.len(), "skipping blank leading output");
            return Ok(());
        }
        self.write(job, state, text).await
    }

    async fn finalize(
        &self,
        job: &Job,
        state: &mut RunState,
        result: Result<RunSummary, RunError>,
    ) -> Result<RunOutcome, CommandError> {
        let summary = match result {
            Ok(summary) => summary,
            Err(err) => {
                state.stop_progress();
                if err.is_user_facing() {
                    warn!(error = %err, "command could not run");
                    self.host.error_message(&err.to_string());
                } else {
                    error!(error = %err, "command failed");
                }
                return Err(err.into());
            }
        };
        info!(exit_codes = ?summary.exit_codes, "command finished");

        if !state.output_written() {
            if self.settings.show_success_but_no_output_message {
                self.write(job, state, &self.settings.success_but_no_output_message).await?;
            } else {
                debug!("command produced no output");
            }
        }

        Ok(RunOutcome {
            surface: state.sink.as_ref().map(OutputSink::surface),
            summary,
            command: job.record.command.clone(),
        })
    }

    /// Appends to the run's sink, creating it on first use.
    async fn write(
        &self,
        job: &Job,
        state: &mut RunState,
        text: &str,
    ) -> Result<(), CommandError> {
        let sink = match state.sink.take() {
            Some(sink) => sink,
            None => self.open_sink(job, state).await?,
        };
        sink.append(text, job.scroll_to_end);
        state.mark_written();
        state.sink = Some(sink);
        Ok(())
    }

    /// Creates the output surface and takes its write lock.
    ///
    /// The shared panel is claimed before it is emptied, so a run queues
    /// behind whichever run or refresh is still writing into it.
    async fn open_sink(
        &self,
        job: &Job,
        state: &mut RunState,
    ) -> Result<OutputSink, CommandError> {
        if job.options.destination == Destination::Panel {
            let panel = self.host.panel(&self.settings.panel_name);
            debug!(%panel, "waiting for the output panel");
            state.surface_guard = Some(self.claim(panel).await);
        }
        let sink = OutputSink::create(
            Arc::clone(&self.host),
            &self.settings,
            &job.options,
            job.origin,
            &job.record,
        )?;
        if !state.holds_surface() && sink.surface() != job.origin {
            state.surface_guard = Some(self.claim(sink.surface()).await);
        }
        debug!(surface = %sink.surface(), locked = state.holds_surface(), "output surface ready");

        if let Some(progress) = state.progress.as_mut() {
            if progress.surface() != sink.surface() {
                let mut moved = progress.retargeted(sink.surface());
                progress.stop();
                moved.start();
                *progress = moved;
            }
        }
        Ok(sink)
    }

    fn refresh_after(self: &Arc<Self>, origin: SurfaceId) {
        match ReplayRecord::load(self.host.as_ref(), &self.settings, origin) {
            Ok(Some(_)) => {
                let this = Arc::clone(self);
                tokio::spawn(async move {
                    let result = match this.refresh(origin).await {
                        Ok(handle) => handle.wait().await.map(|_| ()),
                        Err(err) => Err(err),
                    };
                    if let Err(err) = result {
                        warn!(%origin, error = %err, "refresh of originating surface failed");
                        this.host.status_message(&format!("Refresh failed: {err}"));
                    }
                });
            }
            Ok(None) => debug!(%origin, "originating surface has nothing to refresh"),
            Err(err) => warn!(%origin, error = %err, "unreadable replay record"),
        }
    }

    fn report(&self, err: &CommandError) {
        match err {
            CommandError::PromptCancelled => debug!("prompt cancelled, nothing dispatched"),
            err if err.is_reported() => self.host.error_message(&err.to_string()),
            err => error!(error = %err, "command not dispatched"),
        }
    }

    /// Waits for exclusive write access to `surface`.
    async fn claim(&self, surface: SurfaceId) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.surface_locks.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(locks.entry(surface).or_default())
        };
        lock.lock_owned().await
    }

    fn history_lock(&self) -> MutexGuard<'_, CommandHistory> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Appends the selection argument and prepends the prefix, after templating
/// so neither is read as a placeholder.
fn decorate(commands: Vec<String>, arg: Option<&str>, prefix: Option<&str>) -> Vec<String> {
    commands
        .into_iter()
        .map(|command| {
            let command = match arg {
                Some(arg) => format!("{command} {arg}"),
                None => command,
            };
            match prefix {
                Some(prefix) => format!("{prefix} {command}"),
                None => command,
            }
        })
        .collect()
}

fn progress_label(spec: &CommandSpec) -> String {
    let text = spec.display();
    match text.char_indices().nth(PROGRESS_LABEL_WIDTH) {
        Some((index, _)) => format!("{}...", &text[..index]),
        None => text,
    }
}
