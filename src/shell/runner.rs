//! Process launching and output streaming.
//!
//! Every command of a [`CommandSpec`] is started with stdout and stderr
//! sharing one pipe, and read line by line. The same core drives both the
//! blocking [`ShellRunner::run_to_string`] and the streaming
//! [`ShellRunner::spawn`], which moves the blocking work onto a dedicated
//! worker thread and hands lines back over a channel.

use std::io::{self, BufRead, BufReader, PipeReader, Write};
use std::process::{ChildStdin, Command, Stdio};
use std::thread;

use tokio::sync::mpsc;
use tracing::{debug, warn};
use uuid::Uuid;

use super::spec::CommandSpec;
use crate::error::RunError;

/// One delivery from a running command.
#[derive(Debug)]
pub enum Chunk {
    /// A piece of output, normally one line including its newline.
    Text(String),
    /// No more output will follow. Carries the outcome of the whole batch.
    End(Result<RunSummary, RunError>),
}

/// Exit information for a completed batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Exit code per command, `None` when the process was killed by a signal.
    pub exit_codes: Vec<Option<i32>>,
}

impl RunSummary {
    /// Returns `true` if every command exited with status zero.
    #[must_use]
    pub fn success(&self) -> bool {
        self.exit_codes.iter().all(|code| *code == Some(0))
    }
}

/// Receiving end of a streaming run.
#[derive(Debug)]
pub struct RunStream {
    id: Uuid,
    rx: mpsc::UnboundedReceiver<Chunk>,
    ended: bool,
}

impl RunStream {
    /// Identifier of this run, also used to name the worker thread.
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Waits for the next chunk.
    ///
    /// Returns `None` once the [`Chunk::End`] marker has been delivered. A
    /// worker that dies without sending the marker yields
    /// `Chunk::End(Err(RunError::WorkerLost))`.
    pub async fn next(&mut self) -> Option<Chunk> {
        if self.ended {
            return None;
        }
        let chunk = self.rx.recv().await.unwrap_or(Chunk::End(Err(RunError::WorkerLost)));
        if matches!(chunk, Chunk::End(_)) {
            self.ended = true;
        }
        Some(chunk)
    }
}

/// Launches commands described by a [`CommandSpec`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl ShellRunner {
    /// Creates a runner.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Runs the batch on the calling thread and returns the concatenated output.
    ///
    /// # Errors
    ///
    /// Returns the first launch error; non-zero exit codes are not errors.
    pub fn run_to_string(&self, spec: &CommandSpec) -> Result<String, RunError> {
        let mut output = String::new();
        execute(spec, &mut |text| output.push_str(&text))?;
        Ok(output)
    }

    /// Starts the batch on a worker thread and returns immediately.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Launch`] if the worker thread cannot be created.
    pub fn spawn(&self, spec: CommandSpec) -> Result<RunStream, RunError> {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        let description = spec.display();

        thread::Builder::new()
            .name(format!("shellcmd-run-{id}"))
            .spawn(move || {
                let mut emit = |text: String| {
                    // The receiver only goes away when the caller lost interest.
                    let _ = tx.send(Chunk::Text(text));
                };
                let result = execute(&spec, &mut emit);
                let _ = tx.send(Chunk::End(result));
            })
            .map_err(|source| RunError::Launch { command: description, source })?;

        Ok(RunStream { id, rx, ended: false })
    }
}

/// Runs every command of the batch in order, feeding output to `emit`.
fn execute(spec: &CommandSpec, emit: &mut dyn FnMut(String)) -> Result<RunSummary, RunError> {
    if let Some(dir) = spec.working_dir() {
        if !dir.is_dir() {
            return Err(RunError::Launch {
                command: spec.display(),
                source: io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("working directory {} does not exist", dir.display()),
                ),
            });
        }
    }

    let mut summary = RunSummary::default();
    for command in spec.commands() {
        let code = run_one(spec, command, emit)?;
        debug!(command = %command, exit_code = ?code, "command finished");
        summary.exit_codes.push(code);
    }
    Ok(summary)
}

fn run_one(
    spec: &CommandSpec,
    command: &str,
    emit: &mut dyn FnMut(String),
) -> Result<Option<i32>, RunError> {
    let launch = |source: io::Error| RunError::Launch { command: command.to_string(), source };

    let mut process = build_process(spec, command)?;
    let (reader, writer) = io::pipe().map_err(launch)?;
    let writer_err = writer.try_clone().map_err(launch)?;
    process.stdin(Stdio::piped()).stdout(writer).stderr(writer_err);

    debug!(command, shell = spec.uses_shell(), "spawning");
    let mut child = match process.spawn() {
        Ok(child) => child,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(RunError::CommandNotFound { command: command.to_string() });
        }
        Err(err) => return Err(launch(err)),
    };
    // The parent's copies of the write ends must go, or the read never sees EOF.
    drop(process);

    // The payload goes in from its own thread so a command echoing a large
    // input never waits on a reader that is itself stuck writing.
    let stdin = child.stdin.take();
    let streamed = thread::scope(|scope| {
        let feeder = scope.spawn(|| feed_stdin(command, stdin, spec.stdin()));
        let read = stream_lines(reader, emit);
        if read.is_err() {
            // Unblocks the feeder if the process stopped reading its input.
            let _ = child.kill();
        }
        let fed = feeder
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stdin writer panicked")));
        read.and(fed)
    });
    streamed.map_err(launch)?;

    let status = child.wait().map_err(launch)?;
    Ok(status.code())
}

fn feed_stdin(command: &str, stdin: Option<ChildStdin>, payload: Option<&str>) -> io::Result<()> {
    let (Some(mut stdin), Some(payload)) = (stdin, payload) else {
        return Ok(());
    };
    match stdin.write_all(payload.as_bytes()) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => {
            warn!(command, "process closed stdin before reading the payload");
            Ok(())
        }
        other => other,
    }
}

fn stream_lines(reader: PipeReader, emit: &mut dyn FnMut(String)) -> io::Result<()> {
    let mut reader = BufReader::new(reader);
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line)? == 0 {
            return Ok(());
        }
        emit(String::from_utf8_lossy(&line).into_owned());
    }
}

fn build_process(spec: &CommandSpec, command: &str) -> Result<Command, RunError> {
    let mut process = if spec.uses_shell() {
        let line = match spec.bootstrap_file() {
            Some(file) => bootstrap_line(&file.to_string_lossy(), command),
            None => command.to_string(),
        };
        shell_process(&line)
    } else {
        let words = shell_words::split(command)
            .map_err(|source| RunError::Tokenize { command: command.to_string(), source })?;
        let Some((program, args)) = words.split_first() else {
            return Err(RunError::Launch {
                command: command.to_string(),
                source: io::Error::new(io::ErrorKind::InvalidInput, "empty command line"),
            });
        };
        let mut process = Command::new(program);
        process.args(args);
        process
    };

    if let Some(dir) = spec.working_dir() {
        process.current_dir(dir);
    }
    hide_console(&mut process);
    Ok(process)
}

#[cfg(not(windows))]
fn bootstrap_line(file: &str, command: &str) -> String {
    format!(". {} && {command}", shell_words::quote(file))
}

#[cfg(windows)]
fn bootstrap_line(file: &str, command: &str) -> String {
    format!("call \"{file}\" && {command}")
}

#[cfg(not(windows))]
fn shell_process(line: &str) -> Command {
    let mut process = Command::new("sh");
    process.arg("-c").arg(line);
    process
}

#[cfg(windows)]
fn shell_process(line: &str) -> Command {
    let mut process = Command::new("cmd");
    process.arg("/C").arg(line);
    process
}

#[cfg(windows)]
fn hide_console(process: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    process.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console(_process: &mut Command) {}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::path::PathBuf;

    async fn collect(mut stream: RunStream) -> (Vec<String>, Result<RunSummary, RunError>, usize) {
        let mut texts = Vec::new();
        let mut ends = 0;
        let mut outcome = None;
        while let Some(chunk) = stream.next().await {
            match chunk {
                Chunk::Text(text) => {
                    assert_eq!(ends, 0, "text delivered after end marker");
                    texts.push(text);
                }
                Chunk::End(result) => {
                    ends += 1;
                    outcome = Some(result);
                }
            }
        }
        (texts, outcome.expect("end marker"), ends)
    }

    #[test]
    fn runs_argv_command_synchronously() {
        let output = ShellRunner::new().run_to_string(&CommandSpec::new(["echo hello"])).unwrap();
        assert_eq!(output, "hello\n");
    }

    #[test]
    fn respects_quoting_in_direct_mode() {
        let spec = CommandSpec::new([r#"printf "%s|" "a b" 'c d'"#]);
        let output = ShellRunner::new().run_to_string(&spec).unwrap();
        assert_eq!(output, "a b|c d|");
    }

    #[test]
    fn concatenates_batch_output_in_order() {
        let spec = CommandSpec::new(["echo one", "echo two"]);
        let output = ShellRunner::new().run_to_string(&spec).unwrap();
        assert_eq!(output, "one\ntwo\n");
    }

    #[test]
    fn merges_stderr_into_stdout() {
        let spec = CommandSpec::new(["echo out; echo err 1>&2"]).with_shell(true);
        let output = ShellRunner::new().run_to_string(&spec).unwrap();
        assert!(output.contains("out\n"));
        assert!(output.contains("err\n"));
    }

    #[test]
    fn writes_stdin_payload_then_closes_it() {
        let spec = CommandSpec::new(["cat"]).with_stdin(Some("piped text\n".into()));
        let output = ShellRunner::new().run_to_string(&spec).unwrap();
        assert_eq!(output, "piped text\n");
    }

    #[test]
    fn large_stdin_payload_streams_back_through_cat() {
        let payload = "x".repeat(1 << 20);
        let spec = CommandSpec::new(["cat"]).with_stdin(Some(payload.clone()));
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::spawn(move || {
            let _ = tx.send(ShellRunner::new().run_to_string(&spec));
        });

        let output = rx
            .recv_timeout(std::time::Duration::from_secs(10))
            .expect("run did not finish within 10s")
            .unwrap();
        assert_eq!(output.len(), payload.len());
    }

    #[tokio::test]
    async fn large_stdin_payload_still_ends_when_streamed() {
        let payload = "line\n".repeat(300_000);
        let spec = CommandSpec::new(["cat"]).with_stdin(Some(payload.clone()));
        let stream = ShellRunner::new().spawn(spec).unwrap();

        let (texts, outcome, ends) =
            tokio::time::timeout(std::time::Duration::from_secs(10), collect(stream))
                .await
                .expect("end marker within 10s");
        assert_eq!(ends, 1);
        assert!(outcome.unwrap().success());
        assert_eq!(texts.len(), 300_000);
    }

    #[test]
    fn stdin_is_closed_when_no_payload() {
        let output = ShellRunner::new().run_to_string(&CommandSpec::new(["cat"])).unwrap();
        assert_eq!(output, "");
    }

    #[test]
    fn runs_in_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let canonical = dir.path().canonicalize().unwrap();
        let spec = CommandSpec::new(["pwd -P"])
            .with_shell(true)
            .with_working_dir(Some(dir.path().to_path_buf()));

        let output = ShellRunner::new().run_to_string(&spec).unwrap();
        assert_eq!(PathBuf::from(output.trim()), canonical);
    }

    #[test]
    fn sources_bootstrap_file_before_command() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("env.sh");
        std::fs::write(&file, "GREETING=bonjour\n").unwrap();
        let spec = CommandSpec::new(["echo $GREETING"]).with_bootstrap_file(Some(file));

        let output = ShellRunner::new().run_to_string(&spec).unwrap();
        assert_eq!(output, "bonjour\n");
    }

    #[test]
    fn missing_executable_is_command_not_found() {
        let spec = CommandSpec::new(["shellcmd-definitely-missing --version"]);
        let err = ShellRunner::new().run_to_string(&spec).unwrap_err();
        match err {
            RunError::CommandNotFound { command } => {
                assert_eq!(command, "shellcmd-definitely-missing --version");
            }
            other => panic!("expected CommandNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_working_directory_is_not_command_not_found() {
        let spec = CommandSpec::new(["echo hi"])
            .with_working_dir(Some(PathBuf::from("/definitely/not/a/dir")));
        let err = ShellRunner::new().run_to_string(&spec).unwrap_err();
        assert!(matches!(err, RunError::Launch { .. }));
    }

    #[test]
    fn unbalanced_quote_is_a_tokenize_error() {
        let err = ShellRunner::new().run_to_string(&CommandSpec::new(["echo 'oops"])).unwrap_err();
        assert!(matches!(err, RunError::Tokenize { .. }));
    }

    #[tokio::test]
    async fn streams_lines_then_exactly_one_end_marker() {
        let spec = CommandSpec::new(["printf 'a\\nb\\nc\\n'"]).with_shell(true);
        let stream = ShellRunner::new().spawn(spec).unwrap();

        let (texts, outcome, ends) = collect(stream).await;
        assert_eq!(texts, vec!["a\n", "b\n", "c\n"]);
        assert_eq!(ends, 1);
        assert!(outcome.unwrap().success());
    }

    #[tokio::test]
    async fn non_zero_exit_is_ordinary_completion() {
        let spec = CommandSpec::new(["echo failing; exit 3"]).with_shell(true);
        let (texts, outcome, _) = collect(ShellRunner::new().spawn(spec).unwrap()).await;

        assert_eq!(texts, vec!["failing\n"]);
        let summary = outcome.unwrap();
        assert_eq!(summary.exit_codes, vec![Some(3)]);
        assert!(!summary.success());
    }

    #[tokio::test]
    async fn not_found_stops_the_batch_and_still_ends() {
        let spec = CommandSpec::new(["echo first", "shellcmd-definitely-missing", "echo never"]);
        let (texts, outcome, ends) = collect(ShellRunner::new().spawn(spec).unwrap()).await;

        assert_eq!(texts, vec!["first\n"]);
        assert_eq!(ends, 1);
        assert!(matches!(outcome, Err(RunError::CommandNotFound { .. })));
    }
}
