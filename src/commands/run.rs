//! `shellcmd run` command.

use std::io::{self, Read};
use std::sync::Arc;

use tracing::debug;

use crate::adapters::terminal::TerminalHost;
use crate::cli::RunArgs;
use crate::config::Settings;
use crate::context::ServiceContext;
use crate::orchestrator::{CommandRequest, Dispatch, RegionSource, RunOutcome};
use crate::output::Destination;
use crate::shell::RunSummary;

/// Execute the `run` command and wait for it to finish.
///
/// # Errors
///
/// Returns an error string if settings cannot be loaded, the command cannot
/// be dispatched, or any command in the batch exits unsuccessfully. Errors
/// already shown to the user come back as an empty string.
pub fn run(args: &RunArgs) -> Result<(), String> {
    let settings = Settings::load(args.config.as_deref()).map_err(|err| err.to_string())?;
    let selection = if args.stdin { Some(read_stdin()?) } else { None };

    let host = Arc::new(TerminalHost::new());
    let origin = host.origin("terminal", selection);
    let orchestrator =
        ServiceContext::terminal(Arc::clone(&host), args.workspace.to_workspace(), settings)
            .orchestrator();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .map_err(|err| format!("Failed to start runtime: {err}"))?;
    let result = runtime.block_on(orchestrator.run_command(request(args), origin));

    match result {
        Ok(Dispatch::Completed(outcome)) => {
            finish_line(&host, &outcome);
            exit_status(&outcome.summary)
        }
        Ok(Dispatch::Started(_)) => Ok(()),
        Err(err) if err.is_reported() => Err(String::new()),
        Err(err) => Err(err.to_string()),
    }
}

fn request(args: &RunArgs) -> CommandRequest {
    let destination = if args.panel { Destination::Panel } else { Destination::NewBuffer };
    let region = if args.stdin { RegionSource::Stdin } else { RegionSource::None };
    CommandRequest::batch(args.commands.iter().cloned())
        .destination(destination)
        .region(region, false)
        .title(args.title.clone())
        .syntax(args.syntax.clone())
        .shell(args.shell)
        .root_dir(args.root_dir.clone())
        .prompt(args.prompt.clone())
        .command_prefix(args.prefix.clone())
        .wait()
}

fn read_stdin() -> Result<String, String> {
    let mut text = String::new();
    io::stdin().read_to_string(&mut text).map_err(|err| format!("Failed to read stdin: {err}"))?;
    debug!(bytes = text.len(), "read selection from stdin");
    Ok(text)
}

/// Output without a trailing newline would run into the shell prompt.
fn finish_line(host: &TerminalHost, outcome: &RunOutcome) {
    if let Some(surface) = outcome.surface {
        let text = host.text(surface);
        if !text.is_empty() && !text.ends_with('\n') {
            println!();
        }
    }
}

fn exit_status(summary: &RunSummary) -> Result<(), String> {
    match summary.exit_codes.iter().find(|code| **code != Some(0)) {
        None => Ok(()),
        Some(Some(code)) => Err(format!("Command exited with status {code}")),
        Some(None) => Err("Command was terminated by a signal".to_string()),
    }
}
