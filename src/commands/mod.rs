//! Command dispatch and handlers.

pub mod run;
pub mod vars;

use crate::cli::Command;

/// Dispatch a parsed command to its handler.
///
/// # Errors
///
/// Returns an error string if the selected command handler fails. The
/// string is empty when the failure was already shown to the user.
pub fn dispatch(command: &Command) -> Result<(), String> {
    match command {
        Command::Run(args) => run::run(args),
        Command::Vars { workspace } => vars::run(workspace),
    }
}
