//! Binary entrypoint for the `shellcmd` CLI.

use std::process::ExitCode;

fn main() -> ExitCode {
    shellcmd::init_logging();
    match shellcmd::run(std::env::args()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            // Empty means the user already saw the problem.
            if !err.is_empty() {
                eprintln!("{err}");
            }
            ExitCode::FAILURE
        }
    }
}
