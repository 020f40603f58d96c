//! `shellcmd vars` command.

use std::io::{self, Write};

use crate::cli::WorkspaceArgs;
use crate::template::variables::NAMES;
use crate::template::VariableTable;

/// Execute the `vars` command: print every template variable as `name=value`.
///
/// # Errors
///
/// Returns an error string if stdout cannot be written.
pub fn run(workspace: &WorkspaceArgs) -> Result<(), String> {
    let table = VariableTable::from_workspace(&workspace.to_workspace());
    let mut stdout = io::stdout().lock();
    write_table(&table, &mut stdout).map_err(|err| format!("Failed to write variables: {err}"))
}

fn write_table(table: &VariableTable, out: &mut impl Write) -> io::Result<()> {
    for name in NAMES {
        writeln!(out, "{name}={}", table.get(name).unwrap_or_default())?;
    }
    Ok(())
}
