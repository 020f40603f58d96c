//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::adapters::terminal::TerminalWorkspace;

/// Top-level CLI parser for `shellcmd`.
#[derive(Debug, Parser)]
#[command(name = "shellcmd", version, about = "Run templated shell commands and capture their output")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run one or more commands, filling `${name:default:prompt}` placeholders.
    Run(RunArgs),
    /// Print the template variables for a workspace.
    Vars {
        /// Workspace the variables are computed from.
        #[command(flatten)]
        workspace: WorkspaceArgs,
    },
}

/// Arguments of `shellcmd run`.
#[derive(Debug, Args)]
pub struct RunArgs {
    /// Command templates, run in order; prompts for one when omitted.
    pub commands: Vec<String>,

    /// Send output to the shared panel instead of a new buffer.
    #[arg(long)]
    pub panel: bool,

    /// Title of the output buffer.
    #[arg(long)]
    pub title: Option<String>,

    /// Syntax name recorded on the output surface.
    #[arg(long)]
    pub syntax: Option<String>,

    /// Run through the shell instead of splitting into arguments.
    #[arg(long)]
    pub shell: bool,

    /// Directory to run in.
    #[arg(long, value_name = "DIR")]
    pub root_dir: Option<PathBuf>,

    /// Read standard input and pass it to the command's standard input.
    #[arg(long)]
    pub stdin: bool,

    /// Text prepended to every command.
    #[arg(long, value_name = "TEXT")]
    pub prefix: Option<String>,

    /// Message shown when prompting for the command.
    #[arg(long, value_name = "TEXT")]
    pub prompt: Option<String>,

    /// Settings file (YAML); defaults to `$SHELLCMD_CONFIG`.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Workspace the command runs against.
    #[command(flatten)]
    pub workspace: WorkspaceArgs,
}

/// Flags describing the editor workspace.
#[derive(Debug, Clone, Default, Args)]
pub struct WorkspaceArgs {
    /// The active file.
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// An open folder; repeat for several.
    #[arg(long = "folder", value_name = "DIR")]
    pub folders: Vec<PathBuf>,

    /// The project file.
    #[arg(long, value_name = "PATH")]
    pub project: Option<PathBuf>,
}

impl WorkspaceArgs {
    /// The workspace these flags describe.
    #[must_use]
    pub fn to_workspace(&self) -> TerminalWorkspace {
        TerminalWorkspace::new(self.file.clone(), self.folders.clone(), self.project.clone())
    }
}
