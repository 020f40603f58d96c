//! Live adapters driving a real terminal.

pub mod host;
pub mod workspace;

pub use host::TerminalHost;
pub use workspace::TerminalWorkspace;
