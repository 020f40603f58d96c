//! Command execution: the immutable [`CommandSpec`] and the [`ShellRunner`].

pub mod runner;
pub mod spec;

pub use runner::{Chunk, RunStream, RunSummary, ShellRunner};
pub use spec::CommandSpec;
