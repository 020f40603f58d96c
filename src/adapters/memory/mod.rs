//! Headless adapters: in-memory surfaces and a fixed workspace.

pub mod host;
pub mod workspace;

pub use host::{MemoryHost, SurfaceSnapshot};
pub use workspace::StaticWorkspace;
