//! Port traits defining external boundaries.
//!
//! Each trait represents a boundary between the command pipeline and the
//! editor that hosts it (display surfaces and prompts, workspace context).
//! Implementations live in `src/adapters/`.

pub mod presentation;
pub mod workspace;

pub use presentation::{PresentationHost, PromptFuture, SurfaceId};
pub use workspace::Workspace;
