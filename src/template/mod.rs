//! Command templating with `${name[:default[:prompt]]}` placeholders.

pub mod parse;
pub mod resolve;
pub mod variables;

pub use parse::{Placeholder, Segment, Template};
pub use resolve::{Ask, ResolutionPlan, TemplateResolver};
pub use variables::VariableTable;
