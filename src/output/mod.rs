//! Where command output ends up: sinks, replay records and the progress ticker.

pub mod progress;
pub mod sink;

pub use progress::ProgressIndicator;
pub use sink::{Destination, OutputSink, ReplayRecord, SinkOptions};
