//! Animated status-bar indicator, `[=       ]` sweeping back and forth.

use std::sync::Arc;

use crate::ports::{PresentationHost, SurfaceId};

/// Width of the sweep, in cells.
pub const SWEEP_WIDTH: usize = 8;

/// Animates an indicator in the status slot `tag` of a surface until stopped.
///
/// The owner drives the animation by calling [`tick`](Self::tick) once per
/// heartbeat; a stopped indicator ignores ticks.
pub struct ProgressIndicator {
    host: Arc<dyn PresentationHost>,
    surface: SurfaceId,
    tag: String,
    message: String,
    counter: usize,
    forward: bool,
    running: bool,
}

impl ProgressIndicator {
    /// Creates a stopped indicator bound to `surface`.
    pub fn new(
        host: Arc<dyn PresentationHost>,
        surface: SurfaceId,
        tag: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            host,
            surface,
            tag: tag.into(),
            message: message.into(),
            counter: 0,
            forward: true,
            running: false,
        }
    }

    /// Resets the sweep and shows the first frame.
    pub fn start(&mut self) {
        self.running = true;
        self.counter = 0;
        self.forward = true;
        self.render();
    }

    /// Shows the next frame, if running.
    pub fn tick(&mut self) {
        if self.running {
            self.render();
        }
    }

    /// Clears the status slot and ignores further ticks.
    pub fn stop(&mut self) {
        if self.running {
            self.running = false;
            self.host.set_status(self.surface, &self.tag, "");
        }
    }

    /// Whether the indicator is animating.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// The surface whose status slot shows the indicator.
    #[must_use]
    pub fn surface(&self) -> SurfaceId {
        self.surface
    }

    /// A stopped copy of this indicator bound to another surface.
    #[must_use]
    pub fn retargeted(&self, surface: SurfaceId) -> Self {
        Self::new(Arc::clone(&self.host), surface, self.tag.clone(), self.message.clone())
    }

    fn render(&mut self) {
        let before = self.counter % SWEEP_WIDTH;
        let after = (SWEEP_WIDTH - 1) - before;
        let frame = format!("{} [{}={}]", self.message, " ".repeat(before), " ".repeat(after));
        self.host.set_status(self.surface, &self.tag, &frame);

        if after == 0 {
            self.forward = false;
        }
        if before == 0 {
            self.forward = true;
        }
        self.counter = if self.forward { self.counter + 1 } else { self.counter - 1 };
    }
}

impl Drop for ProgressIndicator {
    fn drop(&mut self) {
        self.stop();
    }
}
