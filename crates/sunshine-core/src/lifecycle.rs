//! Render loop stop handle

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared flag that keeps the render loop alive.
///
/// Clones observe the same flag, so a handle given to the page (or to a
/// test) can stop a loop owned by the app.
#[derive(Debug, Clone)]
pub struct LoopHandle {
    running: Arc<AtomicBool>,
}

impl Default for LoopHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopHandle {
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Request the loop to stop. Returns `false` if it was already stopped.
    pub fn stop(&self) -> bool {
        self.running.swap(false, Ordering::AcqRel)
    }
}
