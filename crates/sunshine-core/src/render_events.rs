//! Per-frame render events
//!
//! Callbacks registered here run once per rendered frame, after the camera
//! controls and tweens have been advanced, in the order they were registered.

/// A zero-argument callback invoked once per frame
pub type RenderEvent = Box<dyn FnMut() + Send + Sync + 'static>;

/// Ordered, append-only list of per-frame callbacks
#[derive(Default)]
pub struct RenderEvents {
    events: Vec<RenderEvent>,
}

impl RenderEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a callback. Registering the same closure twice runs it twice per frame.
    pub fn register<F>(&mut self, callback: F)
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.events.push(Box::new(callback));
    }

    /// Invoke every callback once, in registration order
    pub fn run_all(&mut self) {
        for event in &mut self.events {
            event();
        }
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Drop every callback. Only used when the viewer shuts down.
    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl std::fmt::Debug for RenderEvents {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderEvents")
            .field("len", &self.events.len())
            .finish()
    }
}
