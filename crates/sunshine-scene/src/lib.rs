//! Sunshine Scene - 3D scene orchestration for the solar viewer
//!
//! This crate wires the rendering engine into a single viewer: scene and
//! camera setup, orbit controls, lighting, model and ground loading, the
//! compass, and the per-frame loop (stats, tweens, render events, resize,
//! shutdown). `sunshine-viewer` adds the browser entry point on top.

pub mod camera;
pub mod compass;
pub mod frame;
pub mod ground;
pub mod lighting;
pub mod models;
pub mod orbit;
pub mod types;
pub mod ui;

use bevy::prelude::*;
use sunshine_core::{LoopHandle, ViewerConfig};

/// Plugin that builds the whole viewer from a configuration
pub struct ViewerPlugin {
    config: ViewerConfig,
    loop_handle: LoopHandle,
}

impl ViewerPlugin {
    pub fn new(config: ViewerConfig) -> Self {
        Self {
            config,
            loop_handle: LoopHandle::new(),
        }
    }

    /// Share a stop handle with the caller so it can end the render loop
    pub fn with_loop_handle(mut self, loop_handle: LoopHandle) -> Self {
        self.loop_handle = loop_handle;
        self
    }
}

impl Plugin for ViewerPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(ViewerSettings(self.config.clone()))
            .insert_resource(frame::RenderLoop::new(self.loop_handle.clone()))
            .add_plugins(frame::FramePlugin)
            .add_plugins(camera::CameraPlugin)
            .add_plugins(compass::CompassPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(ui::StatsOverlayPlugin);
    }
}

// Re-export commonly used types
pub use camera::{CameraChanged, MainCamera, OriginalTarget};
pub use compass::{CompassHeading, CompassIndicator, CompassSink};
pub use frame::{FrameSet, RenderEventQueue, RenderEventsAppExt, RenderLoop, Tweens};
pub use models::{Building, InitModel};
pub use orbit::OrbitControls;
pub use types::ViewerSettings;
