//! Sunshine Core - engine-independent pieces of the solar viewer
//!
//! This crate provides the parts of the viewer that do not depend on the
//! rendering engine:
//! - Viewer configuration (defaults, TOML files, URL query overrides)
//! - Error types shared by the scene and viewer crates
//! - The ordered per-frame render-event registry
//! - A tween group advanced once per frame
//! - Frame-rate statistics for the overlay
//! - The render-loop stop handle

pub mod compass;
pub mod config;
pub mod error;
pub mod lifecycle;
pub mod render_events;
pub mod stats;
pub mod tween;

pub use config::{load_config, ViewerConfig};
pub use error::{ConfigError, ViewerError};
pub use lifecycle::LoopHandle;
pub use render_events::RenderEvents;
pub use stats::FrameStats;
pub use tween::{Easing, Tween, TweenGroup};
