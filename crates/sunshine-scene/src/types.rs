//! Shared resources and conversions

use bevy::prelude::*;
use sunshine_core::config::parse_hex_color;
use sunshine_core::ViewerConfig;

/// The viewer configuration, readable (and mutable) from any system.
///
/// `model.url` and `model.scale` may be changed at runtime before sending
/// [`crate::InitModel`].
#[derive(Debug, Clone, Resource, Deref, DerefMut)]
pub struct ViewerSettings(pub ViewerConfig);

impl Default for ViewerSettings {
    fn default() -> Self {
        Self(ViewerConfig::default())
    }
}

/// Convert a `#rrggbb` string into an sRGB colour
pub fn hex_color(hex: &str) -> Color {
    match parse_hex_color(hex) {
        Some([r, g, b]) => Color::srgb_u8(r, g, b),
        None => {
            tracing::warn!(color = hex, "Invalid colour, using white");
            Color::WHITE
        }
    }
}
