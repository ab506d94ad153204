//! Ambient light and the shadow-casting sun

use bevy::light::{CascadeShadowConfigBuilder, DirectionalLightShadowMap};
use bevy::prelude::*;
use sunshine_core::ViewerConfig;

use crate::types::hex_color;

/// Marker component for the sun light
#[derive(Component)]
pub struct SunLight;

/// Ambient light carried by the main camera
pub fn ambient_light(settings: &ViewerConfig) -> AmbientLight {
    AmbientLight {
        color: hex_color(&settings.scene.ambient_color),
        brightness: settings.scene.ambient_brightness,
        ..default()
    }
}

/// Spawn the directional sun light aimed at the origin.
///
/// A single shadow cascade covers `shadow_near..shadow_far` so the building
/// and the ground share one shadow map of `shadow_map_size` texels.
pub fn init_light(commands: &mut Commands, settings: &ViewerConfig) -> Entity {
    let sun = &settings.sun;
    commands.insert_resource(DirectionalLightShadowMap {
        size: sun.shadow_map_size,
    });

    let position = Vec3::from_array(sun.position);
    // Looking straight down needs an up vector off the Y axis
    let up = if position.normalize_or_zero().abs_diff_eq(Vec3::Y, 1e-3) {
        Vec3::Z
    } else {
        Vec3::Y
    };

    let entity = commands
        .spawn((
            DirectionalLight {
                color: hex_color(&sun.color),
                illuminance: sun.illuminance,
                shadows_enabled: true,
                ..default()
            },
            Transform::from_translation(position).looking_at(Vec3::ZERO, up),
            CascadeShadowConfigBuilder {
                num_cascades: 1,
                minimum_distance: sun.shadow_near,
                first_cascade_far_bound: sun.shadow_far * 0.5,
                maximum_distance: sun.shadow_far,
                ..default()
            }
            .build(),
            SunLight,
        ))
        .id();

    tracing::info!(position = ?sun.position, "Sun light added");
    entity
}
