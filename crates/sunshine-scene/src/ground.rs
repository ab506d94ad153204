//! Textured ground plane under the building

use bevy::asset::LoadState;
use bevy::image::{
    ImageAddressMode, ImageFilterMode, ImageLoaderSettings, ImageSampler, ImageSamplerDescriptor,
};
use bevy::light::NotShadowCaster;
use bevy::prelude::*;
use sunshine_core::{ViewerConfig, ViewerError};

/// Marker component for the ground plane
#[derive(Component)]
pub struct GroundPlane;

/// Map image drawn on the ground, tracked until it settles
#[derive(Resource, Debug, Clone)]
pub struct GroundTexture {
    pub path: String,
    pub handle: Handle<Image>,
    settled: bool,
}

impl GroundTexture {
    /// Whether the texture finished loading or failed
    pub fn is_settled(&self) -> bool {
        self.settled
    }
}

/// Clamp at the edges, linear filtering both ways
pub fn ground_sampler() -> ImageSamplerDescriptor {
    ImageSamplerDescriptor {
        address_mode_u: ImageAddressMode::ClampToEdge,
        address_mode_v: ImageAddressMode::ClampToEdge,
        mag_filter: ImageFilterMode::Linear,
        min_filter: ImageFilterMode::Linear,
        ..default()
    }
}

pub fn configure_ground_texture(settings: &mut ImageLoaderSettings) {
    settings.is_srgb = true;
    settings.sampler = ImageSampler::Descriptor(ground_sampler());
}

/// Spawn the horizontal, unlit, double-sided ground plane at the origin
pub fn basic_floor(
    commands: &mut Commands,
    settings: &ViewerConfig,
    asset_server: &AssetServer,
    meshes: &mut Assets<Mesh>,
    materials: &mut Assets<StandardMaterial>,
) -> Entity {
    let [width, depth] = settings.ground.size;
    let path = settings.ground.texture.clone();
    let texture: Handle<Image> = asset_server.load_with_settings(path.clone(), configure_ground_texture);

    let material = materials.add(StandardMaterial {
        base_color: Color::WHITE,
        base_color_texture: Some(texture.clone()),
        unlit: true,
        double_sided: true,
        cull_mode: None,
        ..default()
    });

    commands.insert_resource(GroundTexture {
        path: path.clone(),
        handle: texture,
        settled: false,
    });

    let entity = commands
        .spawn((
            Mesh3d(meshes.add(Plane3d::default().mesh().size(width, depth))),
            MeshMaterial3d(material),
            Transform::IDENTITY,
            NotShadowCaster,
            GroundPlane,
        ))
        .id();

    tracing::info!(texture = %path, width, depth, "Ground plane added");
    entity
}

/// Report the outcome of the ground texture load once
pub fn track_ground_texture(texture: Option<ResMut<GroundTexture>>, asset_server: Res<AssetServer>) {
    let Some(mut texture) = texture else {
        return;
    };
    if texture.settled {
        return;
    }

    match asset_server.get_load_state(texture.handle.id()) {
        Some(LoadState::Loaded) => {
            tracing::debug!(path = %texture.path, "Ground texture loaded");
            texture.settled = true;
        }
        Some(LoadState::Failed(err)) => {
            let err = ViewerError::AssetLoad {
                path: texture.path.clone(),
                reason: err.to_string(),
            };
            tracing::error!("Error loading texture: {}", err);
            texture.settled = true;
        }
        _ => {}
    }
}
