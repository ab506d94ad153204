//! Building model loading
//!
//! [`InitModel`] loads the configured glTF model and, the first time, adds
//! the sun light and the ground plane. Loaded meshes get a cloned material
//! tinted with the configured colour; the original colour is kept in
//! [`PreparedMaterial`]. A building stays hidden until every one of its
//! meshes has been prepared, so it never shows with its source materials.

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::light::{NotShadowCaster, NotShadowReceiver};
use bevy::prelude::*;
use sunshine_core::{ViewerConfig, ViewerError};

use crate::frame::FrameSet;
use crate::ground::{basic_floor, track_ground_texture, GroundPlane};
use crate::lighting::{init_light, SunLight};
use crate::types::{hex_color, ViewerSettings};

/// Request to load the configured model (and set up light and ground)
#[derive(Message, Debug, Clone, Copy, Default)]
pub struct InitModel;

/// Root entity of a loaded building
#[derive(Component, Debug, Clone)]
pub struct Building {
    pub source: String,
}

/// Building whose meshes are not all prepared yet
#[derive(Component, Debug, Clone, Copy)]
pub struct AwaitingPreparation;

/// Set on building meshes whose material has been prepared
#[derive(Component, Debug, Clone, Copy)]
pub struct PreparedMaterial {
    pub origin_color: Color,
}

struct PendingModel {
    url: String,
    scale: f32,
    handle: Handle<Gltf>,
}

/// glTF extension for Draco compressed geometry, which `bevy_gltf` cannot decode
pub const DRACO_EXTENSION: &str = "KHR_draco_mesh_compression";

/// Models requested but not loaded yet
#[derive(Resource, Default)]
pub struct ModelLoader {
    pending: Vec<PendingModel>,
    last_failure: Option<ViewerError>,
}

impl ModelLoader {
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }

    /// Most recent model that failed to load
    pub fn last_failure(&self) -> Option<&ViewerError> {
        self.last_failure.as_ref()
    }
}

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<InitModel>()
            .init_resource::<ModelLoader>()
            .add_systems(Startup, request_initial_model)
            .add_systems(
                Update,
                (
                    init_model,
                    track_model_loads,
                    track_ground_texture,
                    prepare_building_meshes,
                    reveal_prepared_buildings,
                )
                    .chain()
                    .in_set(FrameSet::Assets),
            );
    }
}

fn request_initial_model(settings: Res<ViewerSettings>, mut requests: MessageWriter<InitModel>) {
    if settings.model.load_on_start {
        requests.write(InitModel);
    }
}

/// Start loading the configured model, if any
pub fn load_model(settings: &ViewerConfig, asset_server: &AssetServer, loader: &mut ModelLoader) {
    let Some(url) = settings.model.url.clone() else {
        tracing::warn!("No model URL configured, nothing to load");
        return;
    };

    tracing::info!("Loading model: {}", url);
    let handle: Handle<Gltf> = asset_server.load(url.clone());
    loader.pending.push(PendingModel {
        url,
        scale: settings.model.scale,
        handle,
    });
}

#[allow(clippy::too_many_arguments)]
fn init_model(
    mut requests: MessageReader<InitModel>,
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    asset_server: Res<AssetServer>,
    mut loader: ResMut<ModelLoader>,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    suns: Query<(), With<SunLight>>,
    grounds: Query<(), With<GroundPlane>>,
) {
    let count = requests.read().count();
    if count == 0 {
        return;
    }

    for _ in 0..count {
        load_model(&settings, &asset_server, &mut loader);
    }
    if suns.is_empty() {
        init_light(&mut commands, &settings);
    }
    if grounds.is_empty() {
        basic_floor(
            &mut commands,
            &settings,
            &asset_server,
            &mut meshes,
            &mut materials,
        );
    }
}

/// Spawn finished models and drop failed ones
fn track_model_loads(
    mut commands: Commands,
    mut loader: ResMut<ModelLoader>,
    asset_server: Res<AssetServer>,
    gltfs: Res<Assets<Gltf>>,
) {
    if loader.pending.is_empty() {
        return;
    }

    let pending = std::mem::take(&mut loader.pending);
    for model in pending {
        match asset_server.get_load_state(model.handle.id()) {
            Some(LoadState::Loaded) => {
                let scene = gltfs
                    .get(&model.handle)
                    .and_then(|gltf| pick_scene(gltf.default_scene.as_ref(), &gltf.scenes));
                match scene {
                    Some(scene) => {
                        spawn_building(&mut commands, scene, model.url, model.scale);
                    }
                    None => {
                        let err = model_load_error(&model.url, "no scene to display".to_string());
                        tracing::error!("Error loading model: {}", err);
                        loader.last_failure = Some(err);
                    }
                }
            }
            Some(LoadState::Failed(err)) => {
                let err = model_load_error(&model.url, err.to_string());
                tracing::error!("Error loading model: {}", err);
                loader.last_failure = Some(err);
            }
            _ => loader.pending.push(model),
        }
    }
}

/// The model's default scene, else its first one
pub fn pick_scene(
    default_scene: Option<&Handle<Scene>>,
    scenes: &[Handle<Scene>],
) -> Option<Handle<Scene>> {
    default_scene.or_else(|| scenes.first()).cloned()
}

/// Describe a failed model load, calling out Draco compressed geometry
pub fn model_load_error(url: &str, reason: String) -> ViewerError {
    let reason = if reason.contains(DRACO_EXTENSION) {
        format!(
            "{} is not supported, re-export the model without mesh compression ({})",
            DRACO_EXTENSION, reason
        )
    } else {
        reason
    };
    ViewerError::AssetLoad {
        path: url.to_string(),
        reason,
    }
}

/// Spawn a hidden building root for `scene`, scaled uniformly
pub fn spawn_building(
    commands: &mut Commands,
    scene: Handle<Scene>,
    source: String,
    scale: f32,
) -> Entity {
    tracing::info!("Model loaded: {}", source);
    commands
        .spawn((
            SceneRoot(scene),
            Transform::from_scale(Vec3::splat(scale)),
            // Shown by reveal_prepared_buildings
            Visibility::Hidden,
            AwaitingPreparation,
            Building { source },
        ))
        .id()
}

/// Give every building mesh its own tinted, double-sided material that
/// casts and receives shadows
fn prepare_building_meshes(
    mut commands: Commands,
    settings: Res<ViewerSettings>,
    buildings: Query<Entity, With<Building>>,
    children: Query<&Children>,
    meshes: Query<&MeshMaterial3d<StandardMaterial>, (With<Mesh3d>, Without<PreparedMaterial>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let tint = hex_color(&settings.model.tint);

    for building in &buildings {
        for entity in children.iter_descendants(building) {
            let Ok(material) = meshes.get(entity) else {
                continue;
            };
            // Shared materials are not ready until their asset is
            let Some(original) = materials.get(&material.0).cloned() else {
                continue;
            };

            let origin_color = original.base_color;
            let prepared = materials.add(StandardMaterial {
                base_color: tint,
                double_sided: true,
                cull_mode: None,
                ..original
            });
            commands
                .entity(entity)
                .insert((MeshMaterial3d(prepared), PreparedMaterial { origin_color }))
                .remove::<(NotShadowCaster, NotShadowReceiver)>();
        }
    }
}

/// Show buildings once their scene is instantiated and every mesh is prepared
fn reveal_prepared_buildings(
    mut commands: Commands,
    mut buildings: Query<(Entity, &mut Visibility), (With<Building>, With<AwaitingPreparation>)>,
    children: Query<&Children>,
    unprepared: Query<(), (With<Mesh3d>, Without<PreparedMaterial>)>,
) {
    for (building, mut visibility) in &mut buildings {
        let mut descendants = children.iter_descendants(building).peekable();
        if descendants.peek().is_none() {
            continue;
        }
        if descendants.any(|entity| unprepared.contains(entity)) {
            continue;
        }

        *visibility = Visibility::Inherited;
        commands.entity(building).remove::<AwaitingPreparation>();
        tracing::debug!(?building, "Building revealed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ground::GroundTexture;
    use bevy::asset::io::Reader;
    use bevy::asset::{AssetLoader, LoadContext};
    use bevy::ecs::world::CommandQueue;
    use bevy::scene::ScenePlugin;
    use std::time::Duration;

    /// Claims glTF files so load failures come from the file itself
    #[derive(TypePath)]
    struct UndecodableGltfLoader;

    impl AssetLoader for UndecodableGltfLoader {
        type Asset = Gltf;
        type Settings = ();
        type Error = std::io::Error;

        async fn load(
            &self,
            _reader: &mut dyn Reader,
            _settings: &(),
            _load_context: &mut LoadContext<'_>,
        ) -> Result<Gltf, std::io::Error> {
            Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                "glTF decoding is not available here",
            ))
        }

        fn extensions(&self) -> &[&str] {
            &["glb", "gltf"]
        }
    }

    fn models_app(config: ViewerConfig) -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .add_plugins(AssetPlugin::default())
            .add_plugins(ScenePlugin)
            .init_asset::<Mesh>()
            .init_asset::<Image>()
            .init_asset::<StandardMaterial>()
            .init_asset::<Gltf>()
            .register_asset_loader(UndecodableGltfLoader)
            .register_type::<MeshMaterial3d<StandardMaterial>>()
            .insert_resource(ViewerSettings(config))
            .add_plugins(ModelsPlugin);
        app
    }

    fn count<F: bevy::ecs::query::QueryFilter>(app: &mut App) -> usize {
        let world = app.world_mut();
        world.query_filtered::<Entity, F>().iter(world).count()
    }

    #[test]
    fn test_init_adds_one_ground_and_one_sun() {
        let mut app = models_app(ViewerConfig::default());
        app.update();

        assert_eq!(count::<With<GroundPlane>>(&mut app), 1);
        assert_eq!(count::<With<SunLight>>(&mut app), 1);
        assert!(app.world().resource::<ModelLoader>().is_idle());

        // Calling it again must not stack planes or lights
        app.world_mut().write_message(InitModel);
        app.world_mut().write_message(InitModel);
        app.update();

        assert_eq!(count::<With<GroundPlane>>(&mut app), 1);
        assert_eq!(count::<With<SunLight>>(&mut app), 1);
    }

    #[test]
    fn test_ground_plane_is_horizontal_and_textured() {
        let mut app = models_app(ViewerConfig::default());
        app.update();

        let world = app.world_mut();
        let (transform, material) = world
            .query_filtered::<(&Transform, &MeshMaterial3d<StandardMaterial>), With<GroundPlane>>()
            .single(world)
            .map(|(t, m)| (*t, m.0.clone()))
            .unwrap();

        assert_eq!(transform.translation.y, 0.0);
        assert!((transform.rotation * Vec3::Y).abs_diff_eq(Vec3::Y, 1e-6));

        let material = world.resource::<Assets<StandardMaterial>>().get(&material).unwrap();
        assert!(material.base_color_texture.is_some());
        assert!(material.unlit);
        assert!(material.double_sided);
        assert!(material.cull_mode.is_none());

        assert_eq!(world.resource::<GroundTexture>().path, "bg.png");
    }

    #[test]
    fn test_nothing_loads_when_disabled() {
        let mut config = ViewerConfig::default();
        config.model.load_on_start = false;
        let mut app = models_app(config);
        app.update();

        assert_eq!(count::<With<GroundPlane>>(&mut app), 0);
        assert_eq!(count::<With<SunLight>>(&mut app), 0);
    }

    #[test]
    fn test_failed_model_leaves_scene_unchanged() {
        let mut config = ViewerConfig::default();
        config.model.url = Some("missing/building.glb".to_string());
        let mut app = models_app(config);
        app.update();
        let entities_after_init = app.world().entities().len();

        for _ in 0..200 {
            if app.world().resource::<ModelLoader>().is_idle() {
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
            app.update();
        }

        let loader = app.world().resource::<ModelLoader>();
        assert!(loader.is_idle());
        assert_eq!(loader.pending(), 0);
        let Some(ViewerError::AssetLoad { path, reason }) = loader.last_failure() else {
            panic!("expected the model failure to be recorded");
        };
        assert_eq!(path, "missing/building.glb");
        // A reader failure, not a missing loader for the extension
        assert!(!reason.contains("AssetLoader"), "{}", reason);

        assert_eq!(count::<With<Building>>(&mut app), 0);
        assert_eq!(count::<With<GroundPlane>>(&mut app), 1);
        assert_eq!(app.world().entities().len(), entities_after_init);
    }

    #[test]
    fn test_draco_failure_is_called_out() {
        let err = model_load_error(
            "house.glb",
            "unsupported required extension KHR_draco_mesh_compression".to_string(),
        );
        let ViewerError::AssetLoad { path, reason } = &err else {
            panic!("expected an asset load error");
        };
        assert_eq!(path, "house.glb");
        assert!(reason.starts_with("KHR_draco_mesh_compression is not supported"));

        let err = model_load_error("house.glb", "Path not found".to_string());
        assert_eq!(err.to_string(), "Failed to load asset house.glb: Path not found");
    }

    #[test]
    fn test_default_scene_wins_over_first_scene() {
        let mut scenes = Assets::<Scene>::default();
        let first = scenes.add(Scene::new(World::new()));
        let second = scenes.add(Scene::new(World::new()));
        let all = [first.clone(), second.clone()];

        assert_eq!(pick_scene(Some(&second), &all).map(|h| h.id()), Some(second.id()));
        assert_eq!(pick_scene(None, &all).map(|h| h.id()), Some(first.id()));
        assert!(pick_scene(None, &[]).is_none());
    }

    fn building_scene(app: &mut App, color: Color) -> (Handle<Scene>, Handle<StandardMaterial>) {
        let world = app.world_mut();
        let mesh = world.resource_mut::<Assets<Mesh>>().add(Cuboid::default());
        let material = world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial {
                base_color: color,
                ..default()
            });
        let mut scene_world = World::new();
        scene_world.spawn((
            Mesh3d(mesh),
            MeshMaterial3d(material.clone()),
            Transform::default(),
        ));
        let scene = world.resource_mut::<Assets<Scene>>().add(Scene::new(scene_world));
        (scene, material)
    }

    fn spawn_in(app: &mut App, scene: Handle<Scene>, scale: f32) -> Entity {
        let mut queue = CommandQueue::default();
        let entity = {
            let mut commands = Commands::new(&mut queue, app.world());
            spawn_building(&mut commands, scene, "house.glb".to_string(), scale)
        };
        queue.apply(app.world_mut());
        entity
    }

    fn building_meshes(app: &mut App, building: Entity) -> Vec<Entity> {
        let world = app.world_mut();
        let mut children = world.query::<&Children>();
        let mut meshes = world.query_filtered::<Entity, With<Mesh3d>>();
        let mut found = Vec::new();
        let mut stack = vec![building];
        while let Some(entity) = stack.pop() {
            if meshes.get(world, entity).is_ok() {
                found.push(entity);
            }
            if let Ok(kids) = children.get(world, entity) {
                stack.extend_from_slice(kids);
            }
        }
        found
    }

    #[test]
    fn test_loaded_building_is_scaled_and_marked() {
        let mut config = ViewerConfig::default();
        config.model.load_on_start = false;
        let mut app = models_app(config);
        let (scene, _) = building_scene(&mut app, Color::BLACK);

        let building = spawn_in(&mut app, scene.clone(), 2.5);

        let world = app.world();
        let transform = world.get::<Transform>(building).unwrap();
        assert_eq!(transform.scale, Vec3::splat(2.5));
        assert_eq!(world.get::<Building>(building).unwrap().source, "house.glb");
        assert_eq!(world.get::<SceneRoot>(building).unwrap().0.id(), scene.id());
    }

    #[test]
    fn test_building_hidden_until_every_mesh_is_prepared() {
        let mut config = ViewerConfig::default();
        config.model.load_on_start = false;
        let mut app = models_app(config);
        let source_color = Color::srgb(0.1, 0.2, 0.3);
        let (scene, source_material) = building_scene(&mut app, source_color);

        let building = spawn_in(&mut app, scene, 1.0);
        assert_eq!(app.world().get::<Visibility>(building), Some(&Visibility::Hidden));

        for _ in 0..5 {
            app.update();
            let meshes = building_meshes(&mut app, building);
            let world = app.world();
            let shown = world.get::<Visibility>(building) != Some(&Visibility::Hidden);
            let all_prepared = meshes
                .iter()
                .all(|&mesh| world.get::<PreparedMaterial>(mesh).is_some());
            // Never visible while a mesh still has its source material
            assert!(!shown || (!meshes.is_empty() && all_prepared));
        }

        let meshes = building_meshes(&mut app, building);
        assert_eq!(meshes.len(), 1);
        let world = app.world();
        assert_eq!(world.get::<Visibility>(building), Some(&Visibility::Inherited));
        assert!(world.get::<AwaitingPreparation>(building).is_none());
        let material = &world.get::<MeshMaterial3d<StandardMaterial>>(meshes[0]).unwrap().0;
        assert_ne!(material.id(), source_material.id());
        assert_eq!(
            world.get::<PreparedMaterial>(meshes[0]).unwrap().origin_color,
            source_color
        );
    }

    #[test]
    fn test_building_without_meshes_stays_hidden() {
        let mut config = ViewerConfig::default();
        config.model.load_on_start = false;
        let mut app = models_app(config);
        let world = app.world_mut();
        let building = world
            .spawn((
                Building {
                    source: "empty.glb".to_string(),
                },
                Visibility::Hidden,
                AwaitingPreparation,
            ))
            .id();

        app.update();
        app.update();

        assert_eq!(app.world().get::<Visibility>(building), Some(&Visibility::Hidden));
    }

    #[test]
    fn test_building_meshes_get_tinted_materials() {
        let mut app = models_app(ViewerConfig {
            model: sunshine_core::config::ModelConfig {
                load_on_start: false,
                ..default()
            },
            ..default()
        });

        let original_color = Color::srgb(0.2, 0.4, 0.6);
        let world = app.world_mut();
        let mesh = world.resource_mut::<Assets<Mesh>>().add(Cuboid::default());
        let original = world
            .resource_mut::<Assets<StandardMaterial>>()
            .add(StandardMaterial {
                base_color: original_color,
                ..default()
            });
        let building = world
            .spawn((
                Building {
                    source: "test.glb".to_string(),
                },
                Transform::default(),
            ))
            .id();
        let part = world
            .spawn((
                Mesh3d(mesh),
                MeshMaterial3d(original.clone()),
                NotShadowCaster,
                ChildOf(building),
            ))
            .id();

        app.update();

        let world = app.world();
        let prepared = world.get::<PreparedMaterial>(part).unwrap();
        assert_eq!(prepared.origin_color, original_color);
        assert!(world.get::<NotShadowCaster>(part).is_none());

        let handle = &world.get::<MeshMaterial3d<StandardMaterial>>(part).unwrap().0;
        assert_ne!(handle.id(), original.id());
        let materials = world.resource::<Assets<StandardMaterial>>();
        let material = materials.get(handle).unwrap();
        assert_eq!(material.base_color, Color::srgb_u8(0xff, 0xff, 0xf0));
        assert!(material.double_sided);
        assert!(material.cull_mode.is_none());

        // The shared source material is left untouched
        assert_eq!(materials.get(&original).unwrap().base_color, original_color);
    }
}
