//! Camera setup and orbit navigation

use bevy::input::mouse::{AccumulatedMouseMotion, AccumulatedMouseScroll, MouseScrollUnit};
use bevy::prelude::*;
use bevy::window::PrimaryWindow;
use bevy_egui::EguiContexts;
use std::f32::consts::TAU;

use crate::frame::FrameSet;
use crate::lighting::ambient_light;
use crate::orbit::OrbitControls;
use crate::types::{hex_color, ViewerSettings};

/// Pixel-unit scroll deltas per wheel line
const PIXELS_PER_LINE: f32 = 100.0;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Sent whenever the orbit controls move the main camera
#[derive(Message, Debug, Clone, Copy)]
pub struct CameraChanged {
    pub translation: Vec3,
    pub rotation: Quat,
}

/// Orbit target captured when the camera was created
#[derive(Resource, Debug, Clone, Copy, PartialEq, Deref)]
pub struct OriginalTarget(pub Vec3);

/// Plugin for the main camera and its orbit controls
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CameraChanged>()
            .add_systems(Startup, setup_camera)
            .add_systems(
                Update,
                (
                    orbit_input.in_set(FrameSet::Input),
                    update_orbit_controls.in_set(FrameSet::Controls),
                ),
            );
    }
}

fn setup_camera(mut commands: Commands, settings: Res<ViewerSettings>) {
    let camera = &settings.camera;
    commands.insert_resource(ClearColor(hex_color(&settings.scene.background)));

    let controls = OrbitControls::from_config(&settings.controls);
    commands.insert_resource(OriginalTarget(controls.target));

    commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov_degrees.to_radians(),
            near: camera.near,
            far: camera.far,
            ..default()
        }),
        Transform::from_translation(Vec3::from_array(camera.position))
            .looking_at(controls.target, Vec3::Y),
        ambient_light(&settings),
        controls,
        MainCamera,
    ));

    tracing::info!(position = ?camera.position, "Camera ready");
}

/// Turn pointer, wheel and touch input into orbit control requests.
///
/// Left drag (or one finger) rotates, right drag (or two fingers) pans,
/// the wheel (or a pinch) dollies.
fn orbit_input(
    mouse_buttons: Res<ButtonInput<MouseButton>>,
    mouse_motion: Res<AccumulatedMouseMotion>,
    mouse_scroll: Res<AccumulatedMouseScroll>,
    touches: Res<Touches>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut cameras: Query<(&mut OrbitControls, &Transform, &Projection), With<MainCamera>>,
    mut contexts: EguiContexts,
) {
    // Leave the pointer to the overlay when it is hovered
    let egui_wants_pointer = contexts
        .ctx_mut()
        .map(|ctx| ctx.wants_pointer_input())
        .unwrap_or(false);
    if egui_wants_pointer {
        return;
    }

    let Ok(window) = windows.single() else {
        return;
    };
    let Ok((mut controls, transform, projection)) = cameras.single_mut() else {
        return;
    };
    let height = window.height().max(1.0);

    let mut rotate = Vec2::ZERO;
    let mut pan = Vec2::ZERO;
    let mut dolly = 0.0;

    if mouse_buttons.pressed(MouseButton::Left) {
        rotate += mouse_motion.delta;
    }
    if mouse_buttons.pressed(MouseButton::Right) {
        pan += mouse_motion.delta;
    }
    dolly += match mouse_scroll.unit {
        MouseScrollUnit::Line => mouse_scroll.delta.y,
        MouseScrollUnit::Pixel => mouse_scroll.delta.y / PIXELS_PER_LINE,
    };

    let active: Vec<_> = touches.iter().collect();
    match active.as_slice() {
        [touch] => rotate += touch.delta(),
        [first, second] => {
            pan += (first.delta() + second.delta()) * 0.5;
            let current = first.position().distance(second.position());
            let previous = (first.position() - first.delta())
                .distance(second.position() - second.delta());
            if current > 0.0 && previous > 0.0 {
                controls.dolly_in(previous / current);
            }
        }
        _ => {}
    }

    if rotate != Vec2::ZERO {
        let speed = controls.rotate_speed;
        controls.rotate_left(TAU * rotate.x / height * speed);
        controls.rotate_up(TAU * rotate.y / height * speed);
    }

    if dolly > 0.0 {
        let scale = controls.zoom_scale().powf(dolly);
        controls.dolly_in(scale);
    } else if dolly < 0.0 {
        let scale = controls.zoom_scale().powf(-dolly);
        controls.dolly_out(scale);
    }

    if pan != Vec2::ZERO {
        if let Projection::Perspective(perspective) = projection {
            // World units covered by half the viewport height at the target
            let target_distance =
                (transform.translation - controls.target).length() * (perspective.fov / 2.0).tan();
            let speed = controls.pan_speed;
            let left = -2.0 * pan.x * target_distance / height * speed;
            let up = 2.0 * pan.y * target_distance / height * speed;
            controls.pan(transform.right() * left + transform.up() * up);
        }
    }
}

fn update_orbit_controls(
    mut cameras: Query<(&mut OrbitControls, &mut Transform), With<MainCamera>>,
    mut changed: MessageWriter<CameraChanged>,
) {
    for (mut controls, mut transform) in &mut cameras {
        if controls.update(&mut transform) {
            changed.write(CameraChanged {
                translation: transform.translation,
                rotation: transform.rotation,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Resource, Default)]
    struct SeenChanges(usize);

    fn count_changes(mut reader: MessageReader<CameraChanged>, mut seen: ResMut<SeenChanges>) {
        seen.0 += reader.read().count();
    }

    fn camera_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(ViewerSettings::default())
            .init_resource::<SeenChanges>()
            .add_message::<CameraChanged>()
            .add_systems(Startup, setup_camera)
            .add_systems(Update, (update_orbit_controls, count_changes).chain());
        app
    }

    #[test]
    fn test_setup_camera_uses_configuration() {
        let mut app = camera_app();
        app.update();

        let world = app.world_mut();
        let mut cameras = world.query_filtered::<(&Transform, &Projection, &OrbitControls), With<MainCamera>>();
        let (transform, projection, controls) = cameras.single(world).unwrap();

        assert!(transform
            .translation
            .abs_diff_eq(Vec3::new(200.0, 300.0, 300.0), 1e-3));
        let Projection::Perspective(perspective) = projection else {
            panic!("expected a perspective projection");
        };
        assert!((perspective.fov - 45f32.to_radians()).abs() < 1e-6);
        assert_eq!(perspective.near, 1.0);
        assert_eq!(perspective.far, 3000.0);
        assert!(controls.enable_damping);
        assert_eq!(controls.min_distance, 100.0);
        assert_eq!(controls.max_distance, 1000.0);

        let clear = world.resource::<ClearColor>();
        assert_eq!(clear.0, Color::srgb_u8(0xee, 0xf5, 0xff));
    }

    #[test]
    fn test_original_target_survives_panning() {
        let mut app = camera_app();
        app.update();

        let world = app.world_mut();
        let mut cameras = world.query_filtered::<&mut OrbitControls, With<MainCamera>>();
        cameras.single_mut(world).unwrap().pan(Vec3::new(25.0, 0.0, 0.0));
        app.update();

        assert_eq!(**app.world().resource::<OriginalTarget>(), Vec3::ZERO);
        let world = app.world_mut();
        let mut cameras = world.query_filtered::<&OrbitControls, With<MainCamera>>();
        let controls = cameras.single(world).unwrap();
        assert!(controls.target.x > 0.0);
    }

    #[test]
    fn test_camera_changed_only_while_moving() {
        let mut app = camera_app();
        // First update always reports the initial placement
        app.update();
        assert_eq!(app.world().resource::<SeenChanges>().0, 1);

        app.update();
        assert_eq!(app.world().resource::<SeenChanges>().0, 1);

        let world = app.world_mut();
        let mut cameras = world.query_filtered::<&mut OrbitControls, With<MainCamera>>();
        cameras.single_mut(world).unwrap().rotate_left(0.3);
        app.update();
        assert_eq!(app.world().resource::<SeenChanges>().0, 2);
    }
}
