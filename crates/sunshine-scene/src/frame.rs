//! Per-frame loop: stats, controls, tweens, render events, resize and shutdown
//!
//! Every viewer system runs inside one of the [`FrameSet`] steps, chained in
//! declaration order. The whole chain is gated on the shared [`LoopHandle`];
//! once it is stopped the chain no longer runs and [`teardown`] releases the
//! scene and asks the app to exit.

use bevy::prelude::*;
use bevy::window::{RequestRedraw, WindowResized};
use sunshine_core::{FrameStats, LoopHandle, RenderEvents, TweenGroup};

use crate::camera::MainCamera;
use crate::ground::GroundPlane;
use crate::lighting::SunLight;
use crate::models::Building;
use crate::types::ViewerSettings;

/// Ordered steps of a frame
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameSet {
    Resize,
    Assets,
    Stats,
    Input,
    Controls,
    Compass,
    Tweens,
    RenderEvents,
}

/// Stop handle of the render loop
#[derive(Resource, Debug, Clone, Default)]
pub struct RenderLoop {
    pub handle: LoopHandle,
}

impl RenderLoop {
    pub fn new(handle: LoopHandle) -> Self {
        Self { handle }
    }
}

/// Callbacks run once per frame after everything else
#[derive(Resource, Default, Deref, DerefMut)]
pub struct RenderEventQueue(pub RenderEvents);

/// Animations advanced once per frame
#[derive(Resource, Default, Deref, DerefMut)]
pub struct Tweens(pub TweenGroup);

/// Frame statistics shown by the overlay; absent when stats are disabled
#[derive(Resource, Debug, Default, Deref, DerefMut)]
pub struct FrameStatsOverlay(pub FrameStats);

/// Register per-frame callbacks on an [`App`]
pub trait RenderEventsAppExt {
    /// Run `callback` every frame. Registering the same logic twice runs it twice.
    fn register_render_event<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut() + Send + Sync + 'static;
}

impl RenderEventsAppExt for App {
    fn register_render_event<F>(&mut self, callback: F) -> &mut Self
    where
        F: FnMut() + Send + Sync + 'static,
    {
        self.world_mut()
            .get_resource_or_init::<RenderEventQueue>()
            .register(callback);
        self
    }
}

pub fn render_loop_running(render_loop: Res<RenderLoop>) -> bool {
    render_loop.handle.is_running()
}

pub fn render_loop_stopped(render_loop: Res<RenderLoop>) -> bool {
    !render_loop.handle.is_running()
}

pub struct FramePlugin;

impl Plugin for FramePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<RenderLoop>()
            .init_resource::<RenderEventQueue>()
            .init_resource::<Tweens>()
            .configure_sets(
                Update,
                (
                    FrameSet::Resize,
                    FrameSet::Assets,
                    FrameSet::Stats,
                    FrameSet::Input,
                    FrameSet::Controls,
                    FrameSet::Compass,
                    FrameSet::Tweens,
                    FrameSet::RenderEvents,
                )
                    .chain()
                    .run_if(render_loop_running),
            )
            .add_systems(Startup, setup_frame_stats)
            .add_systems(
                Update,
                (
                    handle_resize.in_set(FrameSet::Resize),
                    advance_frame_stats.in_set(FrameSet::Stats),
                    advance_tweens.in_set(FrameSet::Tweens),
                    run_render_events.in_set(FrameSet::RenderEvents),
                    teardown.run_if(render_loop_stopped),
                ),
            );
    }
}

fn setup_frame_stats(mut commands: Commands, settings: Option<Res<ViewerSettings>>) {
    let enabled = settings.map(|s| s.stats.enabled).unwrap_or(true);
    if enabled {
        commands.insert_resource(FrameStatsOverlay::default());
    }
}

fn advance_frame_stats(stats: Option<ResMut<FrameStatsOverlay>>, time: Res<Time<Real>>) {
    if let Some(mut stats) = stats {
        stats.tick(time.elapsed());
    }
}

fn advance_tweens(mut tweens: ResMut<Tweens>, time: Res<Time>) {
    tweens.update(time.delta());
}

fn run_render_events(mut events: ResMut<RenderEventQueue>) {
    events.run_all();
}

/// Keep the camera aspect ratio in step with the canvas and redraw
fn handle_resize(
    mut resized: MessageReader<WindowResized>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
    mut redraw: MessageWriter<RequestRedraw>,
) {
    let Some(size) = resized.read().last() else {
        return;
    };
    if size.width <= 0.0 || size.height <= 0.0 {
        return;
    }

    for mut projection in &mut cameras {
        if let Projection::Perspective(perspective) = &mut *projection {
            perspective.aspect_ratio = size.width / size.height;
        }
    }
    tracing::debug!(width = size.width, height = size.height, "Canvas resized");
    redraw.write(RequestRedraw);
}

/// Release everything the viewer spawned once the loop has been stopped
fn teardown(
    mut commands: Commands,
    owned: Query<Entity, Or<(With<MainCamera>, With<SunLight>, With<Building>, With<GroundPlane>)>>,
    mut events: ResMut<RenderEventQueue>,
    mut tweens: ResMut<Tweens>,
    mut exit: MessageWriter<AppExit>,
    mut done: Local<bool>,
) {
    if *done {
        return;
    }
    *done = true;

    let mut released = 0;
    for entity in &owned {
        commands.entity(entity).despawn();
        released += 1;
    }
    events.clear();
    tweens.clear();
    commands.remove_resource::<FrameStatsOverlay>();

    tracing::info!(entities = released, "Render loop stopped, scene released");
    exit.write(AppExit::Success);
}
