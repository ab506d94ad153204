//! Bevy application setup

use bevy::asset::AssetMetaCheck;
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use sunshine_core::{LoopHandle, ViewerConfig};
use sunshine_scene::{CompassIndicator, ViewerPlugin};

/// Build and run the viewer until its loop is stopped or the window closes
pub fn run(config: ViewerConfig, loop_handle: LoopHandle, compass: Option<CompassIndicator>) -> AppExit {
    tracing::info!(
        canvas = %config.canvas,
        model = ?config.model.url,
        scale = config.model.scale,
        "Starting Sunshine viewer v{}",
        env!("CARGO_PKG_VERSION")
    );

    let mut app = App::new();
    app.insert_resource(WinitSettings::default())
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Sunshine".to_string(),
                        canvas: Some(config.canvas.clone()),
                        fit_canvas_to_parent: true,
                        // Keep the browser context menu off the canvas so right drag pans
                        prevent_default_event_handling: true,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    // Model and texture paths are relative to the page
                    file_path: String::new(),
                    // Static hosting does not serve .meta files
                    meta_check: AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // Must be added before EguiPlugin so it can detect picking
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .add_plugins(ViewerPlugin::new(config).with_loop_handle(loop_handle));

    if let Some(compass) = compass {
        app.insert_resource(compass);
    }

    app.run()
}
