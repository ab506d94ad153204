//! Frame statistics overlay using bevy_egui

use bevy::prelude::*;
use bevy_egui::{egui, EguiContexts, EguiPrimaryContextPass};

use crate::frame::FrameStatsOverlay;
use crate::types::ViewerSettings;

pub struct StatsOverlayPlugin;

impl Plugin for StatsOverlayPlugin {
    fn build(&self, app: &mut App) {
        // Runs in EguiPrimaryContextPass for proper input handling (bevy_egui 0.38+)
        app.add_systems(EguiPrimaryContextPass, stats_overlay_system);
    }
}

fn stats_overlay_system(
    mut contexts: EguiContexts,
    stats: Option<Res<FrameStatsOverlay>>,
    settings: Res<ViewerSettings>,
) {
    let Some(stats) = stats else { return };
    let Ok(ctx) = contexts.ctx_mut() else { return };

    egui::Area::new(egui::Id::new("frame_stats"))
        .fixed_pos(egui::pos2(0.0, settings.stats.top))
        .interactable(false)
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(stats.summary())
                    .monospace()
                    .size(12.0)
                    .color(egui::Color32::from_rgb(0, 255, 255))
                    .background_color(egui::Color32::from_rgba_unmultiplied(0, 0, 34, 220)),
            );
        });
}
