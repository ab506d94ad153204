//! Compass that follows the camera heading

use bevy::prelude::*;
use sunshine_core::ViewerError;

use crate::camera::CameraChanged;
use crate::frame::FrameSet;

/// Something that can display a compass heading, e.g. a DOM element
pub trait CompassSink: Send + Sync + 'static {
    fn apply(&mut self, degrees: f32) -> Result<(), ViewerError>;
}

/// The active compass display, if the host provides one
#[derive(Resource)]
pub struct CompassIndicator(Box<dyn CompassSink>);

impl CompassIndicator {
    pub fn new(sink: impl CompassSink) -> Self {
        Self(Box::new(sink))
    }
}

/// Last heading shown by the compass, in degrees
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq)]
pub struct CompassHeading {
    pub degrees: f32,
}

/// Camera roll around the view axis (XYZ Euler order), in degrees
pub fn compass_degrees(rotation: Quat) -> f32 {
    let (_, _, z) = rotation.to_euler(EulerRot::XYZ);
    z.to_degrees()
}

pub struct CompassPlugin;

impl Plugin for CompassPlugin {
    fn build(&self, app: &mut App) {
        app.add_message::<CameraChanged>()
            .init_resource::<CompassHeading>()
            .add_systems(Update, update_compass.in_set(FrameSet::Compass));
    }
}

fn update_compass(
    mut changes: MessageReader<CameraChanged>,
    mut heading: ResMut<CompassHeading>,
    mut indicator: Option<ResMut<CompassIndicator>>,
    mut failing: Local<bool>,
) {
    let Some(change) = changes.read().last() else {
        return;
    };
    heading.degrees = compass_degrees(change.rotation);

    let Some(indicator) = indicator.as_mut() else {
        return;
    };
    match indicator.0.apply(heading.degrees) {
        Ok(()) => *failing = false,
        Err(err) => {
            // Report once per outage, not once per frame
            if !*failing {
                tracing::error!("Failed to update compass: {}", err);
            }
            *failing = true;
        }
    }
}
