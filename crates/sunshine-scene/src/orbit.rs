//! Orbit camera controller
//!
//! The camera sits on a sphere around `target`. Input accumulates into a
//! pending rotation, a dolly scale and a pan offset; `update` applies them
//! to the camera transform. With damping enabled the pending rotation and
//! pan decay by the damping factor each update instead of being consumed at
//! once, so motion continues smoothly after input stops. Y is up.

use bevy::prelude::*;
use std::f32::consts::PI;
use sunshine_core::config::ControlsConfig;

const EPS: f32 = 1e-6;
/// Per-component quaternion tolerance; f32 look-at rebuilds jitter below this
const ROTATION_EPS: f32 = 1e-5;

/// Spherical coordinates around the Y axis.
///
/// `theta` is the azimuth measured from +Z towards +X, `phi` the polar angle
/// from +Y.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }

    /// Keep `phi` off the poles so `look_at` stays well defined
    fn make_safe(&mut self) {
        self.phi = self.phi.clamp(EPS, PI - EPS);
    }
}

/// Orbit controls attached to a camera entity
#[derive(Component, Debug, Clone)]
pub struct OrbitControls {
    pub target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    /// Pending (theta, phi) rotation
    spherical_delta: Vec2,
    scale: f32,
    pan_offset: Vec3,
    last_position: Option<Vec3>,
    last_rotation: Quat,
}

impl Default for OrbitControls {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            spherical_delta: Vec2::ZERO,
            scale: 1.0,
            pan_offset: Vec3::ZERO,
            last_position: None,
            last_rotation: Quat::IDENTITY,
        }
    }
}

impl OrbitControls {
    pub fn from_config(config: &ControlsConfig) -> Self {
        Self {
            enable_damping: config.enable_damping,
            damping_factor: config.damping_factor,
            min_distance: config.min_distance,
            max_distance: config.max_distance,
            max_polar_angle: config.max_polar_angle,
            rotate_speed: config.rotate_speed,
            zoom_speed: config.zoom_speed,
            pan_speed: config.pan_speed,
            ..default()
        }
    }

    /// Rotate around the up axis by `angle` radians
    pub fn rotate_left(&mut self, angle: f32) {
        self.spherical_delta.x -= angle;
    }

    /// Tilt towards the up axis by `angle` radians
    pub fn rotate_up(&mut self, angle: f32) {
        self.spherical_delta.y -= angle;
    }

    /// Move closer; `zoom_scale` below 1 shrinks the orbit radius
    pub fn dolly_in(&mut self, zoom_scale: f32) {
        self.scale *= zoom_scale;
    }

    pub fn dolly_out(&mut self, zoom_scale: f32) {
        self.scale /= zoom_scale;
    }

    /// Per-step dolly factor derived from `zoom_speed`
    pub fn zoom_scale(&self) -> f32 {
        0.95f32.powf(self.zoom_speed)
    }

    /// Shift the target (and camera) by a world-space offset
    pub fn pan(&mut self, offset: Vec3) {
        self.pan_offset += offset;
    }

    /// Whether rotation or pan motion is still pending
    pub fn is_moving(&self) -> bool {
        self.spherical_delta.length_squared() > EPS * EPS
            || self.pan_offset.length_squared() > EPS * EPS
            || (self.scale - 1.0).abs() > EPS
    }

    /// Apply pending input to `transform`. Returns whether the camera moved
    /// noticeably since the previous update.
    pub fn update(&mut self, transform: &mut Transform) -> bool {
        let offset = transform.translation - self.target;
        let mut spherical = Spherical::from_offset(offset);

        if self.enable_damping {
            spherical.theta += self.spherical_delta.x * self.damping_factor;
            spherical.phi += self.spherical_delta.y * self.damping_factor;
        } else {
            spherical.theta += self.spherical_delta.x;
            spherical.phi += self.spherical_delta.y;
        }

        spherical.phi = spherical
            .phi
            .clamp(self.min_polar_angle, self.max_polar_angle);
        spherical.make_safe();

        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        if self.enable_damping {
            self.target += self.pan_offset * self.damping_factor;
        } else {
            self.target += self.pan_offset;
        }

        transform.translation = self.target + spherical.to_offset();
        transform.look_at(self.target, Vec3::Y);

        if self.enable_damping {
            self.spherical_delta *= 1.0 - self.damping_factor;
            self.pan_offset *= 1.0 - self.damping_factor;
        } else {
            self.spherical_delta = Vec2::ZERO;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        let moved = match self.last_position {
            None => true,
            Some(last) => {
                last.distance_squared(transform.translation) > EPS
                    || !self
                        .last_rotation
                        .abs_diff_eq(transform.rotation, ROTATION_EPS)
            }
        };
        if moved {
            self.last_position = Some(transform.translation);
            self.last_rotation = transform.rotation;
        }
        moved
    }
}
