//! Configuration loading and validation

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// CSS selector of the canvas the renderer draws into
    #[serde(default = "default_canvas")]
    pub canvas: String,
    #[serde(default)]
    pub scene: SceneConfig,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub sun: SunConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub ground: GroundConfig,
    #[serde(default)]
    pub compass: CompassConfig,
    #[serde(default)]
    pub stats: StatsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            canvas: default_canvas(),
            scene: SceneConfig::default(),
            camera: CameraConfig::default(),
            controls: ControlsConfig::default(),
            sun: SunConfig::default(),
            model: ModelConfig::default(),
            ground: GroundConfig::default(),
            compass: CompassConfig::default(),
            stats: StatsConfig::default(),
            log: LogConfig::default(),
        }
    }
}

fn default_canvas() -> String {
    "#sunshine-canvas".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneConfig {
    /// Background colour as `#rrggbb`
    #[serde(default = "default_background")]
    pub background: String,
    #[serde(default = "default_white")]
    pub ambient_color: String,
    #[serde(default = "default_ambient_brightness")]
    pub ambient_brightness: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            background: default_background(),
            ambient_color: default_white(),
            ambient_brightness: default_ambient_brightness(),
        }
    }
}

fn default_background() -> String {
    "#eef5ff".to_string()
}

fn default_white() -> String {
    "#ffffff".to_string()
}

fn default_ambient_brightness() -> f32 {
    500.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            position: default_camera_position(),
        }
    }
}

fn default_fov() -> f32 {
    45.0
}

fn default_near() -> f32 {
    1.0
}

fn default_far() -> f32 {
    3000.0
}

fn default_camera_position() -> [f32; 3] {
    [200.0, 300.0, 300.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_true")]
    pub enable_damping: bool,
    /// Fraction of the remaining motion applied per frame, in (0, 1]
    #[serde(default = "default_damping_factor")]
    pub damping_factor: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Largest angle from the up axis, in radians. Keeps the camera above the ground.
    #[serde(default = "default_max_polar_angle")]
    pub max_polar_angle: f32,
    #[serde(default = "default_speed")]
    pub rotate_speed: f32,
    #[serde(default = "default_speed")]
    pub zoom_speed: f32,
    #[serde(default = "default_speed")]
    pub pan_speed: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_damping: true,
            damping_factor: default_damping_factor(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            max_polar_angle: default_max_polar_angle(),
            rotate_speed: default_speed(),
            zoom_speed: default_speed(),
            pan_speed: default_speed(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_damping_factor() -> f32 {
    0.05
}

fn default_min_distance() -> f32 {
    100.0
}

fn default_max_distance() -> f32 {
    1000.0
}

fn default_max_polar_angle() -> f32 {
    std::f32::consts::FRAC_PI_2 - 0.1
}

fn default_speed() -> f32 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SunConfig {
    #[serde(default = "default_sun_position")]
    pub position: [f32; 3],
    #[serde(default = "default_white")]
    pub color: String,
    /// Illuminance in lux
    #[serde(default = "default_illuminance")]
    pub illuminance: f32,
    #[serde(default = "default_shadow_map_size")]
    pub shadow_map_size: usize,
    #[serde(default = "default_shadow_near")]
    pub shadow_near: f32,
    #[serde(default = "default_shadow_far")]
    pub shadow_far: f32,
}

impl Default for SunConfig {
    fn default() -> Self {
        Self {
            position: default_sun_position(),
            color: default_white(),
            illuminance: default_illuminance(),
            shadow_map_size: default_shadow_map_size(),
            shadow_near: default_shadow_near(),
            shadow_far: default_shadow_far(),
        }
    }
}

fn default_sun_position() -> [f32; 3] {
    [0.0, 100.0, 0.0]
}

fn default_illuminance() -> f32 {
    10_000.0
}

fn default_shadow_map_size() -> usize {
    2048
}

fn default_shadow_near() -> f32 {
    1.0
}

fn default_shadow_far() -> f32 {
    1000.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// glTF/GLB asset to load. Nothing is loaded when unset.
    #[serde(default)]
    pub url: Option<String>,
    /// Uniform scale applied to the loaded hierarchy
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Colour every mesh is tinted with after loading
    #[serde(default = "default_tint")]
    pub tint: String,
    /// Load the model, sun and ground as soon as the viewer starts
    #[serde(default = "default_true")]
    pub load_on_start: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            url: None,
            scale: default_scale(),
            tint: default_tint(),
            load_on_start: true,
        }
    }
}

fn default_scale() -> f32 {
    1.0
}

fn default_tint() -> String {
    "#fffff0".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundConfig {
    /// Map image drawn on the ground plane
    #[serde(default = "default_ground_texture")]
    pub texture: String,
    #[serde(default = "default_ground_size")]
    pub size: [f32; 2],
}

impl Default for GroundConfig {
    fn default() -> Self {
        Self {
            texture: default_ground_texture(),
            size: default_ground_size(),
        }
    }
}

fn default_ground_texture() -> String {
    "bg.png".to_string()
}

fn default_ground_size() -> [f32; 2] {
    [500.0, 500.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompassConfig {
    /// CSS selector of the element rotated to follow the camera
    #[serde(default = "default_compass_selector")]
    pub selector: String,
}

impl Default for CompassConfig {
    fn default() -> Self {
        Self {
            selector: default_compass_selector(),
        }
    }
}

fn default_compass_selector() -> String {
    ".compass>div".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Distance of the overlay from the top of the canvas, in logical pixels
    #[serde(default = "default_stats_top")]
    pub top: f32,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            top: default_stats_top(),
        }
    }
}

fn default_stats_top() -> f32 {
    100.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogConfig {
    /// `tracing` filter directive
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

fn default_log_filter() -> String {
    "info,wgpu=warn,naga=warn".to_string()
}

impl ViewerConfig {
    /// Parse a configuration from TOML text and validate it
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ViewerConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `key=value` overrides, e.g. from the page URL query string.
    ///
    /// Recognised keys are `model` (model URL) and `scale` (model scale).
    /// Other keys are ignored so pages can carry their own parameters.
    pub fn apply_query_pairs<I, K, V>(&mut self, pairs: I) -> Result<(), ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in pairs {
            let value = value.as_ref();
            match key.as_ref() {
                "model" => {
                    if value.trim().is_empty() {
                        return Err(ConfigError::invalid("model", value));
                    }
                    self.model.url = Some(value.to_string());
                }
                "scale" => {
                    let scale: f32 = value
                        .parse()
                        .map_err(|_| ConfigError::invalid("scale", value))?;
                    self.model.scale = scale;
                }
                other => {
                    tracing::debug!(key = other, "Ignoring unknown query parameter");
                }
            }
        }
        self.validate()
    }

    /// Check value ranges that the scene relies on
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.model.scale.is_finite() && self.model.scale > 0.0) {
            return Err(ConfigError::invalid("model.scale", self.model.scale));
        }
        if !(self.camera.near > 0.0 && self.camera.near < self.camera.far) {
            return Err(ConfigError::invalid(
                "camera.near",
                format!("{} (far = {})", self.camera.near, self.camera.far),
            ));
        }
        if !(self.camera.fov_degrees > 0.0 && self.camera.fov_degrees < 180.0) {
            return Err(ConfigError::invalid("camera.fov_degrees", self.camera.fov_degrees));
        }
        let controls = &self.controls;
        if !(controls.damping_factor > 0.0 && controls.damping_factor <= 1.0) {
            return Err(ConfigError::invalid("controls.damping_factor", controls.damping_factor));
        }
        if !(controls.min_distance >= 0.0 && controls.min_distance <= controls.max_distance) {
            return Err(ConfigError::invalid(
                "controls.min_distance",
                format!("{} (max = {})", controls.min_distance, controls.max_distance),
            ));
        }
        if !(controls.max_polar_angle > 0.0 && controls.max_polar_angle <= std::f32::consts::PI) {
            return Err(ConfigError::invalid("controls.max_polar_angle", controls.max_polar_angle));
        }
        if !(self.sun.shadow_near >= 0.0 && self.sun.shadow_near < self.sun.shadow_far) {
            return Err(ConfigError::invalid(
                "sun.shadow_near",
                format!("{} (far = {})", self.sun.shadow_near, self.sun.shadow_far),
            ));
        }
        if self.ground.size.iter().any(|s| *s <= 0.0) {
            return Err(ConfigError::invalid("ground.size", format!("{:?}", self.ground.size)));
        }
        for (key, color) in [
            ("scene.background", &self.scene.background),
            ("scene.ambient_color", &self.scene.ambient_color),
            ("sun.color", &self.sun.color),
            ("model.tint", &self.model.tint),
        ] {
            if parse_hex_color(color).is_none() {
                return Err(ConfigError::invalid(key, color));
            }
        }
        Ok(())
    }
}

/// Parse `#rrggbb` (leading `#` optional) into 8-bit sRGB components
pub fn parse_hex_color(s: &str) -> Option<[u8; 3]> {
    let hex = s.trim().trim_start_matches('#');
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some([channel(0)?, channel(2)?, channel(4)?])
}

/// Load configuration from file, falling back to defaults when it does not exist
pub fn load_config(path: &Path) -> Result<ViewerConfig, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        ViewerConfig::from_toml_str(&content)
    } else {
        Ok(ViewerConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.model.scale, 1.0);
        assert!(config.model.url.is_none());
        assert_eq!(config.controls.damping_factor, 0.05);
        assert_eq!(config.compass.selector, ".compass>div");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ViewerConfig::from_toml_str(
            r#"
[model]
url = "models/building.glb"
scale = 2.5

[controls]
min_distance = 50.0
"#,
        )
        .unwrap();

        assert_eq!(config.model.url.as_deref(), Some("models/building.glb"));
        assert_eq!(config.model.scale, 2.5);
        assert_eq!(config.model.tint, "#fffff0");
        assert_eq!(config.controls.min_distance, 50.0);
        assert_eq!(config.controls.max_distance, 1000.0);
        assert_eq!(config.camera, CameraConfig::default());
    }

    #[test]
    fn test_rejects_non_positive_scale() {
        let err = ViewerConfig::from_toml_str("[model]\nscale = 0.0\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "model.scale"));
    }

    #[test]
    fn test_rejects_bad_colour() {
        let err = ViewerConfig::from_toml_str("[scene]\nbackground = \"blue\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "scene.background"));
    }

    #[test]
    fn test_query_overrides() {
        let mut config = ViewerConfig::default();
        config
            .apply_query_pairs([("model", "https://example.com/a.glb"), ("scale", "3"), ("lang", "zh")])
            .unwrap();
        assert_eq!(config.model.url.as_deref(), Some("https://example.com/a.glb"));
        assert_eq!(config.model.scale, 3.0);

        assert!(config.apply_query_pairs([("scale", "abc")]).is_err());
        assert!(config.apply_query_pairs([("scale", "-1")]).is_err());
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#eef5ff"), Some([0xee, 0xf5, 0xff]));
        assert_eq!(parse_hex_color("fffff0"), Some([0xff, 0xff, 0xf0]));
        assert_eq!(parse_hex_color("#fff"), None);
        assert_eq!(parse_hex_color("#gg0000"), None);
    }

    #[test]
    fn test_load_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sunshine.toml");

        // Missing file falls back to defaults
        assert_eq!(load_config(&path).unwrap(), ViewerConfig::default());

        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "canvas = \"#main\"\n[stats]\nenabled = false").unwrap();
        drop(file);

        let config = load_config(&path).unwrap();
        assert_eq!(config.canvas, "#main");
        assert!(!config.stats.enabled);
    }
}
