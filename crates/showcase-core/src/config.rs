//! Configuration loading and defaults

use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ShowcaseConfig {
    #[serde(default)]
    pub environment: EnvironmentPreset,
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub assets: AssetsConfig,
    #[serde(default)]
    pub model: ModelPlacement,
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lights: LightsConfig,
    #[serde(default)]
    pub controls: ControlsConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
}

/// Whether the host mounts the 3D scene or a plain-text fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeroMode {
    #[default]
    Enabled,
    Disabled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostConfig {
    #[serde(default)]
    pub hero: HeroMode,
    /// Text shown instead of the scene when the hero is disabled
    #[serde(default = "default_fallback_message")]
    pub fallback_message: String,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            hero: HeroMode::default(),
            fallback_message: default_fallback_message(),
        }
    }
}

fn default_fallback_message() -> String {
    "3D Hero Disabled - Please enable in showcase.toml".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetsConfig {
    /// Directory the model and environment map paths are resolved against
    #[serde(default = "default_asset_root")]
    pub root: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            root: default_asset_root(),
        }
    }
}

fn default_asset_root() -> String {
    "assets".to_string()
}

/// What the suspension boundary presents while the model is loading
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SuspenseFallback {
    /// Present nothing
    #[default]
    Empty,
    /// Present a short text placeholder
    Text(String),
}

/// Model asset path and its calibration constants.
///
/// Scale and offset compensate for the asset's authored size and origin;
/// they are specific to one asset and are never derived from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelPlacement {
    /// Exact asset path, case and whitespace sensitive
    #[serde(default = "default_model_path")]
    pub path: String,
    #[serde(default = "default_model_scale")]
    pub scale: f32,
    #[serde(default = "default_model_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub fallback: SuspenseFallback,
}

impl Default for ModelPlacement {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            scale: default_model_scale(),
            position: default_model_position(),
            fallback: SuspenseFallback::default(),
        }
    }
}

fn default_model_path() -> String {
    "models/iPhone 15 Pro Max.glb".to_string()
}

fn default_model_scale() -> f32 {
    0.1
}

fn default_model_position() -> [f32; 3] {
    [0.0, -1.5, 0.0]
}

/// Perspective camera, fixed for the session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov: default_fov(),
            position: default_camera_position(),
        }
    }
}

fn default_fov() -> f32 {
    75.0
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 5.0]
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AmbientLightConfig {
    #[serde(default = "default_ambient_intensity")]
    pub intensity: f32,
}

impl Default for AmbientLightConfig {
    fn default() -> Self {
        Self {
            intensity: default_ambient_intensity(),
        }
    }
}

fn default_ambient_intensity() -> f32 {
    0.5
}

/// Spot light aimed at the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpotLightConfig {
    #[serde(default = "default_spot_position")]
    pub position: [f32; 3],
    /// Cone half-angle in radians
    #[serde(default = "default_spot_angle")]
    pub angle: f32,
    /// Fraction of the cone that is attenuated, 0..=1
    #[serde(default = "default_penumbra")]
    pub penumbra: f32,
    /// Distance falloff exponent, 0 disables falloff
    #[serde(default)]
    pub decay: f32,
    #[serde(default = "default_light_intensity")]
    pub intensity: f32,
}

impl Default for SpotLightConfig {
    fn default() -> Self {
        Self {
            position: default_spot_position(),
            angle: default_spot_angle(),
            penumbra: default_penumbra(),
            decay: 0.0,
            intensity: default_light_intensity(),
        }
    }
}

fn default_spot_position() -> [f32; 3] {
    [10.0, 10.0, 10.0]
}

fn default_spot_angle() -> f32 {
    0.15
}

fn default_penumbra() -> f32 {
    1.0
}

fn default_light_intensity() -> f32 {
    PI
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointLightConfig {
    #[serde(default = "default_point_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub decay: f32,
    #[serde(default = "default_light_intensity")]
    pub intensity: f32,
}

impl Default for PointLightConfig {
    fn default() -> Self {
        Self {
            position: default_point_position(),
            decay: 0.0,
            intensity: default_light_intensity(),
        }
    }
}

fn default_point_position() -> [f32; 3] {
    [-10.0, -10.0, -10.0]
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LightsConfig {
    #[serde(default)]
    pub ambient: AmbientLightConfig,
    #[serde(default)]
    pub spot: SpotLightConfig,
    #[serde(default)]
    pub point: PointLightConfig,
}

/// Named prefiltered lighting/reflection backdrop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnvironmentPreset {
    Apartment,
    #[default]
    City,
    Dawn,
    Forest,
    Lobby,
    Night,
    Park,
    Studio,
    Sunset,
    Warehouse,
}

impl EnvironmentPreset {
    pub const ALL: [EnvironmentPreset; 10] = [
        Self::Apartment,
        Self::City,
        Self::Dawn,
        Self::Forest,
        Self::Lobby,
        Self::Night,
        Self::Park,
        Self::Studio,
        Self::Sunset,
        Self::Warehouse,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::City => "city",
            Self::Dawn => "dawn",
            Self::Forest => "forest",
            Self::Lobby => "lobby",
            Self::Night => "night",
            Self::Park => "park",
            Self::Studio => "studio",
            Self::Sunset => "sunset",
            Self::Warehouse => "warehouse",
        }
    }

    /// Diffuse irradiance cubemap, relative to the asset root
    pub fn diffuse_map_path(&self) -> String {
        format!("environment_maps/{}_diffuse.ktx2", self.as_str())
    }

    /// Specular radiance cubemap, relative to the asset root
    pub fn specular_map_path(&self) -> String {
        format!("environment_maps/{}_specular.ktx2", self.as_str())
    }
}

impl fmt::Display for EnvironmentPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orbit camera controls: three independent capabilities plus tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlsConfig {
    #[serde(default = "default_true")]
    pub enable_pan: bool,
    #[serde(default = "default_true")]
    pub enable_zoom: bool,
    #[serde(default = "default_true")]
    pub enable_rotate: bool,
    /// Radians per pixel of drag
    #[serde(default = "default_rotate_speed")]
    pub rotate_speed: f32,
    /// Fractional distance change per scroll line
    #[serde(default = "default_zoom_speed")]
    pub zoom_speed: f32,
    /// World units per pixel of drag, per unit of camera distance
    #[serde(default = "default_pan_speed")]
    pub pan_speed: f32,
    #[serde(default = "default_min_distance")]
    pub min_distance: f32,
    #[serde(default = "default_max_distance")]
    pub max_distance: f32,
    /// Smoothing factor, 0 applies input immediately
    #[serde(default = "default_damping")]
    pub damping: f32,
}

impl Default for ControlsConfig {
    fn default() -> Self {
        Self {
            enable_pan: true,
            enable_zoom: true,
            enable_rotate: true,
            rotate_speed: default_rotate_speed(),
            zoom_speed: default_zoom_speed(),
            pan_speed: default_pan_speed(),
            min_distance: default_min_distance(),
            max_distance: default_max_distance(),
            damping: default_damping(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_rotate_speed() -> f32 {
    0.005
}

fn default_zoom_speed() -> f32 {
    0.1
}

fn default_pan_speed() -> f32 {
    0.002
}

fn default_min_distance() -> f32 {
    0.5
}

fn default_max_distance() -> f32 {
    50.0
}

fn default_damping() -> f32 {
    0.15
}

/// Optional continuous spin of the model, off by default
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationConfig {
    #[serde(default)]
    pub auto_rotate: bool,
    #[serde(default = "default_radians_per_frame")]
    pub radians_per_frame: f32,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            auto_rotate: false,
            radians_per_frame: default_radians_per_frame(),
        }
    }
}

fn default_radians_per_frame() -> f32 {
    0.005
}

/// Load configuration from file, falling back to defaults when it is missing
pub fn load_config(path: &Path) -> Result<ShowcaseConfig, ConfigError> {
    if path.exists() {
        let content = std::fs::read_to_string(path)?;
        let config: ShowcaseConfig = toml::from_str(&content)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    } else {
        info!(
            path = %path.display(),
            "Configuration file not found, using defaults"
        );
        Ok(ShowcaseConfig::default())
    }
}

/// Save default configuration to file
pub fn save_default_config(path: &Path) -> Result<(), ConfigError> {
    let content = toml::to_string_pretty(&ShowcaseConfig::default())?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = ShowcaseConfig::default();

        assert_eq!(config.host.hero, HeroMode::Enabled);
        assert_eq!(config.model.scale, 0.1);
        assert_eq!(config.model.position, [0.0, -1.5, 0.0]);
        assert_eq!(config.model.fallback, SuspenseFallback::Empty);
        assert_eq!(config.camera.fov, 75.0);
        assert_eq!(config.camera.position, [0.0, 0.0, 5.0]);
        assert_eq!(config.lights.ambient.intensity, 0.5);
        assert_eq!(config.lights.spot.position, [10.0, 10.0, 10.0]);
        assert_eq!(config.lights.spot.angle, 0.15);
        assert_eq!(config.lights.spot.penumbra, 1.0);
        assert_eq!(config.lights.spot.decay, 0.0);
        assert_eq!(config.lights.spot.intensity, PI);
        assert_eq!(config.lights.point.position, [-10.0, -10.0, -10.0]);
        assert_eq!(config.lights.point.intensity, PI);
        assert_eq!(config.environment, EnvironmentPreset::City);
        assert!(config.controls.enable_pan);
        assert!(config.controls.enable_zoom);
        assert!(config.controls.enable_rotate);
        assert!(!config.animation.auto_rotate);
        assert_eq!(config.animation.radians_per_frame, 0.005);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: ShowcaseConfig = toml::from_str(
            r#"
            environment = "sunset"

            [host]
            hero = "disabled"

            [model]
            path = "/models/Other Phone.glb"
            scale = 2.5

            [controls]
            enable_zoom = false

            [animation]
            auto_rotate = true
            "#,
        )
        .unwrap();

        assert_eq!(config.environment, EnvironmentPreset::Sunset);
        assert_eq!(config.host.hero, HeroMode::Disabled);
        assert_eq!(config.host.fallback_message, default_fallback_message());
        assert_eq!(config.model.path, "/models/Other Phone.glb");
        assert_eq!(config.model.scale, 2.5);
        assert_eq!(config.model.position, [0.0, -1.5, 0.0]);
        assert!(!config.controls.enable_zoom);
        assert!(config.controls.enable_pan);
        assert!(config.animation.auto_rotate);
        assert_eq!(config.animation.radians_per_frame, 0.005);
        assert_eq!(config.lights, LightsConfig::default());
    }

    #[test]
    fn test_text_fallback() {
        let config: ShowcaseConfig = toml::from_str(
            r#"
            [model.fallback]
            text = "Loading..."
            "#,
        )
        .unwrap();

        assert_eq!(
            config.model.fallback,
            SuspenseFallback::Text("Loading...".to_string())
        );
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let result: Result<ShowcaseConfig, _> = toml::from_str(r#"environment = "moon""#);
        assert!(result.is_err());
    }

    #[test]
    fn test_preset_map_paths() {
        assert_eq!(
            EnvironmentPreset::City.diffuse_map_path(),
            "environment_maps/city_diffuse.ktx2"
        );
        assert_eq!(
            EnvironmentPreset::Warehouse.specular_map_path(),
            "environment_maps/warehouse_specular.ktx2"
        );
        assert_eq!(EnvironmentPreset::ALL.len(), 10);
    }

    #[test]
    fn test_load_missing_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = load_config(&temp_dir.path().join("showcase.toml")).unwrap();
        assert_eq!(config, ShowcaseConfig::default());
    }

    #[test]
    fn test_save_and_reload_default() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("conf").join("showcase.toml");

        save_default_config(&path).unwrap();
        let config = load_config(&path).unwrap();

        assert_eq!(config, ShowcaseConfig::default());
    }
}
