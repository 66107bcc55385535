//! Camera, environment map and light rig

use bevy::prelude::*;
use showcase_core::config::{CameraConfig, PointLightConfig, SpotLightConfig};
use showcase_core::{compose, EnvironmentPreset, LightSource, SceneNode};

use crate::app::ShowcaseSettings;

/// Lumens for a light intensity of 1.0
const LUMENS_PER_UNIT: f32 = 100_000.0 / std::f32::consts::PI;
/// Ambient brightness for an intensity of 1.0
const AMBIENT_BRIGHTNESS_PER_UNIT: f32 = 400.0;
/// Environment map intensity
const ENVIRONMENT_INTENSITY: f32 = 900.0;
/// Range used when a light has no distance falloff
const UNBOUNDED_RANGE: f32 = 1_000.0;
/// Range used for lights that decay with distance
const FALLOFF_RANGE: f32 = 50.0;

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_scene);
    }
}

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Spawn everything in the frame that exists before the model resolves
fn setup_scene(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<ShowcaseSettings>,
) {
    let frame = compose(&settings.0, None);
    let environment = frame.environments().next();

    for node in frame.nodes() {
        match node {
            SceneNode::Camera(camera) => {
                spawn_camera(&mut commands, &asset_server, camera, environment);
            }
            SceneNode::Light(light) => spawn_light(&mut commands, light),
            // Environment rides on the camera; the model, its placeholder and
            // the controls belong to their own plugins
            SceneNode::Environment(_)
            | SceneNode::Controls(_)
            | SceneNode::Model(_)
            | SceneNode::Placeholder(_) => {}
        }
    }
}

fn spawn_camera(
    commands: &mut Commands,
    asset_server: &AssetServer,
    camera: &CameraConfig,
    environment: Option<EnvironmentPreset>,
) {
    let mut entity = commands.spawn((
        Camera3d::default(),
        Projection::Perspective(PerspectiveProjection {
            fov: camera.fov.to_radians(),
            ..default()
        }),
        Transform::from_translation(Vec3::from_array(camera.position))
            .looking_at(Vec3::ZERO, Vec3::Y),
        MainCamera,
    ));

    if let Some(preset) = environment {
        tracing::info!(preset = %preset, "Using environment preset");
        entity.insert(EnvironmentMapLight {
            diffuse_map: asset_server.load(preset.diffuse_map_path()),
            specular_map: asset_server.load(preset.specular_map_path()),
            intensity: ENVIRONMENT_INTENSITY,
            ..default()
        });
    }
}

fn spawn_light(commands: &mut Commands, light: &LightSource) {
    match light {
        LightSource::Ambient(ambient) => {
            commands.insert_resource(AmbientLight {
                color: Color::WHITE,
                brightness: ambient.intensity * AMBIENT_BRIGHTNESS_PER_UNIT,
                ..default()
            });
        }
        LightSource::Spot(spot) => {
            commands.spawn((
                spot_light(spot),
                Transform::from_translation(Vec3::from_array(spot.position))
                    .looking_at(Vec3::ZERO, Vec3::Y),
            ));
        }
        LightSource::Point(point) => {
            commands.spawn((
                point_light(point),
                Transform::from_translation(Vec3::from_array(point.position)),
            ));
        }
    }
}

fn spot_light(config: &SpotLightConfig) -> SpotLight {
    let penumbra = config.penumbra.clamp(0.0, 1.0);
    SpotLight {
        intensity: config.intensity * LUMENS_PER_UNIT,
        range: light_range(config.decay),
        outer_angle: config.angle,
        inner_angle: config.angle * (1.0 - penumbra),
        shadows_enabled: false,
        ..default()
    }
}

fn point_light(config: &PointLightConfig) -> PointLight {
    PointLight {
        intensity: config.intensity * LUMENS_PER_UNIT,
        range: light_range(config.decay),
        shadows_enabled: false,
        ..default()
    }
}

fn light_range(decay: f32) -> f32 {
    if decay <= 0.0 {
        UNBOUNDED_RANGE
    } else {
        FALLOFF_RANGE
    }
}
