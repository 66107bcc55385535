//! glTF model presentation
//!
//! The core viewer scene decides whether the model is presented and where;
//! Bevy's asset server supplies the renderable scene for it. An asset the
//! core rejects is never spawned.

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use showcase_core::{AssetLoadError, HostView, ModelTransform, ViewerScene};

use crate::app::{ShowcaseHost, ShowcaseSettings};

pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, request_model)
            .add_systems(Update, present_model);
    }
}

/// Marker component for the spawned model root
#[derive(Component)]
pub struct ShowcaseModel;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelState {
    Pending,
    Ready,
    Failed(String),
}

/// The one model of the scene
#[derive(Resource)]
pub struct ModelSlot {
    pub path: String,
    pub state: ModelState,
    handle: Handle<Gltf>,
    entity: Option<Entity>,
}

/// What the viewer scene asks of the model this frame
#[derive(Debug, Clone, PartialEq)]
enum ModelUpdate {
    Wait,
    Failed(AssetLoadError),
    Place(ModelTransform),
}

/// Advance the viewer scene one frame
fn next_update(scene: &mut ViewerScene) -> ModelUpdate {
    match scene.frame() {
        Err(e) => ModelUpdate::Failed(e),
        Ok(frame) => match frame.models().next() {
            Some(model) => ModelUpdate::Place(model.transform),
            None => ModelUpdate::Wait,
        },
    }
}

/// Asset server path for a model path, relative to the asset root
fn asset_path(path: &str) -> &str {
    path.trim_start_matches('/')
}

fn to_bevy_transform(transform: &ModelTransform) -> Transform {
    Transform::from_translation(Vec3::from_array(transform.translation))
        .with_rotation(Quat::from_rotation_y(transform.yaw))
        .with_scale(Vec3::splat(transform.scale))
}

fn request_model(
    mut commands: Commands,
    asset_server: Res<AssetServer>,
    settings: Res<ShowcaseSettings>,
) {
    let path = &settings.0.model.path;
    tracing::info!("Loading model: {}", path);

    commands.insert_resource(ModelSlot {
        path: path.clone(),
        state: ModelState::Pending,
        handle: asset_server.load(asset_path(path).to_string()),
        entity: None,
    });
}

/// Spawn the model once both the core and Bevy have it, then keep its
/// transform in step with the viewer scene
fn present_model(
    mut commands: Commands,
    mut host: ResMut<ShowcaseHost>,
    slot: Option<ResMut<ModelSlot>>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    mut model_query: Query<&mut Transform, With<ShowcaseModel>>,
) {
    let Some(mut slot) = slot else { return };
    let HostView::Scene(scene) = host.shell.view() else { return };

    let transform = match next_update(scene) {
        ModelUpdate::Wait => return,
        ModelUpdate::Failed(err) => {
            tracing::error!("Failed to load model {}: {}", slot.path, err);
            slot.state = ModelState::Failed(err.to_string());
            return;
        }
        ModelUpdate::Place(transform) => to_bevy_transform(&transform),
    };

    if let Some(entity) = slot.entity {
        if let Ok(mut current) = model_query.get_mut(entity) {
            *current = transform;
        }
        return;
    }

    match asset_server.get_load_state(slot.handle.id()) {
        Some(LoadState::Loaded) => {
            let Some(gltf) = gltf_assets.get(&slot.handle) else { return };
            let scene_handle = gltf
                .default_scene
                .clone()
                .or_else(|| gltf.scenes.first().cloned());

            match scene_handle {
                Some(scene_handle) => {
                    tracing::info!("Model presented: {}", slot.path);
                    let entity = commands
                        .spawn((SceneRoot(scene_handle), transform, ShowcaseModel))
                        .id();
                    slot.entity = Some(entity);
                    slot.state = ModelState::Ready;
                }
                None => {
                    tracing::error!("Model has no scenes: {}", slot.path);
                    slot.state = ModelState::Failed("asset contains no scenes".to_string());
                }
            }
        }
        Some(LoadState::Failed(err)) => {
            tracing::error!("Renderer failed to load model {}: {}", slot.path, err);
            slot.state = ModelState::Failed(err.to_string());
        }
        _ => {
            // Still loading
        }
    }
}
