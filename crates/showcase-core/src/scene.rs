//! Scene composition - camera, lights, environment, controls and the model
//!
//! [`compose`] is a pure function of the configuration and the model
//! resolved so far. The model sits behind a suspension boundary: until it is
//! resolved the boundary presents its fallback, which is empty by default.

use std::sync::Arc;

use crate::asset::SceneAsset;
use crate::config::{
    AmbientLightConfig, CameraConfig, ControlsConfig, EnvironmentPreset, LightsConfig,
    ModelPlacement, PointLightConfig, ShowcaseConfig, SpotLightConfig, SuspenseFallback,
};

/// Light source variants
#[derive(Debug, Clone, PartialEq)]
pub enum LightSource {
    Ambient(AmbientLightConfig),
    Spot(SpotLightConfig),
    Point(PointLightConfig),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightKind {
    Ambient,
    Spot,
    Point,
}

impl LightSource {
    pub fn kind(&self) -> LightKind {
        match self {
            Self::Ambient(_) => LightKind::Ambient,
            Self::Spot(_) => LightKind::Spot,
            Self::Point(_) => LightKind::Point,
        }
    }

    pub fn intensity(&self) -> f32 {
        match self {
            Self::Ambient(l) => l.intensity,
            Self::Spot(l) => l.intensity,
            Self::Point(l) => l.intensity,
        }
    }

    /// World position, `None` for ambient light
    pub fn position(&self) -> Option<[f32; 3]> {
        match self {
            Self::Ambient(_) => None,
            Self::Spot(l) => Some(l.position),
            Self::Point(l) => Some(l.position),
        }
    }
}

impl LightsConfig {
    /// The fixed light rig: one ambient, one spot, one point
    pub fn sources(&self) -> [LightSource; 3] {
        [
            LightSource::Ambient(self.ambient.clone()),
            LightSource::Spot(self.spot.clone()),
            LightSource::Point(self.point.clone()),
        ]
    }
}

/// Model transform, written by exactly one owner at a time
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelTransform {
    pub translation: [f32; 3],
    pub scale: f32,
    /// Rotation about the vertical axis in radians
    pub yaw: f32,
}

impl ModelTransform {
    pub fn from_placement(placement: &ModelPlacement) -> Self {
        Self {
            translation: placement.position,
            scale: placement.scale,
            yaw: 0.0,
        }
    }
}

/// A loaded asset placed in the scene
#[derive(Debug, Clone)]
pub struct ModelNode {
    pub asset: Arc<SceneAsset>,
    pub transform: ModelTransform,
}

#[derive(Debug, Clone)]
pub enum SceneNode {
    Camera(CameraConfig),
    Light(LightSource),
    Environment(EnvironmentPreset),
    Controls(ControlsConfig),
    Model(ModelNode),
    /// Text presented by the suspension boundary while the model loads
    Placeholder(String),
}

/// Everything presented in one frame
#[derive(Debug, Clone, Default)]
pub struct FrameGraph {
    nodes: Vec<SceneNode>,
}

impl FrameGraph {
    pub fn nodes(&self) -> &[SceneNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn camera(&self) -> Option<&CameraConfig> {
        self.nodes.iter().find_map(|n| match n {
            SceneNode::Camera(c) => Some(c),
            _ => None,
        })
    }

    pub fn lights(&self) -> impl Iterator<Item = &LightSource> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Light(l) => Some(l),
            _ => None,
        })
    }

    pub fn count_lights(&self, kind: LightKind) -> usize {
        self.lights().filter(|l| l.kind() == kind).count()
    }

    pub fn environments(&self) -> impl Iterator<Item = EnvironmentPreset> + '_ {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Environment(e) => Some(*e),
            _ => None,
        })
    }

    pub fn controls(&self) -> Option<&ControlsConfig> {
        self.nodes.iter().find_map(|n| match n {
            SceneNode::Controls(c) => Some(c),
            _ => None,
        })
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelNode> {
        self.nodes.iter().filter_map(|n| match n {
            SceneNode::Model(m) => Some(m),
            _ => None,
        })
    }

    pub fn placeholder(&self) -> Option<&str> {
        self.nodes.iter().find_map(|n| match n {
            SceneNode::Placeholder(text) => Some(text.as_str()),
            _ => None,
        })
    }
}

/// Compose the frame graph for `config`, with `model` once it has resolved
pub fn compose(config: &ShowcaseConfig, model: Option<&ModelNode>) -> FrameGraph {
    let mut nodes = vec![SceneNode::Camera(config.camera.clone())];
    nodes.extend(config.lights.sources().into_iter().map(SceneNode::Light));

    match model {
        Some(model) => nodes.push(SceneNode::Model(model.clone())),
        None => {
            if let SuspenseFallback::Text(text) = &config.model.fallback {
                nodes.push(SceneNode::Placeholder(text.clone()));
            }
        }
    }

    nodes.push(SceneNode::Controls(config.controls.clone()));
    nodes.push(SceneNode::Environment(config.environment));

    FrameGraph { nodes }
}
