//! Showcase Core - Scene composition, asset loading and viewer lifecycle
//!
//! This crate provides the engine-free parts of the Showcase product viewer:
//! - Configuration loaded from `showcase.toml`
//! - glTF asset loading with a path-keyed, shared-fetch cache
//! - Scene composition from configuration and the resolved model
//! - Orbit camera control math
//! - Viewer scene lifecycle and the host shell that mounts it

pub mod asset;
pub mod config;
pub mod controls;
pub mod scene;
pub mod viewer;

pub use asset::{AssetLoadError, AssetLoader, AssetSource, FileSource, LoadState, SceneAsset};
pub use config::{
    load_config, save_default_config, ConfigError, EnvironmentPreset, HeroMode, ShowcaseConfig,
    SuspenseFallback,
};
pub use controls::{OrbitController, OrbitInput};
pub use scene::{compose, FrameGraph, LightKind, LightSource, ModelNode, ModelTransform, SceneNode};
pub use viewer::{AutoRotate, HostShell, HostView, ScenePhase, ViewerScene};
