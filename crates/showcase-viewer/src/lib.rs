//! Showcase Viewer - Bevy frontend for the product showcase
//!
//! Renders the scene composed by `showcase-core` in a native window: camera,
//! environment map and light rig, the glTF model once it has loaded, orbit
//! controls and an egui error boundary.

mod app;
mod camera;
mod models;
mod scene;
mod ui;

pub use app::{run, ShowcaseHost, ShowcaseSettings};
