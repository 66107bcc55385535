//! Bevy application setup

use anyhow::Result;
use bevy::prelude::*;
use bevy::winit::WinitSettings;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use showcase_core::{AssetLoader, FileSource, HeroMode, HostShell, ShowcaseConfig};
use tokio::runtime::Runtime;
use tracing::info;

use crate::camera::CameraPlugin;
use crate::models::ModelsPlugin;
use crate::scene::ScenePlugin;
use crate::ui::{FallbackPlugin, UiPlugin};

/// Configuration the app was started with
#[derive(Debug, Clone, Resource)]
pub struct ShowcaseSettings(pub ShowcaseConfig);

/// The host shell and the runtime its model load runs on
#[derive(Resource)]
pub struct ShowcaseHost {
    pub shell: HostShell,
    // Dropped after the shell so an in-flight load is aborted first
    _runtime: Runtime,
}

impl ShowcaseHost {
    fn new(config: ShowcaseConfig) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("showcase-loader")
            .enable_all()
            .build()?;
        let loader = AssetLoader::new(FileSource::new(&config.assets.root));
        let shell = {
            let _guard = runtime.enter();
            HostShell::new(config, loader)
        };
        Ok(Self {
            shell,
            _runtime: runtime,
        })
    }
}

/// Build and run the viewer. Blocks until the window closes.
pub fn run(config: ShowcaseConfig) -> Result<()> {
    let host = ShowcaseHost::new(config.clone())?;
    let hero = host.shell.mode();
    info!(hero = ?hero, assets = %config.assets.root, "Starting viewer");

    let mut app = App::new();
    app.insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15))) // Dark blue-gray background
        // Continuous rendering so damping and auto-rotation keep advancing
        .insert_resource(WinitSettings::default())
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Showcase".to_string(),
                        fit_canvas_to_parent: true,
                        prevent_default_event_handling: false,
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    file_path: config.assets.root.clone(),
                    // Asset directory carries no .meta files
                    meta_check: bevy::asset::AssetMetaCheck::Never,
                    ..default()
                }),
        )
        // bevy_egui looks for the picking crate's PickingPlugin, add it first
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .insert_resource(ShowcaseSettings(config))
        .insert_resource(host);

    match hero {
        HeroMode::Enabled => {
            app.add_plugins(ScenePlugin)
                .add_plugins(CameraPlugin)
                .add_plugins(ModelsPlugin)
                .add_plugins(UiPlugin);
        }
        HeroMode::Disabled => {
            app.add_plugins(FallbackPlugin);
        }
    }

    app.run();
    Ok(())
}
