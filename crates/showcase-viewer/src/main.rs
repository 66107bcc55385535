//! Showcase - Main entry point
//!
//! Opens the product viewer window, or with `--check` loads the model
//! headlessly and prints what the first interactive frame contains.

use anyhow::Result;
use clap::Parser;
use showcase_core::{
    load_config, save_default_config, AssetLoader, FileSource, FrameGraph, HostShell, HostView,
    LightKind, ShowcaseConfig,
};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "showcase")]
#[command(about = "3D product showcase viewer")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "showcase.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Asset root directory, overrides the configuration
    #[arg(long)]
    assets: Option<String>,

    /// Load the model without opening a window, print a frame summary and exit
    #[arg(long)]
    check: bool,

    /// Write the default configuration to the config path and exit
    #[arg(long)]
    write_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Showcase v{}", env!("CARGO_PKG_VERSION"));

    if args.write_default_config {
        save_default_config(&args.config)?;
        println!("Wrote default configuration to {}", args.config.display());
        return Ok(());
    }

    // Load configuration
    let mut config = load_config(&args.config)?;

    // Override asset root if specified
    if let Some(assets) = args.assets {
        config.assets.root = assets;
    }

    info!(
        model = %config.model.path,
        environment = %config.environment,
        "Configuration loaded"
    );

    if args.check {
        run_check(config)
    } else {
        showcase_viewer::run(config)
    }
}

/// Mount the scene headlessly and wait for the model
fn run_check(config: ShowcaseConfig) -> Result<()> {
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let loader = AssetLoader::new(FileSource::new(&config.assets.root));
        let mut shell = HostShell::new(config, loader);

        match shell.view() {
            HostView::Fallback(message) => {
                println!("{}", message);
            }
            HostView::Scene(scene) => {
                scene.wait_until_settled().await?;
                let frame = scene.frame()?;
                print_summary(&frame);
            }
        }
        Ok::<(), anyhow::Error>(())
    })
}

fn print_summary(frame: &FrameGraph) {
    if let Some(camera) = frame.camera() {
        println!("Camera: fov {}° at {:?}", camera.fov, camera.position);
    }
    println!(
        "Lights: {} ambient, {} spot, {} point",
        frame.count_lights(LightKind::Ambient),
        frame.count_lights(LightKind::Spot),
        frame.count_lights(LightKind::Point)
    );
    for preset in frame.environments() {
        println!("Environment: {}", preset);
    }
    for model in frame.models() {
        let asset = &model.asset;
        println!("Model: {}", asset.source());
        println!(
            "  {} nodes, {} primitives, {} vertices",
            asset.nodes().len(),
            asset.primitive_count(),
            asset.vertex_count()
        );
        if let Some(bounds) = asset.bounds() {
            println!("  Bounds: {:?} .. {:?}", bounds.min, bounds.max);
        }
        println!(
            "  Placed at {:?}, scale {}",
            model.transform.translation, model.transform.scale
        );
    }
}
