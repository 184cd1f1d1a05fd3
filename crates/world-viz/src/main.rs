//! world-grab: render one frame of a world file to an image

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use world_viz::{ConfigManager, RenderHost, Scheduling, World, WorldConfig, WorldError};

/// Render one frame of a world file to an image
#[derive(Parser, Debug)]
#[command(name = "world-grab", version, about)]
struct Args {
    /// World file (.sdf or .world) to load
    world: PathBuf,

    /// Where to write the captured frame
    #[arg(short, long, default_value = "frame.png")]
    output: PathBuf,

    /// RON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Run the event loop on the calling thread
    #[arg(long)]
    inline: bool,
}

fn grab<H: RenderHost>(world: &World<H>, output: &Path) -> Result<(), WorldError> {
    world.initialize()?;
    world.enable_grabbing()?;
    world.wait();
    let frame = world.grab_frame()?;
    frame.save(output)?;
    tracing::info!(
        "Wrote {}x{} frame to {:?}",
        frame.width(),
        frame.height(),
        output
    );
    world.deinitialize()
}

fn run(args: Args) -> Result<(), WorldError> {
    let mut config = match &args.config {
        Some(path) => ConfigManager::load(path)?.into_config(),
        None => WorldConfig::default(),
    };
    config.world_path = args.world;
    if args.inline {
        config.scheduling = Scheduling::Inline;
    }

    match config.scheduling {
        Scheduling::Inline => grab(&World::new_inline(config)?, &args.output),
        Scheduling::DedicatedThread => grab(&World::new(config)?, &args.output),
    }
}

fn main() -> ExitCode {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "world_viz=info,world_core=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
