use std::path::PathBuf;

use bop_onepose::config::SceneConfig;
use bop_onepose::pipeline::{export, visualize};
use bop_onepose::types::RotationEncoding;
use clap::{Args, Parser, Subcommand};
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SceneArgs {
    /// scene folder containing bop_data/
    scene_root: Option<PathBuf>,

    /// json config, flags below override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// number of frames in the scene
    #[arg(short = 'n', long)]
    frame_count: Option<usize>,
}

#[derive(Subcommand)]
enum Commands {
    /// Write intrinsics.txt, Frames.txt, ARposes.txt and Box.txt
    Export {
        #[command(flatten)]
        scene: SceneArgs,

        /// how rotations are written into ARposes.txt
        #[arg(short, long, value_enum)]
        rotation_encoding: Option<RotationEncoding>,
    },
    /// Draw the reprojected 3D box onto every rendered frame
    Visualize {
        #[command(flatten)]
        scene: SceneArgs,
    },
}

fn scene_config(args: &SceneArgs) -> Result<SceneConfig, Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => SceneConfig::from_json(path)?,
        None => SceneConfig::default(),
    };
    if let Some(root) = &args.scene_root {
        config.scene_root = root.clone();
    }
    if let Some(n) = args.frame_count {
        config.frame_count = n;
    }
    Ok(config)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let now = Instant::now();

    match cli.command {
        Commands::Export {
            scene,
            rotation_encoding,
        } => {
            let mut config = scene_config(&scene)?;
            if let Some(encoding) = rotation_encoding {
                config.rotation_encoding = encoding;
            }
            let summary = export(&config)?;
            log::info!(
                "export of {} frames into {} took {:.3} sec",
                summary.frame_count,
                summary.output_dir.display(),
                now.elapsed().as_secs_f64()
            );
        }
        Commands::Visualize { scene } => {
            let config = scene_config(&scene)?;
            let summary = visualize(&config)?;
            if !summary.skipped.is_empty() {
                log::warn!("skipped frames: {:?}", summary.skipped);
            }
            log::info!(
                "annotated {} frames in {:.3} sec",
                summary.annotated.len(),
                now.elapsed().as_secs_f64()
            );
        }
    }
    Ok(())
}
