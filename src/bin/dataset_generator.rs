use bop_onepose::trajectory::{CameraTrajectory, OrbitParams, ShakeParams, write_synthetic_scene};
use bop_onepose::types::CameraIntrinsics;
use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a synthetic ground-truth scene around an object at the origin
    Generate {
        /// Scene folder, bop_data/ is created inside
        #[arg(short, long)]
        output: PathBuf,

        /// Trajectory JSON, a plain orbit is used if omitted
        #[arg(short, long)]
        trajectory: Option<PathBuf>,

        /// Frames per height level
        #[arg(short, long, default_value = "20")]
        num_frames: usize,

        /// Number of camera height levels
        #[arg(long, default_value = "1")]
        z_levels: usize,

        /// Add a seeded random shake to the orbit
        #[arg(long)]
        shake_seed: Option<u64>,

        /// Image width, also written to camera.json
        #[arg(long, default_value = "640")]
        width: u32,

        /// Image height
        #[arg(long, default_value = "480")]
        height: u32,

        /// Focal length in pixels
        #[arg(long, default_value = "500.0")]
        focal: f64,

        /// Also write flat grey rgb frames
        #[arg(long)]
        with_frames: bool,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            output,
            trajectory,
            num_frames,
            z_levels,
            shake_seed,
            width,
            height,
            focal,
            with_frames,
        } => {
            let trajectory = match trajectory {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => {
                    let orbit = OrbitParams {
                        frames_per_level: num_frames,
                        z_levels,
                        ..Default::default()
                    };
                    match shake_seed {
                        Some(seed) => CameraTrajectory::ShakyOrbit {
                            orbit,
                            shake: ShakeParams {
                                seed,
                                ..Default::default()
                            },
                        },
                        None => CameraTrajectory::Orbit(orbit),
                    }
                }
            };
            let intrinsics =
                CameraIntrinsics::new(focal, focal, width as f64 / 2.0, height as f64 / 2.0);
            let frames = if with_frames { Some((width, height)) } else { None };
            let scene = write_synthetic_scene(&output, &trajectory, &intrinsics, frames)?;
            log::info!("generated {} frames in {}", scene.len(), output.display());
        }
    }

    Ok(())
}
