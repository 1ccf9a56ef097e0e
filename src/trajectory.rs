//! Camera trajectories for synthetic scenes.
//!
//! Poses are camera-to-world in the scene-camera convention: x right, y up,
//! looking down -z, with world z up.

use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use nalgebra as na;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::config::SceneConfig;
use crate::data_loader::{write_camera_json, write_ground_truth};
use crate::error::{PoseError, Result};
use crate::transform::{RigidTransform, object_to_camera};
use crate::types::{CameraIntrinsics, FrameRecord, SceneGroundTruth};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitParams {
    pub radius_x: f64,
    pub radius_y: f64,
    pub z_min: f64,
    pub z_max: f64,
    /// Number of camera heights sampled between `z_min` and `z_max`.
    pub z_levels: usize,
    pub frames_per_level: usize,
    pub look_at: [f64; 3],
}

impl Default for OrbitParams {
    fn default() -> Self {
        Self {
            radius_x: 1.0,
            radius_y: 1.0,
            z_min: -0.5,
            z_max: 1.5,
            z_levels: 1,
            frames_per_level: 100,
            look_at: [0.0, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShakeParams {
    pub seed: u64,
    /// Bound of the rotational shake, radians.
    pub max_angle: f64,
    pub angle_step: f64,
    /// Bound of the point-of-interest drift per axis, meters.
    pub max_drift: f64,
    pub drift_step: f64,
}

impl Default for ShakeParams {
    fn default() -> Self {
        Self {
            seed: 0,
            max_angle: PI / 12.0,
            angle_step: PI / 64.0,
            max_drift: 0.003,
            drift_step: 0.0005,
        }
    }
}

/// How the camera moves through a synthetic scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraTrajectory {
    /// Cameras on an ellipse around the point of interest, one ring per
    /// height level.
    Orbit(OrbitParams),
    /// The orbit with a seeded random-walk shake of the viewing direction.
    ShakyOrbit {
        orbit: OrbitParams,
        shake: ShakeParams,
    },
}

impl Default for CameraTrajectory {
    fn default() -> Self {
        CameraTrajectory::Orbit(OrbitParams::default())
    }
}

/// Camera-to-world rotation of a camera at `eye` looking at `target`.
pub fn look_at_rotation(
    eye: &na::Vector3<f64>,
    target: &na::Vector3<f64>,
) -> Result<na::Matrix3<f64>> {
    let forward = target - eye;
    let up = na::Vector3::z();
    let right = forward.cross(&up);
    if forward.norm() < 1e-9 || right.norm() < 1e-9 {
        return Err(PoseError::Validation(format!(
            "cannot orient a camera at {:?} towards {:?}",
            eye.as_slice(),
            target.as_slice()
        )));
    }
    let forward = forward.normalize();
    let right = right.normalize();
    let cam_up = right.cross(&forward);
    Ok(na::Matrix3::from_columns(&[right, cam_up, -forward]))
}

fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => (0..n)
            .map(|i| start + (end - start) * i as f64 / (n - 1) as f64)
            .collect(),
    }
}

fn orbit_eyes(orbit: &OrbitParams) -> Vec<na::Vector3<f64>> {
    let n = orbit.frames_per_level;
    linspace(orbit.z_min, orbit.z_max, orbit.z_levels)
        .into_iter()
        .flat_map(|z| {
            (0..n).map(move |i| {
                let phi = i as f64 / n as f64 * 2.0 * PI;
                na::Vector3::new(orbit.radius_x * phi.sin(), orbit.radius_y * phi.cos(), z)
            })
        })
        .collect()
}

fn bounded_step(rng: &mut ChaCha8Rng, value: f64, step: f64, bound: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    (value + rng.random_range(-step..=step)).clamp(-bound, bound)
}

fn random_unit(rng: &mut ChaCha8Rng) -> na::Vector3<f64> {
    loop {
        let v: na::Vector3<f64> = na::Vector3::new(
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
            rng.random_range(-1.0..=1.0),
        );
        let n = v.norm();
        if n > 1e-3 && n <= 1.0 {
            return v / n;
        }
    }
}

impl CameraTrajectory {
    pub fn frame_count(&self) -> usize {
        let orbit = match self {
            CameraTrajectory::Orbit(orbit) => orbit,
            CameraTrajectory::ShakyOrbit { orbit, .. } => orbit,
        };
        orbit.z_levels * orbit.frames_per_level
    }

    /// Camera-to-world poses, one per frame.
    pub fn poses(&self) -> Result<Vec<RigidTransform>> {
        match self {
            CameraTrajectory::Orbit(orbit) => {
                let target = na::Vector3::from(orbit.look_at);
                orbit_eyes(orbit)
                    .iter()
                    .map(|eye| RigidTransform::compose(eye, &look_at_rotation(eye, &target)?))
                    .collect()
            }
            CameraTrajectory::ShakyOrbit { orbit, shake } => {
                let mut rng = ChaCha8Rng::seed_from_u64(shake.seed);
                let target = na::Vector3::from(orbit.look_at);
                let mut drift = na::Vector3::zeros();
                let mut angle = 0.0;
                let mut axis = random_unit(&mut rng);
                orbit_eyes(orbit)
                    .iter()
                    .map(|eye| {
                        drift = drift.map(|d| {
                            bounded_step(&mut rng, d, shake.drift_step, shake.max_drift)
                        });
                        angle = bounded_step(&mut rng, angle, shake.angle_step, shake.max_angle);
                        axis = (axis + random_unit(&mut rng) * 0.1).normalize();
                        let look = look_at_rotation(eye, &(target + drift))?;
                        let shake_rotation =
                            na::Rotation3::from_axis_angle(&na::Unit::new_normalize(axis), angle);
                        RigidTransform::compose(eye, &(shake_rotation.matrix() * look))
                    })
                    .collect()
            }
        }
    }
}

/// Turns scene-camera poses into renderer ground truth: each camera pose is
/// switched to the image-plane convention once, then chained with the object
/// placement into `object_to_camera`.
pub fn synthesize_ground_truth(
    camera_poses: &[RigidTransform],
    object_to_world: &RigidTransform,
) -> SceneGroundTruth {
    camera_poses
        .iter()
        .enumerate()
        .map(|(i, camera_to_world)| {
            let m2c = object_to_camera(&camera_to_world.with_adapted_axes(), object_to_world);
            FrameRecord::new(i as u32, m2c.rotation(), m2c.translation())
        })
        .collect()
}

/// Writes a synthetic scene under `scene_root` in the renderer's layout:
/// `camera.json`, `scene_gt.json` with the object at the world origin and,
/// if `frames` gives an image size, flat grey rgb frames.
pub fn write_synthetic_scene(
    scene_root: &Path,
    trajectory: &CameraTrajectory,
    intrinsics: &CameraIntrinsics,
    frames: Option<(u32, u32)>,
) -> Result<SceneGroundTruth> {
    let config = SceneConfig::new(scene_root, trajectory.frame_count());
    let camera_poses = trajectory.poses()?;
    let scene = synthesize_ground_truth(&camera_poses, &RigidTransform::identity());
    write_ground_truth(&config.ground_truth_path(), &scene, 1)?;

    let (width, height) = frames.unwrap_or((
        (intrinsics.cx * 2.0).round() as u32,
        (intrinsics.cy * 2.0).round() as u32,
    ));
    write_camera_json(&config.camera_path(), intrinsics, width, height)?;

    if frames.is_some() {
        let rgb_dir = config.rgb_dir();
        fs::create_dir_all(&rgb_dir).map_err(|e| PoseError::io(&rgb_dir, e))?;
        let frame = image::RgbImage::from_pixel(width, height, image::Rgb([64, 64, 64]));
        for record in scene.records() {
            let path = config.rgb_path(record.frame_index);
            frame.save(&path).map_err(|e| match e {
                image::ImageError::IoError(source) => PoseError::io(&path, source),
                source => PoseError::Image {
                    path: path.clone(),
                    source,
                },
            })?;
        }
    }
    Ok(scene)
}
