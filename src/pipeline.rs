//! The two entry points: `export` writes the pose files, `visualize` draws the
//! reprojected box onto every rendered frame.

use std::fs;
use std::path::{Path, PathBuf};

use indicatif::ParallelProgressIterator;
use nalgebra as na;
use rayon::prelude::*;

use crate::bbox::OrientedBoundingBox;
use crate::config::SceneConfig;
use crate::data_loader::{load_ground_truth, load_intrinsics, rendered_frame_paths};
use crate::error::{PoseError, Result};
use crate::io::{
    BOX_FILE, FRAMES_FILE, INTRINSICS_FILE, POSES_FILE, read_bbox_descriptor,
    write_bbox_descriptor, write_camera_poses, write_frame_index, write_intrinsics,
};
use crate::projection::project_visible;
use crate::transform::{RigidTransform, camera_to_world, exported_camera_pose, object_to_camera};
use crate::types::{CameraIntrinsics, FrameRecord};
use crate::visualization::{OverlayStyle, draw_box};

#[derive(Debug, Clone, PartialEq)]
pub struct ExportSummary {
    pub frame_count: usize,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VisualizeSummary {
    /// Frames written to the annotated output directory, ascending.
    pub annotated: Vec<u32>,
    /// Frames skipped because their pose failed validation, ascending.
    pub skipped: Vec<u32>,
}

/// Writes `intrinsics.txt`, `Frames.txt`, `ARposes.txt` and `Box.txt` into
/// the scene's output directory.
///
/// Any missing input, malformed record or invalid pose aborts the export;
/// a pose file with a gap is never written.
pub fn export(config: &SceneConfig) -> Result<ExportSummary> {
    config.validate()?;
    let intrinsics = load_intrinsics(&config.camera_path())?;
    let scene = load_ground_truth(&config.ground_truth_path())?;
    scene.ensure_frames(config.frame_count)?;

    let records: Vec<&FrameRecord> = scene.records().collect();
    let poses = records
        .par_iter()
        .progress_count(records.len() as u64)
        .map(|record| Ok((record.frame_index, exported_camera_pose(record)?)))
        .collect::<Result<Vec<(u32, RigidTransform)>>>()?;

    let output_dir = config.output_dir();
    write_intrinsics(&output_dir.join(INTRINSICS_FILE), &intrinsics)?;
    write_frame_index(&output_dir.join(FRAMES_FILE), config.frame_count, &intrinsics)?;
    write_camera_poses(
        &output_dir.join(POSES_FILE),
        &poses,
        config.frame_count,
        config.rotation_encoding,
    )?;
    write_bbox_descriptor(&output_dir.join(BOX_FILE), &config.bbox)?;
    log::info!(
        "exported {} frames to {}",
        config.frame_count,
        output_dir.display()
    );
    Ok(ExportSummary {
        frame_count: config.frame_count,
        output_dir,
    })
}

/// The box descriptor already exported for this scene, or the configured box
/// if there is none yet.
fn scene_bbox(config: &SceneConfig) -> Result<OrientedBoundingBox> {
    let box_path = config.output_dir().join(BOX_FILE);
    if box_path.is_file() {
        log::debug!("using box from {}", box_path.display());
        read_bbox_descriptor(&box_path)
    } else {
        Ok(config.bbox)
    }
}

enum FrameOutcome {
    Annotated(u32),
    Skipped(u32),
}

fn open_rgb(path: &Path) -> Result<image::RgbImage> {
    let img = image::open(path).map_err(|e| match e {
        image::ImageError::IoError(source) => PoseError::io(path, source),
        source => PoseError::Image {
            path: path.to_path_buf(),
            source,
        },
    })?;
    Ok(img.to_rgb8())
}

fn annotate_frame(
    config: &SceneConfig,
    record: &FrameRecord,
    intrinsics: &CameraIntrinsics,
    object_to_world: &RigidTransform,
    points: &[na::Vector3<f64>],
    style: &OverlayStyle,
) -> Result<FrameOutcome> {
    let frame_index = record.frame_index;
    let camera_to_world = match camera_to_world(record) {
        Ok(pose) => pose,
        Err(e) if e.is_frame_local() => {
            log::warn!("skipping frame {}: {}", frame_index, e);
            return Ok(FrameOutcome::Skipped(frame_index));
        }
        Err(e) => return Err(e),
    };
    let pose = object_to_camera(&camera_to_world, object_to_world);

    let mut img = open_rgb(&config.rgb_path(frame_index))?;
    let projected: Vec<Option<glam::Vec2>> = project_visible(intrinsics, &pose, points)
        .into_iter()
        .map(|p| p.map(|p| glam::Vec2::new(p.x as f32, p.y as f32)))
        .collect();
    let edges = draw_box(&mut img, &projected, style);
    log::trace!("frame {}: drew {} edges", frame_index, edges);

    let out_path = config.annotated_path(frame_index);
    img.save(&out_path).map_err(|e| match e {
        image::ImageError::IoError(source) => PoseError::io(&out_path, source),
        source => PoseError::Image {
            path: out_path.clone(),
            source,
        },
    })?;
    Ok(FrameOutcome::Annotated(frame_index))
}

/// Draws the reprojected box on every rendered frame and writes the results,
/// same size as the source, under `onepose_data/annotated_frames/`.
///
/// A frame whose pose fails validation is skipped and logged; points at or
/// behind the camera plane are left out of the overlay. Missing inputs and
/// write failures abort the run.
pub fn visualize(config: &SceneConfig) -> Result<VisualizeSummary> {
    config.validate()?;
    let intrinsics = load_intrinsics(&config.camera_path())?;
    let scene = load_ground_truth(&config.ground_truth_path())?;
    scene.ensure_frames(config.frame_count)?;
    let bbox = scene_bbox(config)?;
    let object_to_world = bbox.object_to_world()?;
    let points = bbox.corners(true);
    let style = config.overlay_style();

    let rendered = rendered_frame_paths(&config.rgb_dir())?;
    if rendered.len() != config.frame_count {
        log::warn!(
            "{} holds {} images for {} frames",
            config.rgb_dir().display(),
            rendered.len(),
            config.frame_count
        );
    }

    let annotated_dir = config.annotated_dir();
    fs::create_dir_all(&annotated_dir).map_err(|e| PoseError::io(&annotated_dir, e))?;

    let records: Vec<&FrameRecord> = scene.records().collect();
    let outcomes = records
        .par_iter()
        .progress_count(records.len() as u64)
        .map(|record| {
            annotate_frame(
                config,
                record,
                &intrinsics,
                &object_to_world,
                &points,
                &style,
            )
        })
        .collect::<Result<Vec<_>>>()?;

    let mut summary = VisualizeSummary::default();
    for outcome in outcomes {
        match outcome {
            FrameOutcome::Annotated(i) => summary.annotated.push(i),
            FrameOutcome::Skipped(i) => summary.skipped.push(i),
        }
    }
    log::info!(
        "annotated {} frames, skipped {}",
        summary.annotated.len(),
        summary.skipped.len()
    );
    Ok(summary)
}
