use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use glob::glob;
use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::{PoseError, Result};
use crate::rotation::matrix_to_row_major;
use crate::types::{CameraIntrinsics, FrameRecord, SceneGroundTruth};

/// One object entry of a ground-truth frame as the renderer writes it.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawObjectPose {
    #[serde(rename = "cam_R_m2c")]
    rotation: Option<Vec<f64>>,
    #[serde(rename = "cam_t_m2c")]
    translation: Option<Vec<f64>>,
    #[serde(default)]
    obj_id: Option<i64>,
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let contents = fs::read_to_string(path).map_err(|e| PoseError::io(path, e))?;
    serde_json::from_str(&contents)
        .map_err(|e| PoseError::parse(path.display().to_string(), e.to_string()))
}

fn write_json<T: Serialize>(path: &Path, object: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PoseError::io(parent, e))?;
    }
    let j = serde_json::to_string_pretty(object)
        .map_err(|e| PoseError::parse(path.display().to_string(), e.to_string()))?;
    fs::write(path, j).map_err(|e| PoseError::io(path, e))
}

fn parse_frame(key: &str, objects: &[RawObjectPose]) -> Result<FrameRecord> {
    let context = format!("ground truth frame {:?}", key);
    let frame_index: u32 = key
        .trim()
        .parse()
        .map_err(|_| PoseError::parse(&context, "frame key is not a non-negative integer"))?;
    // Only the first listed object is kept.
    let first = objects
        .first()
        .ok_or_else(|| PoseError::parse(&context, "frame lists no objects"))?;
    if objects.len() > 1 {
        log::trace!(
            "frame {}: ignoring {} additional objects",
            frame_index,
            objects.len() - 1
        );
    }
    let rotation = match first.rotation.as_deref() {
        Some(r) if r.len() == 9 => na::Matrix3::from_row_slice(r),
        Some(r) => {
            return Err(PoseError::parse(
                &context,
                format!("cam_R_m2c has {} values, expected 9", r.len()),
            ));
        }
        None => return Err(PoseError::parse(&context, "missing cam_R_m2c")),
    };
    let translation = match first.translation.as_deref() {
        Some(t) if t.len() == 3 => na::Vector3::new(t[0], t[1], t[2]),
        Some(t) => {
            return Err(PoseError::parse(
                &context,
                format!("cam_t_m2c has {} values, expected 3", t.len()),
            ));
        }
        None => return Err(PoseError::parse(&context, "missing cam_t_m2c")),
    };
    Ok(FrameRecord::new(frame_index, rotation, translation))
}

/// Loads a `scene_gt.json` file into typed per-frame records.
///
/// Each frame may list several objects; only the first one is kept.
pub fn load_ground_truth(path: &Path) -> Result<SceneGroundTruth> {
    let raw: HashMap<String, Vec<RawObjectPose>> = read_json(path)?;
    let mut scene = SceneGroundTruth::new();
    for (key, objects) in &raw {
        let record = parse_frame(key, objects)?;
        if scene.get(record.frame_index).is_some() {
            return Err(PoseError::parse(
                path.display().to_string(),
                format!("frame {} appears more than once", record.frame_index),
            ));
        }
        scene.insert(record);
    }
    log::debug!("loaded {} frames from {}", scene.len(), path.display());
    Ok(scene)
}

/// Loads `fx, fy, cx, cy` from a camera json. Other keys are ignored.
pub fn load_intrinsics(path: &Path) -> Result<CameraIntrinsics> {
    let intrinsics: CameraIntrinsics = read_json(path)?;
    intrinsics.validate()?;
    Ok(intrinsics)
}

/// Writes ground truth in the renderer's `scene_gt.json` layout, one object
/// per frame, keys in ascending frame order.
pub fn write_ground_truth(path: &Path, scene: &SceneGroundTruth, obj_id: i64) -> Result<()> {
    let raw: BTreeMap<u32, Vec<RawObjectPose>> = scene
        .records()
        .map(|r| {
            (
                r.frame_index,
                vec![RawObjectPose {
                    rotation: Some(matrix_to_row_major(&r.rotation).to_vec()),
                    translation: Some(r.translation.as_slice().to_vec()),
                    obj_id: Some(obj_id),
                }],
            )
        })
        .collect();
    write_json(path, &raw)
}

/// Writes a camera json with intrinsics and image size.
pub fn write_camera_json(
    path: &Path,
    intrinsics: &CameraIntrinsics,
    width: u32,
    height: u32,
) -> Result<()> {
    let camera = serde_json::json!({
        "fx": intrinsics.fx,
        "fy": intrinsics.fy,
        "cx": intrinsics.cx,
        "cy": intrinsics.cy,
        "width": width,
        "height": height,
    });
    write_json(path, &camera)
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Sorted paths of the rendered frames in `rgb_dir`.
pub fn rendered_frame_paths(rgb_dir: &Path) -> Result<Vec<PathBuf>> {
    if !rgb_dir.is_dir() {
        return Err(PoseError::NotFound {
            path: rgb_dir.to_path_buf(),
        });
    }
    let pattern = rgb_dir.join("*");
    let paths = glob(&pattern.to_string_lossy())
        .map_err(|e| PoseError::parse(pattern.display().to_string(), e.to_string()))?;
    let mut sorted_path: Vec<PathBuf> = paths.into_iter().filter_map(img_filter).collect();
    sorted_path.sort();
    Ok(sorted_path)
}
