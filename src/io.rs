//! Text artifacts consumed by the pose-estimation trainer: `intrinsics.txt`,
//! `Frames.txt`, `ARposes.txt` and `Box.txt`.
//!
//! Every writer creates missing parent directories and overwrites an existing
//! file. Row-based files are comma separated with a single `#` header line.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use nalgebra as na;

use crate::bbox::OrientedBoundingBox;
use crate::error::{PoseError, Result};
use crate::rotation::{
    matrix_from_row_major, matrix_to_row_major, quaternion_to_rotation_matrix,
    quaternion_wxyz, rotation_matrix_to_quaternion, unit_quaternion_from_wxyz,
};
use crate::transform::RigidTransform;
use crate::types::{CameraIntrinsics, RotationEncoding};

pub const INTRINSICS_FILE: &str = "intrinsics.txt";
pub const FRAMES_FILE: &str = "Frames.txt";
pub const POSES_FILE: &str = "ARposes.txt";
pub const BOX_FILE: &str = "Box.txt";

pub const BOX_FIELDS: [&str; 10] = ["px", "py", "pz", "ex", "ey", "ez", "qw", "qx", "qy", "qz"];

/// Frame timestamps advance by 1/100 s per frame.
pub fn frame_timestamp(frame_index: u32) -> f64 {
    frame_index as f64 / 100.0
}

/// `{:?}` keeps the fractional part on whole numbers, `0.0` rather than `0`.
fn fmt_timestamp(frame_index: u32) -> String {
    format!("{:?}", frame_timestamp(frame_index))
}

fn join(values: impl IntoIterator<Item = f64>) -> String {
    values
        .into_iter()
        // Adding 0.0 turns -0.0 into 0.0.
        .map(|v| (v + 0.0).to_string())
        .collect::<Vec<_>>()
        .join(",")
}

fn write_text(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|e| PoseError::io(parent, e))?;
        }
    }
    fs::write(path, contents).map_err(|e| PoseError::io(path, e))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Four labeled lines, `fx: <v>` through `cy: <v>`.
pub fn write_intrinsics(path: &Path, intrinsics: &CameraIntrinsics) -> Result<()> {
    let mut s = String::new();
    s += format!("fx: {}\n", intrinsics.fx).as_str();
    s += format!("fy: {}\n", intrinsics.fy).as_str();
    s += format!("cx: {}\n", intrinsics.cx).as_str();
    s += format!("cy: {}\n", intrinsics.cy).as_str();
    write_text(path, &s)
}

/// One row per frame: `timestamp, frame_index, fx, fy, cx, cy`.
pub fn write_frame_index(
    path: &Path,
    frame_count: usize,
    intrinsics: &CameraIntrinsics,
) -> Result<()> {
    let frame_count = u32::try_from(frame_count).map_err(|_| {
        PoseError::Validation(format!("frame count {} does not fit in u32", frame_count))
    })?;
    let k = join([intrinsics.fx, intrinsics.fy, intrinsics.cx, intrinsics.cy]);
    let mut s = String::from("# timestamp, frame_index, fx, fy, cx, cy\n");
    for frame_index in 0..frame_count {
        let _ = writeln!(s, "{},{},{}", fmt_timestamp(frame_index), frame_index, k);
    }
    write_text(path, &s)
}

fn rotation_fields(pose: &RigidTransform, encoding: RotationEncoding) -> Vec<f64> {
    let rotation = pose.rotation();
    match encoding {
        RotationEncoding::Quaternion => {
            quaternion_wxyz(&rotation_matrix_to_quaternion(&rotation)).to_vec()
        }
        RotationEncoding::Matrix => matrix_to_row_major(&rotation).to_vec(),
    }
}

/// One row per frame, `timestamp, tx, ty, tz, <rotation fields>`, sorted by
/// frame index whatever order `poses` comes in.
///
/// `poses` must hold exactly the frames `0..frame_count`.
pub fn write_camera_poses(
    path: &Path,
    poses: &[(u32, RigidTransform)],
    frame_count: usize,
    encoding: RotationEncoding,
) -> Result<()> {
    let mut sorted: Vec<_> = poses.iter().collect();
    sorted.sort_by_key(|(frame_index, _)| *frame_index);
    if sorted.len() != frame_count {
        return Err(PoseError::parse(
            path.display().to_string(),
            format!("{} poses for {} declared frames", sorted.len(), frame_count),
        ));
    }
    for (expected, (frame_index, _)) in sorted.iter().enumerate() {
        if *frame_index as usize != expected {
            return Err(PoseError::parse(
                path.display().to_string(),
                format!("expected pose for frame {}, found frame {}", expected, frame_index),
            ));
        }
    }

    let mut s = format!(
        "# timestamp, tx, ty, tz, {}\n",
        encoding.field_names().join(", ")
    );
    for (frame_index, pose) in sorted {
        let t = pose.translation();
        let _ = writeln!(
            s,
            "{},{},{}",
            fmt_timestamp(*frame_index),
            join([t.x, t.y, t.z]),
            join(rotation_fields(pose, encoding))
        );
    }
    write_text(path, &s)
}

/// Header with the ten field names and one data row. Extents are full side
/// lengths.
pub fn write_bbox_descriptor(path: &Path, bbox: &OrientedBoundingBox) -> Result<()> {
    let s = format!("# {}\n{}\n", BOX_FIELDS.join(", "), join(bbox.descriptor()));
    write_text(path, &s)
}

fn data_rows(path: &Path) -> Result<Vec<(usize, Vec<f64>)>> {
    let contents = fs::read_to_string(path).map_err(|e| PoseError::io(path, e))?;
    contents
        .lines()
        .enumerate()
        .filter(|(_, l)| !l.trim().is_empty() && !l.trim_start().starts_with('#'))
        .map(|(line_no, l)| {
            let values = l
                .split(',')
                .map(|v| v.trim().parse::<f64>())
                .collect::<std::result::Result<Vec<_>, _>>()
                .map_err(|e| {
                    PoseError::parse(format!("{}:{}", path.display(), line_no + 1), e.to_string())
                })?;
            Ok((line_no + 1, values))
        })
        .collect()
}

/// Parses an `intrinsics.txt` file.
pub fn read_intrinsics(path: &Path) -> Result<CameraIntrinsics> {
    let contents = fs::read_to_string(path).map_err(|e| PoseError::io(path, e))?;
    let mut values = [None; 4];
    for line in contents.lines().filter(|l| !l.trim().is_empty()) {
        let (key, value) = line.split_once(':').ok_or_else(|| {
            PoseError::parse(path.display().to_string(), format!("bad line {:?}", line))
        })?;
        let slot = match key.trim() {
            "fx" => 0,
            "fy" => 1,
            "cx" => 2,
            "cy" => 3,
            other => {
                return Err(PoseError::parse(
                    path.display().to_string(),
                    format!("unknown key {:?}", other),
                ));
            }
        };
        let v: f64 = value.trim().parse().map_err(|_| {
            PoseError::parse(path.display().to_string(), format!("bad value {:?}", value))
        })?;
        values[slot] = Some(v);
    }
    match values {
        [Some(fx), Some(fy), Some(cx), Some(cy)] => Ok(CameraIntrinsics::new(fx, fy, cx, cy)),
        _ => Err(PoseError::parse(
            path.display().to_string(),
            "expected fx, fy, cx and cy",
        )),
    }
}

/// Parses a `Box.txt` file.
pub fn read_bbox_descriptor(path: &Path) -> Result<OrientedBoundingBox> {
    let rows = data_rows(path)?;
    let [(line_no, values)] = rows.as_slice() else {
        return Err(PoseError::parse(
            path.display().to_string(),
            format!("expected exactly one data row, found {}", rows.len()),
        ));
    };
    let values: [f64; 10] = values.as_slice().try_into().map_err(|_| {
        PoseError::parse(
            format!("{}:{}", path.display(), line_no),
            format!("expected 10 values, found {}", values.len()),
        )
    })?;
    let bbox = OrientedBoundingBox::from_descriptor(&values);
    bbox.validate()?;
    Ok(bbox)
}

/// Parses an `ARposes.txt` file into `(timestamp, camera_to_world)` rows.
/// The rotation encoding is inferred from the column count.
pub fn read_camera_poses(path: &Path) -> Result<Vec<(f64, RigidTransform)>> {
    data_rows(path)?
        .into_iter()
        .map(|(line_no, values)| {
            let rotation = match values.len() {
                8 => {
                    let q = unit_quaternion_from_wxyz([values[4], values[5], values[6], values[7]])?;
                    quaternion_to_rotation_matrix(&q)
                }
                13 => {
                    let mut r = [0.0; 9];
                    r.copy_from_slice(&values[4..13]);
                    matrix_from_row_major(&r)
                }
                n => {
                    return Err(PoseError::parse(
                        format!("{}:{}", path.display(), line_no),
                        format!("expected 8 or 13 values, found {}", n),
                    ));
                }
            };
            let t = na::Vector3::new(values[1], values[2], values[3]);
            Ok((values[0], RigidTransform::compose(&t, &rotation)?))
        })
        .collect()
}
