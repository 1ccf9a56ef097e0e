use nalgebra as na;

use crate::error::{PoseError, Result};
use crate::transform::RigidTransform;
use crate::types::CameraIntrinsics;

/// Points closer to the camera plane than this are not projected.
pub const MIN_DEPTH: f64 = 1e-6;

/// Projects one point given in the pose's source frame.
pub fn project_one(
    projection: &na::Matrix3x4<f64>,
    pose: &RigidTransform,
    point: &na::Vector3<f64>,
) -> Result<na::Vector2<f64>> {
    let uvw = projection * pose.matrix() * point.push(1.0);
    let depth = uvw.z;
    if !depth.is_finite() || depth <= MIN_DEPTH {
        return Err(PoseError::DegenerateProjection { depth });
    }
    Ok(na::Vector2::new(uvw.x / depth, uvw.y / depth))
}

/// Pinhole projection `K · pose · p` with a perspective divide, one result
/// per input point in input order.
///
/// A point whose camera-frame depth is at or behind the camera plane yields
/// [`PoseError::DegenerateProjection`] without affecting the other points.
pub fn project(
    intrinsics: &CameraIntrinsics,
    pose: &RigidTransform,
    points: &[na::Vector3<f64>],
) -> Vec<Result<na::Vector2<f64>>> {
    let projection = intrinsics.projection_matrix();
    points
        .iter()
        .map(|p| project_one(&projection, pose, p))
        .collect()
}

/// Like [`project`] but drops degenerate points, keeping their slots as
/// `None` so corner indices stay meaningful.
pub fn project_visible(
    intrinsics: &CameraIntrinsics,
    pose: &RigidTransform,
    points: &[na::Vector3<f64>],
) -> Vec<Option<na::Vector2<f64>>> {
    project(intrinsics, pose, points)
        .into_iter()
        .enumerate()
        .map(|(i, p)| match p {
            Ok(p) => Some(p),
            Err(e) => {
                log::warn!("omitting point {}: {}", i, e);
                None
            }
        })
        .collect()
}
