//! Rigid transforms between the world, camera and object frames.
//!
//! Naming follows `a_to_b`: the transform maps coordinates expressed in frame
//! `a` into frame `b`. The one chain used across the crate is
//!
//! ```text
//! object_to_camera = camera_to_world⁻¹ ∘ object_to_world
//! ```
//!
//! Ground truth from the renderer is `object_to_camera` for an object placed
//! at the world origin, so `camera_to_world` is its inverse.

use nalgebra as na;

use crate::error::{PoseError, Result};
use crate::rotation::is_rotation_matrix;
use crate::types::FrameRecord;

/// 4x4 homogeneous rigid transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RigidTransform {
    matrix: na::Matrix4<f64>,
}

impl RigidTransform {
    pub fn identity() -> RigidTransform {
        RigidTransform {
            matrix: na::Matrix4::identity(),
        }
    }

    /// Assembles a transform, rejecting non-finite input and rotations that
    /// are not orthonormal with determinant +1.
    pub fn compose(
        translation: &na::Vector3<f64>,
        rotation: &na::Matrix3<f64>,
    ) -> Result<RigidTransform> {
        if translation.iter().any(|v| !v.is_finite()) {
            return Err(PoseError::Validation(format!(
                "translation {:?} has non-finite components",
                translation.as_slice()
            )));
        }
        if !is_rotation_matrix(rotation) {
            return Err(PoseError::Validation(format!(
                "rotation is not orthonormal with det +1 (det = {})",
                rotation.determinant()
            )));
        }
        Ok(Self::from_parts_unchecked(translation, rotation))
    }

    fn from_parts_unchecked(
        translation: &na::Vector3<f64>,
        rotation: &na::Matrix3<f64>,
    ) -> RigidTransform {
        let mut matrix = na::Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        RigidTransform { matrix }
    }

    /// Transform of a ground-truth record, `object_to_camera`.
    pub fn from_frame_record(record: &FrameRecord) -> Result<RigidTransform> {
        Self::compose(&record.translation, &record.rotation).map_err(|e| match e {
            PoseError::Validation(msg) => {
                PoseError::Validation(format!("frame {}: {}", record.frame_index, msg))
            }
            other => other,
        })
    }

    pub fn matrix(&self) -> &na::Matrix4<f64> {
        &self.matrix
    }

    pub fn rotation(&self) -> na::Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn translation(&self) -> na::Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Exact rigid inverse: `[Rᵀ | -Rᵀ t]`.
    pub fn invert(&self) -> RigidTransform {
        let r_t = self.rotation().transpose();
        let t = -(r_t * self.translation());
        Self::from_parts_unchecked(&t, &r_t)
    }

    /// `self ∘ other`: applies `other` first, then `self`.
    pub fn chain(&self, other: &RigidTransform) -> RigidTransform {
        RigidTransform {
            matrix: self.matrix * other.matrix,
        }
    }

    pub fn transform_point(&self, p: &na::Vector3<f64>) -> na::Vector3<f64> {
        self.rotation() * p + self.translation()
    }

    /// Returns this transform with [`adapt_axis_convention`] applied to its
    /// rotation block. The translation is untouched.
    pub fn with_adapted_axes(&self) -> RigidTransform {
        Self::from_parts_unchecked(
            &self.translation(),
            &adapt_axis_convention(&self.rotation()),
        )
    }

    pub fn approx_eq(&self, other: &RigidTransform, tolerance: f64) -> bool {
        (self.matrix - other.matrix).amax() <= tolerance
    }
}

/// `diag(1, -1, -1)`.
pub fn axis_flip() -> na::Matrix3<f64> {
    na::Matrix3::from_diagonal(&na::Vector3::new(1.0, -1.0, -1.0))
}

/// Switches a camera rotation between the image-plane convention (y-down,
/// z-forward) and the scene-camera convention (y-up, z-backward) by
/// right-multiplying with `diag(1, -1, -1)`.
///
/// The flip is its own inverse, so applying it twice in one chain silently
/// undoes the conversion. Call it exactly once per transform.
pub fn adapt_axis_convention(rotation: &na::Matrix3<f64>) -> na::Matrix3<f64> {
    rotation * axis_flip()
}

/// `object_to_camera = camera_to_world⁻¹ ∘ object_to_world`.
pub fn object_to_camera(
    camera_to_world: &RigidTransform,
    object_to_world: &RigidTransform,
) -> RigidTransform {
    camera_to_world.invert().chain(object_to_world)
}

/// Camera pose of a ground-truth frame, still in the image-plane convention.
pub fn camera_to_world(record: &FrameRecord) -> Result<RigidTransform> {
    Ok(RigidTransform::from_frame_record(record)?.invert())
}

/// Camera pose of a ground-truth frame in the consumer's convention, the pose
/// written into `ARposes.txt`.
pub fn exported_camera_pose(record: &FrameRecord) -> Result<RigidTransform> {
    let pose = camera_to_world(record)?.with_adapted_axes();
    log::debug!(
        "frame {} camera_to_world t={:?}",
        record.frame_index,
        pose.translation().as_slice()
    );
    Ok(pose)
}
