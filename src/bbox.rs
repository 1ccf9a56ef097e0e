use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::{PoseError, Result};
use crate::rotation::{quaternion_to_rotation_matrix, unit_quaternion_from_wxyz};
use crate::transform::RigidTransform;

/// Index of the box center in the output of [`OrientedBoundingBox::corners`]
/// when the center is requested.
pub const CENTER_INDEX: usize = 8;

/// Sign of the half extent per corner, in enumeration order:
/// back-left-bottom, front-left-bottom, front-left-top, back-left-top,
/// back-right-bottom, front-right-bottom, front-right-top, back-right-top.
///
/// x runs back to front, y left to right, z bottom to top. Edge drawing and
/// the descriptor depend on this order.
pub const CORNER_SIGNS: [[f64; 3]; 8] = [
    [-1.0, -1.0, -1.0],
    [1.0, -1.0, -1.0],
    [1.0, -1.0, 1.0],
    [-1.0, -1.0, 1.0],
    [-1.0, 1.0, -1.0],
    [1.0, 1.0, -1.0],
    [1.0, 1.0, 1.0],
    [-1.0, 1.0, 1.0],
];

/// The twelve box edges as corner index pairs.
pub const BOX_EDGES: [(usize, usize); 12] = [
    (0, 1),
    (1, 2),
    (2, 3),
    (3, 0),
    (4, 5),
    (5, 6),
    (6, 7),
    (7, 4),
    (0, 4),
    (1, 5),
    (2, 6),
    (3, 7),
];

/// Static 3D box around the rendered object.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrientedBoundingBox {
    /// Box center, `px, py, pz`.
    pub center: [f64; 3],
    /// Full side lengths, `ex, ey, ez`.
    pub extents: [f64; 3],
    /// Orientation quaternion, `qw, qx, qy, qz`.
    pub orientation: [f64; 4],
}

impl Default for OrientedBoundingBox {
    fn default() -> Self {
        Self {
            center: [0.05, 0.05, 0.05],
            extents: [0.2, 0.82, 0.32],
            orientation: [1.0, 0.0, 0.0, 0.0],
        }
    }
}

impl OrientedBoundingBox {
    pub fn new(center: [f64; 3], extents: [f64; 3], orientation: [f64; 4]) -> Self {
        Self {
            center,
            extents,
            orientation,
        }
    }

    /// Checks for finite, strictly positive extents and a unit orientation.
    pub fn validate(&self) -> Result<()> {
        if self.center.iter().any(|v| !v.is_finite()) {
            return Err(PoseError::Validation(format!(
                "box center {:?} has non-finite components",
                self.center
            )));
        }
        if self.extents.iter().any(|e| !e.is_finite() || *e <= 0.0) {
            return Err(PoseError::Validation(format!(
                "box extents must be positive, got {:?}",
                self.extents
            )));
        }
        unit_quaternion_from_wxyz(self.orientation)?;
        Ok(())
    }

    pub fn center(&self) -> na::Vector3<f64> {
        na::Vector3::from(self.center)
    }

    pub fn half_extents(&self) -> na::Vector3<f64> {
        na::Vector3::from(self.extents) * 0.5
    }

    /// The eight corners in object-local coordinates, followed by the center
    /// at [`CENTER_INDEX`] when `with_center` is set.
    pub fn corners(&self, with_center: bool) -> Vec<na::Vector3<f64>> {
        let center = self.center();
        let half = self.half_extents();
        let mut points: Vec<_> = CORNER_SIGNS
            .iter()
            .map(|s| center + na::Vector3::from(*s).component_mul(&half))
            .collect();
        if with_center {
            points.push(center);
        }
        points
    }

    /// Places the box in the world by rotating it about its own center.
    pub fn object_to_world(&self) -> Result<RigidTransform> {
        let q = unit_quaternion_from_wxyz(self.orientation)?;
        let rotation = quaternion_to_rotation_matrix(&q);
        let center = self.center();
        RigidTransform::compose(&(center - rotation * center), &rotation)
    }

    /// The ten descriptor values `px, py, pz, ex, ey, ez, qw, qx, qy, qz`.
    pub fn descriptor(&self) -> [f64; 10] {
        let [px, py, pz] = self.center;
        let [ex, ey, ez] = self.extents;
        let [qw, qx, qy, qz] = self.orientation;
        [px, py, pz, ex, ey, ez, qw, qx, qy, qz]
    }

    pub fn from_descriptor(values: &[f64; 10]) -> Self {
        Self {
            center: [values[0], values[1], values[2]],
            extents: [values[3], values[4], values[5]],
            orientation: [values[6], values[7], values[8], values[9]],
        }
    }
}
