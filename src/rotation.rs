//! Conversions between rotation matrices and unit quaternions.

use nalgebra as na;

use crate::error::{PoseError, Result};

/// Tolerance for orthonormality, determinant and quaternion norm checks.
pub const ROTATION_TOLERANCE: f64 = 1e-5;

/// Returns true if `m` is orthonormal with determinant +1 within
/// [`ROTATION_TOLERANCE`].
pub fn is_rotation_matrix(m: &na::Matrix3<f64>) -> bool {
    if m.iter().any(|v| !v.is_finite()) {
        return false;
    }
    let should_be_identity = m.transpose() * m;
    let orthonormal = (should_be_identity - na::Matrix3::identity()).amax() < ROTATION_TOLERANCE;
    orthonormal && (m.determinant() - 1.0).abs() < ROTATION_TOLERANCE
}

/// Converts a rotation matrix to a unit quaternion.
///
/// Picks the branch with the largest of `trace, m00, m11, m22` so the divisor
/// never gets close to zero. The result is normalized and its scalar part is
/// kept non-negative, so a rotation always maps to the same four numbers.
pub fn rotation_matrix_to_quaternion(m: &na::Matrix3<f64>) -> na::UnitQuaternion<f64> {
    let trace = m.trace();
    let (w, x, y, z) = if trace > m[(0, 0)] && trace > m[(1, 1)] && trace > m[(2, 2)] {
        let s = (trace + 1.0).sqrt() * 2.0;
        (
            0.25 * s,
            (m[(2, 1)] - m[(1, 2)]) / s,
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(1, 0)] - m[(0, 1)]) / s,
        )
    } else if m[(0, 0)] > m[(1, 1)] && m[(0, 0)] > m[(2, 2)] {
        let s = (1.0 + m[(0, 0)] - m[(1, 1)] - m[(2, 2)]).sqrt() * 2.0;
        (
            (m[(2, 1)] - m[(1, 2)]) / s,
            0.25 * s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
        )
    } else if m[(1, 1)] > m[(2, 2)] {
        let s = (1.0 + m[(1, 1)] - m[(0, 0)] - m[(2, 2)]).sqrt() * 2.0;
        (
            (m[(0, 2)] - m[(2, 0)]) / s,
            (m[(0, 1)] + m[(1, 0)]) / s,
            0.25 * s,
            (m[(1, 2)] + m[(2, 1)]) / s,
        )
    } else {
        let s = (1.0 + m[(2, 2)] - m[(0, 0)] - m[(1, 1)]).sqrt() * 2.0;
        (
            (m[(1, 0)] - m[(0, 1)]) / s,
            (m[(0, 2)] + m[(2, 0)]) / s,
            (m[(1, 2)] + m[(2, 1)]) / s,
            0.25 * s,
        )
    };
    let q = if w < 0.0 {
        na::Quaternion::new(-w, -x, -y, -z)
    } else {
        na::Quaternion::new(w, x, y, z)
    };
    na::UnitQuaternion::new_normalize(q)
}

/// Expands a unit quaternion into its 3x3 rotation matrix.
pub fn quaternion_to_rotation_matrix(q: &na::UnitQuaternion<f64>) -> na::Matrix3<f64> {
    let (w, x, y, z) = (q.w, q.i, q.j, q.k);
    let (xx, yy, zz) = (x * x, y * y, z * z);
    let (xy, xz, yz) = (x * y, x * z, y * z);
    let (wx, wy, wz) = (w * x, w * y, w * z);
    na::Matrix3::new(
        1.0 - 2.0 * (yy + zz),
        2.0 * (xy - wz),
        2.0 * (xz + wy),
        2.0 * (xy + wz),
        1.0 - 2.0 * (xx + zz),
        2.0 * (yz - wx),
        2.0 * (xz - wy),
        2.0 * (yz + wx),
        1.0 - 2.0 * (xx + yy),
    )
}

/// Builds a unit quaternion from `[w, x, y, z]`, rejecting inputs whose norm
/// is not 1 within [`ROTATION_TOLERANCE`].
pub fn unit_quaternion_from_wxyz(wxyz: [f64; 4]) -> Result<na::UnitQuaternion<f64>> {
    let [w, x, y, z] = wxyz;
    let q = na::Quaternion::new(w, x, y, z);
    if !q.coords.iter().all(|v| v.is_finite()) {
        return Err(PoseError::Validation(format!(
            "quaternion {:?} has non-finite components",
            wxyz
        )));
    }
    let norm = q.norm();
    if (norm - 1.0).abs() > ROTATION_TOLERANCE {
        return Err(PoseError::Validation(format!(
            "quaternion {:?} is not unit length (norm {})",
            wxyz, norm
        )));
    }
    Ok(na::UnitQuaternion::new_normalize(q))
}

/// Returns `[w, x, y, z]`.
pub fn quaternion_wxyz(q: &na::UnitQuaternion<f64>) -> [f64; 4] {
    [q.w, q.i, q.j, q.k]
}

/// Builds a rotation matrix from nine row-major values.
pub fn matrix_from_row_major(values: &[f64; 9]) -> na::Matrix3<f64> {
    na::Matrix3::from_row_slice(values)
}

/// Flattens a matrix into nine row-major values.
pub fn matrix_to_row_major(m: &na::Matrix3<f64>) -> [f64; 9] {
    let mut out = [0.0; 9];
    for r in 0..3 {
        for c in 0..3 {
            out[r * 3 + c] = m[(r, c)];
        }
    }
    out
}
