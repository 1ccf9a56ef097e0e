use std::collections::BTreeMap;

use nalgebra as na;
use serde::{Deserialize, Serialize};

use crate::error::{PoseError, Result};
use crate::rotation::{is_rotation_matrix, rotation_matrix_to_quaternion};

/// Ideal pinhole intrinsics, constant for a whole scene.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraIntrinsics {
    pub fx: f64,
    pub fy: f64,
    pub cx: f64,
    pub cy: f64,
}

impl CameraIntrinsics {
    pub fn new(fx: f64, fy: f64, cx: f64, cy: f64) -> CameraIntrinsics {
        CameraIntrinsics { fx, fy, cx, cy }
    }

    /// 3x4 projection matrix `[K | 0]`.
    pub fn projection_matrix(&self) -> na::Matrix3x4<f64> {
        na::Matrix3x4::new(
            self.fx, 0.0, self.cx, 0.0, //
            0.0, self.fy, self.cy, 0.0, //
            0.0, 0.0, 1.0, 0.0,
        )
    }

    pub fn validate(&self) -> Result<()> {
        let values = [self.fx, self.fy, self.cx, self.cy];
        if values.iter().any(|v| !v.is_finite()) {
            return Err(PoseError::Validation(format!(
                "intrinsics contain non-finite values: {:?}",
                self
            )));
        }
        if self.fx <= 0.0 || self.fy <= 0.0 {
            return Err(PoseError::Validation(format!(
                "focal lengths must be positive, got fx={} fy={}",
                self.fx, self.fy
            )));
        }
        Ok(())
    }
}

/// How a rotation is written into a pose file.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum RotationEncoding {
    /// Unit quaternion, `qw, qx, qy, qz`.
    #[default]
    Quaternion,
    /// Row-major 3x3 matrix, nine values.
    Matrix,
}

impl RotationEncoding {
    pub fn field_names(&self) -> &'static [&'static str] {
        match self {
            RotationEncoding::Quaternion => &["qw", "qx", "qy", "qz"],
            RotationEncoding::Matrix => &[
                "r11", "r12", "r13", "r21", "r22", "r23", "r31", "r32", "r33",
            ],
        }
    }
}

/// Ground-truth object-to-camera pose for one rendered frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameRecord {
    pub frame_index: u32,
    pub rotation: na::Matrix3<f64>,
    pub translation: na::Vector3<f64>,
}

impl FrameRecord {
    pub fn new(
        frame_index: u32,
        rotation: na::Matrix3<f64>,
        translation: na::Vector3<f64>,
    ) -> FrameRecord {
        FrameRecord {
            frame_index,
            rotation,
            translation,
        }
    }

    pub fn quaternion(&self) -> na::UnitQuaternion<f64> {
        rotation_matrix_to_quaternion(&self.rotation)
    }

    pub fn is_valid_rotation(&self) -> bool {
        is_rotation_matrix(&self.rotation)
    }
}

/// Per-frame ground truth of one scene, ordered by frame index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SceneGroundTruth {
    frames: BTreeMap<u32, FrameRecord>,
}

impl SceneGroundTruth {
    pub fn new() -> SceneGroundTruth {
        SceneGroundTruth::default()
    }

    /// Inserts a record, replacing any existing record for the same frame.
    pub fn insert(&mut self, record: FrameRecord) {
        self.frames.insert(record.frame_index, record);
    }

    pub fn get(&self, frame_index: u32) -> Option<&FrameRecord> {
        self.frames.get(&frame_index)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Records in ascending frame-index order.
    pub fn records(&self) -> impl Iterator<Item = &FrameRecord> {
        self.frames.values()
    }

    /// Checks that the scene holds exactly frames `0..frame_count`.
    pub fn ensure_frames(&self, frame_count: usize) -> Result<()> {
        let declared = u32::try_from(frame_count).map_err(|_| {
            PoseError::Validation(format!("frame count {} does not fit in u32", frame_count))
        })?;
        for frame_index in 0..declared {
            if !self.frames.contains_key(&frame_index) {
                return Err(PoseError::parse(
                    format!("frame {}", frame_index),
                    format!(
                        "ground truth has no record for frame {} (expected {} frames)",
                        frame_index, frame_count
                    ),
                ));
            }
        }
        if let Some(extra) = self.frames.keys().find(|k| **k as usize >= frame_count) {
            return Err(PoseError::parse(
                format!("frame {}", extra),
                format!(
                    "ground truth has {} records but {} frames were declared",
                    self.frames.len(),
                    frame_count
                ),
            ));
        }
        Ok(())
    }
}

impl FromIterator<FrameRecord> for SceneGroundTruth {
    fn from_iter<I: IntoIterator<Item = FrameRecord>>(iter: I) -> Self {
        let mut scene = SceneGroundTruth::new();
        for record in iter {
            scene.insert(record);
        }
        scene
    }
}
