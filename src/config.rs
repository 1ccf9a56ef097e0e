use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::bbox::OrientedBoundingBox;
use crate::error::{PoseError, Result};
use crate::types::RotationEncoding;
use crate::visualization::OverlayStyle;

/// Settings of one conversion run. Built once, then passed by reference to
/// the entry points in [`crate::pipeline`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Directory holding `bop_data/` (input) and `onepose_data/` (output).
    pub scene_root: PathBuf,
    pub frame_count: usize,
    pub rotation_encoding: RotationEncoding,
    pub bbox: OrientedBoundingBox,
    pub line_thickness: u32,
    pub axis_length_px: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            scene_root: PathBuf::from("data/scene_1"),
            frame_count: 1,
            rotation_encoding: RotationEncoding::default(),
            bbox: OrientedBoundingBox::default(),
            line_thickness: 2,
            axis_length_px: 50.0,
        }
    }
}

impl SceneConfig {
    pub fn new(scene_root: impl Into<PathBuf>, frame_count: usize) -> Self {
        Self {
            scene_root: scene_root.into(),
            frame_count,
            ..Default::default()
        }
    }

    /// Reads a config from a JSON file. Missing keys take their defaults.
    pub fn from_json(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| PoseError::io(path, e))?;
        serde_json::from_str(&contents)
            .map_err(|e| PoseError::parse(path.display().to_string(), e.to_string()))
    }

    pub fn validate(&self) -> Result<()> {
        if self.frame_count == 0 {
            return Err(PoseError::Validation("frame count must be positive".to_string()));
        }
        if self.frame_count > u32::MAX as usize {
            return Err(PoseError::Validation(format!(
                "frame count {} is too large",
                self.frame_count
            )));
        }
        self.bbox.validate()
    }

    pub fn bop_dir(&self) -> PathBuf {
        self.scene_root.join("bop_data")
    }

    pub fn camera_path(&self) -> PathBuf {
        self.bop_dir().join("camera.json")
    }

    pub fn split_dir(&self) -> PathBuf {
        self.bop_dir().join("train_pbr").join("000000")
    }

    pub fn ground_truth_path(&self) -> PathBuf {
        self.split_dir().join("scene_gt.json")
    }

    pub fn rgb_dir(&self) -> PathBuf {
        self.split_dir().join("rgb")
    }

    pub fn rgb_path(&self, frame_index: u32) -> PathBuf {
        self.rgb_dir().join(frame_file_name(frame_index))
    }

    pub fn output_dir(&self) -> PathBuf {
        self.scene_root.join("onepose_data")
    }

    pub fn annotated_dir(&self) -> PathBuf {
        self.output_dir().join("annotated_frames")
    }

    pub fn annotated_path(&self, frame_index: u32) -> PathBuf {
        self.annotated_dir().join(frame_file_name(frame_index))
    }

    pub fn overlay_style(&self) -> OverlayStyle {
        OverlayStyle {
            thickness: self.line_thickness,
            axis_length: self.axis_length_px,
            ..Default::default()
        }
    }
}

/// Zero-padded frame file name, `000042.png`.
pub fn frame_file_name(frame_index: u32) -> String {
    format!("{:06}.png", frame_index)
}
