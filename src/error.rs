use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading ground truth, composing poses, projecting or
/// writing artifacts.
#[derive(Debug, Error)]
pub enum PoseError {
    /// A required input file or directory is missing.
    #[error("required input not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Malformed or incomplete input, or a frame-count mismatch.
    #[error("parse error in {context}: {reason}")]
    Parse { context: String, reason: String },

    /// Non-orthonormal rotation, non-unit quaternion, non-finite value or
    /// non-positive box extent.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The camera-frame depth of a point is at or behind the image plane.
    #[error("degenerate projection: camera-frame depth {depth} is too close to zero")]
    DegenerateProjection { depth: f64 },

    /// Reading or writing a file failed.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("image error on {}: {source}", path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}

pub type Result<T> = std::result::Result<T, PoseError>;

impl PoseError {
    pub(crate) fn parse(context: impl Into<String>, reason: impl Into<String>) -> Self {
        PoseError::Parse {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            PoseError::NotFound { path }
        } else {
            PoseError::Io { path, source }
        }
    }

    /// Frame-local failures that a visualization run may skip over.
    pub fn is_frame_local(&self) -> bool {
        matches!(
            self,
            PoseError::Validation(_) | PoseError::DegenerateProjection { .. }
        )
    }
}
