//! Patch-based segmentation of large tomograms
//!
//! Tomograms are far larger than the fixed input of a volumetric segmentation
//! network, so the volume is tiled into overlapping cubic patches. Each patch
//! is classified independently, only the central part of each prediction is
//! kept (network outputs degrade near patch borders), and overlapping
//! contributions are averaged into one score map covering the whole volume.
//!
//! # Pipeline
//! 1. Normalize the volume to zero mean and unit variance
//! 2. Zero-pad every axis by `crop_margin`
//! 3. Place patch centers on a regular grid, forcing a last center at the far border
//! 4. Classify each patch and accumulate its cropped center into the score map
//! 5. Divide the score map by the per-voxel patch count
//! 6. Remove the padding
//!
//! # Example
//! ```no_run
//! use ndarray::{Array3, Array4, ArrayView3};
//! use tomo_detect_segmentation::{Classifier, SegmentationError, TiledSegmenter, TilingConfig};
//!
//! struct Uniform;
//!
//! impl Classifier for Uniform {
//!     fn predict(&mut self, patch: ArrayView3<f32>) -> Result<Array4<f32>, SegmentationError> {
//!         let (d0, d1, d2) = patch.dim();
//!         Ok(Array4::from_elem((d0, d1, d2, 2), 0.5))
//!     }
//! }
//!
//! # fn main() -> Result<(), SegmentationError> {
//! let segmenter = TiledSegmenter::new(TilingConfig::new(64, 8))?;
//! let volume = Array3::<f32>::from_shape_fn((100, 120, 90), |(z, y, x)| (z + y + x) as f32);
//! let scoremap = segmenter.infer(&mut Uniform, volume.view(), 2)?;
//! assert_eq!(scoremap.dim(), (100, 120, 90, 2));
//! # Ok(())
//! # }
//! ```

pub mod classifier;
pub mod config;
pub mod grid;
pub mod labelmap;
#[cfg(feature = "onnx")]
pub mod onnx;
pub mod preprocess;
pub mod tiled;

use thiserror::Error;
use tomo_detect_common::ProcessingError;

pub use classifier::Classifier;
pub use config::TilingConfig;
pub use grid::PatchGrid;
pub use labelmap::to_labelmap;
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use preprocess::{normalize, pad, unpad_scores};
pub use tiled::TiledSegmenter;

/// Errors that can occur during segmentation
#[derive(Error, Debug)]
pub enum SegmentationError {
    #[error("Degenerate input volume: {0}")]
    DegenerateInput(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Volume too small: padded axis {axis} has {len} voxels, patch needs {patch_size}")]
    VolumeTooSmall {
        axis: usize,
        len: usize,
        patch_size: usize,
    },

    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("Classifier error: {0}")]
    Classifier(String),

    #[cfg(feature = "onnx")]
    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),
}

impl From<SegmentationError> for ProcessingError {
    fn from(err: SegmentationError) -> Self {
        match err {
            SegmentationError::DegenerateInput(msg) => ProcessingError::DegenerateInput(msg),
            SegmentationError::InvalidConfig(msg) => ProcessingError::Configuration(msg),
            SegmentationError::ShapeMismatch(msg) => ProcessingError::ShapeMismatch(msg),
            SegmentationError::Classifier(msg) => ProcessingError::Classifier(msg),
            other => ProcessingError::Other(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion() {
        let err: ProcessingError = SegmentationError::DegenerateInput("std is 0".into()).into();
        assert!(matches!(err, ProcessingError::DegenerateInput(_)));

        let err: ProcessingError = SegmentationError::InvalidConfig("bad".into()).into();
        assert!(matches!(err, ProcessingError::Configuration(_)));

        let err: ProcessingError = SegmentationError::VolumeTooSmall {
            axis: 1,
            len: 40,
            patch_size: 64,
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Other error: Volume too small: padded axis 1 has 40 voxels, patch needs 64"
        );
    }
}
